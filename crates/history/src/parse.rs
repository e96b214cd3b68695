use chrono::{DateTime, NaiveDate, NaiveDateTime};
use core_types::EquitySeries;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\t]").expect("separator pattern is valid"));

/// The outcome of reading a history file: every accepted row folded into the
/// series, plus a diagnostic for every row that was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub series: EquitySeries,
    pub rejected: Vec<MalformedRow>,
}

/// A history row that could not be used.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {reason} ({content:?})")]
pub struct MalformedRow {
    /// 1-based line number in the file.
    pub line: usize,
    pub content: String,
    pub reason: RowRejection,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowRejection {
    #[error("repeated header row")]
    Header,

    #[error("expected at least {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("unparsable date '{0}'")]
    InvalidDate(String),

    #[error("non-numeric balance '{0}'")]
    InvalidBalance(String),

    #[error("balance must be finite and non-negative, got {0}")]
    NegativeBalance(f64),
}

/// Column positions of the date and balance fields.
#[derive(Debug, Clone, Copy)]
struct Layout {
    date: usize,
    balance: usize,
}

impl Layout {
    const DEFAULT: Layout = Layout { date: 0, balance: 1 };

    /// Reads the layout off a header row, if `fields` is one.
    fn from_header(fields: &[&str]) -> Option<Layout> {
        let position = |name: &str| fields.iter().position(|f| f.eq_ignore_ascii_case(name));
        match (position("date"), position("balance")) {
            (Some(date), Some(balance)) => Some(Layout { date, balance }),
            _ => None,
        }
    }

    fn width(&self) -> usize {
        self.date.max(self.balance) + 1
    }
}

/// Parses the text of a history file.
///
/// Each row is split on commas or tabs, so files from either producer load.
/// A leading `date,balance` header fixes the column positions; without one the
/// first two columns are used. Blank lines are skipped. Later rows for a date
/// replace earlier ones.
pub fn parse_history(text: &str) -> LoadReport {
    let mut report = LoadReport::default();
    let mut layout: Option<Layout> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() {
            continue;
        }

        let fields: Vec<&str> = SEPARATOR.split(content).map(str::trim).collect();

        let header = Layout::from_header(&fields);
        let active = match (layout, header) {
            (None, Some(found)) => {
                layout = Some(found);
                continue;
            }
            (Some(_), Some(_)) => {
                report.rejected.push(reject(line, raw, RowRejection::Header));
                continue;
            }
            (Some(active), None) => active,
            (None, None) => {
                layout = Some(Layout::DEFAULT);
                Layout::DEFAULT
            }
        };

        if fields.len() < active.width() {
            let reason = RowRejection::FieldCount {
                expected: active.width(),
                found: fields.len(),
            };
            report.rejected.push(reject(line, raw, reason));
            continue;
        }

        let date_field = fields[active.date];
        let Some(date) = parse_date(date_field) else {
            let reason = RowRejection::InvalidDate(date_field.to_string());
            report.rejected.push(reject(line, raw, reason));
            continue;
        };

        let balance_field = fields[active.balance];
        let balance = match balance_field.parse::<f64>() {
            Ok(balance) if balance.is_finite() && balance >= 0.0 => balance,
            Ok(balance) => {
                report
                    .rejected
                    .push(reject(line, raw, RowRejection::NegativeBalance(balance)));
                continue;
            }
            Err(_) => {
                let reason = RowRejection::InvalidBalance(balance_field.to_string());
                report.rejected.push(reject(line, raw, reason));
                continue;
            }
        };

        if report.series.insert(date, balance).is_err() {
            report
                .rejected
                .push(reject(line, raw, RowRejection::NegativeBalance(balance)));
        }
    }

    report
}

fn reject(line: usize, raw: &str, reason: RowRejection) -> MalformedRow {
    tracing::debug!(line, %reason, "Dropping malformed history row.");
    MalformedRow {
        line,
        content: raw.to_string(),
        reason,
    }
}

/// Accepts plain dates and the timestamp forms older files were written with,
/// keeping only the calendar day.
fn parse_date(field: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(field, format) {
            return Some(timestamp.date());
        }
    }
    DateTime::parse_from_rfc3339(field)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_comma_and_tab_rows_in_one_file() {
        let text = "date,balance\n2024-01-02,10100.5\n2024-01-01\t10000\n";
        let report = parse_history(text);

        assert!(report.rejected.is_empty());
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.series.get(&day(2024, 1, 1)), Some(10000.0));
        assert_eq!(report.series.last().unwrap().date, day(2024, 1, 2));
    }

    #[test]
    fn reports_each_bad_row_and_keeps_the_rest() {
        let text = "\
date\tbalance
2024-01-01\t10000
date\tbalance
not-a-date\t10050
2024-01-03\tabc
2024-01-04
2024-01-05\t-3
2024-01-06\t10200
";
        let report = parse_history(text);

        assert_eq!(report.series.balances(), vec![10000.0, 10200.0]);
        let reasons: Vec<(usize, RowRejection)> = report
            .rejected
            .iter()
            .map(|row| (row.line, row.reason.clone()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (3, RowRejection::Header),
                (4, RowRejection::InvalidDate("not-a-date".to_string())),
                (5, RowRejection::InvalidBalance("abc".to_string())),
                (6, RowRejection::FieldCount { expected: 2, found: 1 }),
                (7, RowRejection::NegativeBalance(-3.0)),
            ]
        );
    }

    #[test]
    fn duplicate_dates_keep_the_last_row() {
        let text = "2024-03-01,100\n2024-03-01,150\n2024-02-28,90\n";
        let report = parse_history(text);

        assert_eq!(report.series.len(), 2);
        assert_eq!(report.series.get(&day(2024, 3, 1)), Some(150.0));
    }

    #[test]
    fn timestamps_are_truncated_to_the_day() {
        let text = "date,balance\n2023-10-18 07:15:42.123456,10000.0\n2023-10-19T00:00:00Z,10010.0\n";
        let report = parse_history(text);

        assert!(report.rejected.is_empty());
        assert_eq!(
            report.series.to_points().iter().map(|p| p.date).collect::<Vec<_>>(),
            vec![day(2023, 10, 18), day(2023, 10, 19)]
        );
    }

    #[test]
    fn header_columns_may_be_reordered() {
        let text = "balance,date\n500,2024-05-01\n";
        let report = parse_history(text);

        assert_eq!(report.series.get(&day(2024, 5, 1)), Some(500.0));
    }
}
