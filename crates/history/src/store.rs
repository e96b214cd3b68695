use crate::error::HistoryError;
use crate::parse::{parse_history, LoadReport};
use crate::synthetic;
use chrono::{NaiveDate, Utc};
use configuration::{BootstrapConfig, StorageConfig};
use core_types::{EquityPoint, EquitySeries};
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// One CSV row as written to disk.
#[derive(Serialize)]
struct HistoryRow {
    date: NaiveDate,
    balance: f64,
}

/// File-backed store for the daily equity history.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    bootstrap: BootstrapConfig,
}

impl HistoryStore {
    pub fn new(storage: &StorageConfig, bootstrap: BootstrapConfig) -> Self {
        Self::with_path(storage.history_path(), bootstrap)
    }

    pub fn with_path(path: impl Into<PathBuf>, bootstrap: BootstrapConfig) -> Self {
        Self {
            path: path.into(),
            bootstrap,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the persisted series, bootstrapping one first if there is none.
    ///
    /// Individual bad rows are dropped and listed in the report. Only a file
    /// that cannot be read at all fails with [`HistoryError::DataCorrupt`].
    pub fn load(&self) -> Result<LoadReport, HistoryError> {
        if !self.exists() {
            tracing::info!(path = %self.path.display(), "No equity history found, bootstrapping.");
            self.bootstrap()?;
        }

        let text = fs::read_to_string(&self.path).map_err(|source| HistoryError::DataCorrupt {
            path: self.path.clone(),
            source,
        })?;

        let report = parse_history(&text);
        if !report.rejected.is_empty() {
            tracing::warn!(
                path = %self.path.display(),
                rejected = report.rejected.len(),
                "Dropped malformed rows while loading equity history."
            );
        }
        tracing::debug!(points = report.series.len(), "Equity history loaded.");

        Ok(report)
    }

    /// Generates a synthetic series ending today and persists it.
    pub fn bootstrap(&self) -> Result<EquitySeries, HistoryError> {
        self.bootstrap_until(Utc::now().date_naive())
    }

    /// Generates a synthetic series ending on `end` and persists it.
    pub fn bootstrap_until(&self, end: NaiveDate) -> Result<EquitySeries, HistoryError> {
        let series = synthetic::generate(&self.bootstrap, end)?;
        self.save(&series)?;
        tracing::info!(
            path = %self.path.display(),
            points = series.len(),
            seeded = self.bootstrap.seed.is_some(),
            "Synthetic equity history written."
        );
        Ok(series)
    }

    /// Fallback for when [`load`](Self::load) reported the store unreadable.
    ///
    /// Always yields a series: a fresh synthetic one, persisted if possible.
    pub fn recover(&self) -> EquitySeries {
        let end = Utc::now().date_naive();
        let series = match synthetic::generate(&self.bootstrap, end) {
            Ok(series) => series,
            Err(e) => {
                tracing::error!(error = %e, "Synthetic history generation failed.");
                return EquitySeries::new();
            }
        };
        if let Err(e) = self.save(&series) {
            tracing::error!(error = %e, "Could not persist the recovered equity history, using it in memory only.");
        }
        series
    }

    /// Writes the whole series as `date,balance` CSV.
    ///
    /// The rows go to a sibling temp file first which then replaces the
    /// target, so a reader never sees a partially written history.
    pub fn save(&self, series: &EquitySeries) -> Result<(), HistoryError> {
        let write_error = |source| HistoryError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let tmp_path = self.path.with_extension("csv.tmp");
        let written = Self::write_rows(&tmp_path, series)
            .and_then(|()| fs::rename(&tmp_path, &self.path).map_err(write_error));
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written
    }

    fn write_rows(tmp_path: &Path, series: &EquitySeries) -> Result<(), HistoryError> {
        let write_error = |source| HistoryError::Write {
            path: tmp_path.to_path_buf(),
            source,
        };

        let file = File::create(tmp_path).map_err(write_error)?;
        let mut writer = csv::Writer::from_writer(file);
        for point in series.iter() {
            writer.serialize(HistoryRow {
                date: point.date,
                balance: point.balance,
            })?;
        }
        writer.flush().map_err(write_error)?;
        Ok(())
    }

    /// Upserts one day into the persisted history and returns the updated series.
    pub fn record(&self, point: EquityPoint) -> Result<EquitySeries, HistoryError> {
        let mut series = self.load()?.series;
        let previous = series.insert(point.date, point.balance)?;
        self.save(&series)?;
        tracing::info!(
            date = %point.date,
            balance = point.balance,
            replaced = previous.is_some(),
            "Recorded daily balance."
        );
        Ok(series)
    }
}
