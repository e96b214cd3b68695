use analytics::AnalyticsEngine;
use anyhow::{bail, Context};
use api_client::{AccountValuator, BinanceSpotClient};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use configuration::settings::Settings;
use configuration::{init_tracing, load_config};
use core_types::{Credentials, EquityPoint, Investor, MergeMode, Period};
use history::HistoryStore;
use indicatif::{ProgressBar, ProgressStyle};
use investors::{DirectoryValuation, InvestorDirectory};
use std::path::PathBuf;
use std::time::Duration;

mod dashboard;

/// The main entry point for the AUM dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; it only supplements the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_tracing(&settings.logging).context("Failed to initialise logging")?;

    match cli.command {
        Commands::Report(args) => handle_report(args, &settings).await,
        Commands::Investors(command) => handle_investors(command, &settings),
        Commands::History(command) => handle_history(command, &settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Assets-under-management dashboard for a fund of exchange and manual accounts.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to ./aumdesk.toml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value every account and print the dashboard.
    Report(ReportArgs),
    /// Manage the investor directory.
    #[command(subcommand)]
    Investors(InvestorCommand),
    /// Maintain the stored equity history.
    #[command(subcommand)]
    History(HistoryCommand),
}

/// Controller credentials shared by every privileged command.
#[derive(Args)]
struct ControllerArgs {
    /// Controller password.
    #[arg(long, env = "AUMDESK_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl ControllerArgs {
    fn is_valid(&self, settings: &Settings) -> bool {
        self.password.as_deref() == Some(settings.dashboard.admin_password.as_str())
    }

    fn require(&self, settings: &Settings) -> anyhow::Result<()> {
        if !self.is_valid(settings) {
            tracing::warn!("Rejected controller password.");
            bail!("This command requires a valid controller password (--password or AUMDESK_PASSWORD).");
        }
        Ok(())
    }
}

#[derive(Args)]
struct ReportArgs {
    /// Window for the return metric: 30d, 90d, 180d or overall.
    #[arg(long)]
    period: Option<Period>,

    /// How today's live value joins the history: proportional or overlay.
    #[arg(long)]
    mode: Option<MergeMode>,

    /// Show the controller view (real/virtual split, account types, errors).
    #[arg(long)]
    controller: bool,

    #[command(flatten)]
    auth: ControllerArgs,

    /// Number of most recent equity curve rows to print.
    #[arg(long)]
    curve_rows: Option<usize>,

    /// Print the dashboard as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum InvestorCommand {
    /// List every investor in the directory.
    List,
    /// Add an investor with either a manual balance or exchange API keys.
    Add(AddInvestorArgs),
    /// Remove an investor by name.
    Remove {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        auth: ControllerArgs,
    },
}

#[derive(Args)]
struct AddInvestorArgs {
    #[arg(long)]
    name: String,

    /// Manually entered USD balance for a virtual account.
    #[arg(long, conflicts_with_all = ["api_key", "api_secret"], required_unless_present = "api_key")]
    virtual_balance: Option<f64>,

    /// Read-only exchange API key for a real account.
    #[arg(long, requires = "api_secret")]
    api_key: Option<String>,

    #[arg(long, requires = "api_key")]
    api_secret: Option<String>,

    #[command(flatten)]
    auth: ControllerArgs,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Write a synthetic equity history.
    Bootstrap {
        /// Seed for a reproducible series.
        #[arg(long)]
        seed: Option<u64>,
        /// Overwrite an existing history.
        #[arg(long)]
        force: bool,
    },
    /// Value the directory and record today's AUM in the history.
    Record,
    /// Load the history and list any rows that were rejected.
    Check,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_report(args: ReportArgs, settings: &Settings) -> anyhow::Result<()> {
    if args.controller {
        args.auth.require(settings)?;
    }
    let controller = args.controller;
    let period = args.period.unwrap_or(settings.analytics.default_period);
    let mode = args.mode.unwrap_or(settings.analytics.merge_mode);
    let curve_rows = args.curve_rows.unwrap_or(settings.dashboard.curve_rows);

    let store = HistoryStore::new(&settings.storage, settings.bootstrap.clone());
    let history = dashboard::load_history(&store);

    let mut directory = match InvestorDirectory::open(settings.storage.investors_path()) {
        Ok(directory) => Some(directory),
        Err(e) => {
            tracing::error!(error = %e, "Investor directory unavailable, reporting without accounts.");
            None
        }
    };

    let client: Box<dyn AccountValuator> = match BinanceSpotClient::new(&settings.exchange) {
        Ok(client) => Box::new(client),
        Err(e) => {
            tracing::error!(error = %e, "Exchange client unavailable, real accounts will show as errored.");
            Box::new(dashboard::UnavailableExchange::new(e.to_string()))
        }
    };
    let engine = AnalyticsEngine::new(settings.analytics.risk_free_annual);
    let timeout = Duration::from_secs(settings.exchange.timeout_secs);
    let today = Utc::now().date_naive();

    let spinner = spinner("Valuing investor accounts...")?;
    let report = match directory.as_mut() {
        Some(directory) => {
            dashboard::build_dashboard(&history, directory, client.as_ref(), &engine, timeout, mode, period, today).await?
        }
        None => {
            let valuation = DirectoryValuation {
                accounts: Vec::new(),
                total_real: 0.0,
                total_virtual: 0.0,
            };
            let performance = engine.run(&history, &valuation.live_aggregate(today), mode, period)?;
            dashboard::Dashboard {
                total_real: 0.0,
                total_virtual: 0.0,
                total_aum: 0.0,
                performance,
                valuation,
            }
        }
    };
    spinner.finish_and_clear();

    if let Some(directory) = &directory {
        if let Err(e) = directory.save() {
            tracing::error!(error = %e, "Could not persist refreshed account balances.");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", dashboard::render(&report, controller, settings, curve_rows));
    }
    Ok(())
}

fn handle_investors(command: InvestorCommand, settings: &Settings) -> anyhow::Result<()> {
    let mut directory = InvestorDirectory::open(settings.storage.investors_path())?;

    match command {
        InvestorCommand::List => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Investor", "Type", "Balance (USD)", "Last Update"]);
            for investor in directory.investors() {
                let (balance, updated) = match &investor.account {
                    core_types::Account::Virtual(account) => (account.balance, "-".to_string()),
                    core_types::Account::Real(account) => (
                        account.last_known_balance,
                        account
                            .last_update
                            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                            .unwrap_or_else(|| "never".to_string()),
                    ),
                };
                table.add_row(vec![
                    investor.name.clone(),
                    investor.kind().to_string(),
                    dashboard::usd(balance),
                    updated,
                ]);
            }
            println!("{table}");
        }
        InvestorCommand::Add(args) => {
            args.auth.require(settings)?;
            let investor = match (args.virtual_balance, args.api_key, args.api_secret) {
                (Some(balance), _, _) => Investor::new_virtual(args.name, balance),
                (None, Some(key), Some(secret)) => Investor::new_real(args.name, Credentials::new(key, secret)),
                _ => bail!("Provide either --virtual-balance or both --api-key and --api-secret."),
            };
            let name = investor.name.trim().to_string();
            directory.add(investor)?;
            directory.save()?;
            println!("Added investor '{name}'.");
        }
        InvestorCommand::Remove { name, auth } => {
            auth.require(settings)?;
            let removed = directory.remove(&name)?;
            directory.save()?;
            println!("Removed investor '{}'.", removed.name);
        }
    }
    Ok(())
}

async fn handle_history(command: HistoryCommand, settings: &Settings) -> anyhow::Result<()> {
    match command {
        HistoryCommand::Bootstrap { seed, force } => {
            let mut bootstrap = settings.bootstrap.clone();
            if seed.is_some() {
                bootstrap.seed = seed;
            }
            let store = HistoryStore::new(&settings.storage, bootstrap);
            if store.exists() && !force {
                bail!(
                    "An equity history already exists at {}. Pass --force to overwrite it.",
                    store.path().display()
                );
            }
            let series = store.bootstrap()?;
            println!("Wrote {} synthetic points to {}.", series.len(), store.path().display());
        }
        HistoryCommand::Record => {
            let mut directory = InvestorDirectory::open(settings.storage.investors_path())?;
            let client = BinanceSpotClient::new(&settings.exchange)?;
            let timeout = Duration::from_secs(settings.exchange.timeout_secs);

            let spinner = spinner("Valuing investor accounts...")?;
            let valuation = directory.value_all(&client, timeout, Utc::now()).await;
            spinner.finish_and_clear();
            directory.save()?;

            let aum = valuation.total_aum();
            if aum <= 0.0 {
                bail!("Total AUM is {}, nothing recorded.", dashboard::usd(aum));
            }
            let store = HistoryStore::new(&settings.storage, settings.bootstrap.clone());
            let today = Utc::now().date_naive();
            let series = store.record(EquityPoint::new(today, aum))?;
            println!(
                "Recorded {} for {today}. The history now has {} points.",
                dashboard::usd(aum),
                series.len()
            );
        }
        HistoryCommand::Check => {
            let store = HistoryStore::new(&settings.storage, settings.bootstrap.clone());
            let report = store.load()?;
            println!(
                "{}: {} points accepted, {} rows rejected.",
                store.path().display(),
                report.series.len(),
                report.rejected.len()
            );
            if !report.rejected.is_empty() {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Line", "Reason", "Content"]);
                for row in &report.rejected {
                    table.add_row(vec![row.line.to_string(), row.reason.to_string(), row.content.clone()]);
                }
                println!("{table}");
            }
        }
    }
    Ok(())
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}
