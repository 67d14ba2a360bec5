use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use xrates::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Driver to use instead of the configured default
    #[arg(short, long, global = true)]
    driver: Option<String>,

    /// Do not write fetched rates to the cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Ignore and replace any cached value
    #[arg(long, global = true)]
    bust_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xrates::AppCommand {
    fn from(cmd: Commands) -> xrates::AppCommand {
        match cmd {
            Commands::Currencies => xrates::AppCommand::Currencies,
            Commands::Rate { from, to, date } => xrates::AppCommand::Rate { from, to, date },
            Commands::Convert {
                value,
                from,
                to,
                date,
            } => xrates::AppCommand::Convert {
                value,
                from,
                to,
                date,
            },
            Commands::Range {
                from,
                to,
                start,
                end,
            } => xrates::AppCommand::Range {
                from,
                to,
                start,
                end,
            },
            Commands::ConvertRange {
                value,
                from,
                to,
                start,
                end,
            } => xrates::AppCommand::ConvertRange {
                value,
                from,
                to,
                start,
                end,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List the currencies supported by the driver
    Currencies,
    /// Show exchange rates from one currency to others
    Rate {
        from: String,
        #[arg(required = true)]
        to: Vec<String>,
        /// Historical date (YYYY-MM-DD), latest when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Convert an amount from one currency to others
    Convert {
        value: f64,
        from: String,
        #[arg(required = true)]
        to: Vec<String>,
        /// Historical date (YYYY-MM-DD), latest when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show exchange rates for every day in a date range
    Range {
        from: String,
        #[arg(required = true)]
        to: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
    /// Convert an amount for every day in a date range
    ConvertRange {
        value: f64,
        from: String,
        #[arg(required = true)]
        to: Vec<String>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = xrates::RunOptions {
        driver: cli.driver,
        no_cache: cli.no_cache,
        bust_cache: cli.bust_cache,
    };

    let result = match cli.command {
        Some(Commands::Setup) => xrates::cli::setup::setup(),
        Some(cmd) => xrates::run_command(cmd.into(), cli.config_path.as_deref(), &options).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
