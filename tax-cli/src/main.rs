use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use tax_cli::app::{self, Action, AppError, Input};
use tax_cli::logging;
use tax_core::api::ErrorResponse;
use tax_core::{AdjustableDeduction, StoreConfig};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Personal income tax calculator.
///
/// Reads requests as JSON or CSV, computes progressive tax against the
/// configured tax table, and prints the result as JSON on stdout.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Tax table backend to use.
    #[arg(long, global = true, default_value = "memory")]
    backend: String,

    /// Tax table source. For the memory backend this is a TOML file path or
    /// `:builtin:`. Defaults to `TAX_TABLE_PATH`, then `./tax-table.toml`.
    #[arg(long, global = true)]
    table: Option<String>,

    /// Log filter, e.g. `debug` or `tax_core=trace`. Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append log records to this file as well as stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate tax for one JSON request.
    Calculate {
        /// Request file; stdin when omitted.
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// Calculate tax for every row of a CSV file.
    Batch {
        /// CSV file; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Change a configured deduction amount.
    SetDeduction {
        target: DeductionTarget,

        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeductionTarget {
    Personal,
    KReceipt,
}

impl From<DeductionTarget> for AdjustableDeduction {
    fn from(target: DeductionTarget) -> Self {
        match target {
            DeductionTarget::Personal => AdjustableDeduction::Personal,
            DeductionTarget::KReceipt => AdjustableDeduction::KReceipt,
        }
    }
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Calculate { request } => Action::Calculate(Input::from_path(request)),
            Command::Batch { file } => Action::Batch(Input::from_path(file)),
            Command::SetDeduction { target, amount } => Action::SetDeduction {
                target: target.into(),
                amount,
            },
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn report(err: &AppError) {
    match err {
        AppError::Rejected(message) => warn!(%message, "command rejected"),
        AppError::Failed(cause) => error!(error = %format!("{cause:#}"), "command failed"),
    }
    let body = ErrorResponse::new(err.to_string());
    match serde_json::to_string_pretty(&body) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{{\"message\": \"internal error\"}}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref()) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let config = StoreConfig {
        backend: cli.backend,
        source: cli.table.unwrap_or_default(),
    };
    debug!("opening {} backend", config.backend);

    match app::run(&config, cli.command.into()).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::from(err.exit_code())
        }
    }
}
