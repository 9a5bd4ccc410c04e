//! # caja CLI
//!
//! Terminal front end for the cash-register shift controller.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  caja status                      → Shift Control view                  │
//! │  caja open --amount 200           → open form → POST /caja/abrir        │
//! │  caja close --cash 480            → pre-filled close form → /cerrar     │
//! │  caja history --from .. --to ..   → Shift History view                  │
//! │  caja arqueo / caja export        → reconciliation summary / file       │
//! │  caja config [--write]            → effective settings / caja.toml      │
//! │                                                                         │
//! │  every command: ClientConfig::load → ShiftStore::from_config            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Offset;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use caja_client::{ClientConfig, ClientError, ShiftStore};

use crate::commands::{CloseArgs, ConfigArgs, ExportArgs, HistoryArgs, OpenArgs, RangeArgs};

/// Open, close and review cash-register shifts.
#[derive(Parser, Debug)]
#[command(name = "caja", version, about, long_about = None)]
struct Cli {
    /// Verbose output. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding config and CAJA_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the register status, opening float and today's sales.
    Status,

    /// Open a shift with a starting float.
    Open(OpenArgs),

    /// Close the shift declaring the counted amounts.
    Close(CloseArgs),

    /// List shift movements for a date range.
    History(HistoryArgs),

    /// Reconciliation summary for a date range.
    Arqueo(RangeArgs),

    /// Download the reconciliation spreadsheet.
    Export(ExportArgs),

    /// Show the effective configuration, optionally saving it.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// `-v` levels win; without them `RUST_LOG` applies, then `warn`.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config problems get a pointer to where settings come from.
fn config_error(err: ClientError) -> anyhow::Error {
    if err.is_config_error() {
        anyhow::Error::new(err).context("invalid configuration (check caja.toml or CAJA_* variables)")
    } else {
        anyhow::Error::new(err)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load(cli.config.clone()).map_err(config_error)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Commands::Config(args) = &cli.command {
        return commands::run_config(&config, args, cli.config.clone()).map_err(config_error);
    }

    // The operator's wall clock decides "today" and how row times read.
    let now = chrono::Local::now();
    let today = now.date_naive();
    let offset = now.offset().fix();
    config
        .api
        .utc_offset
        .get_or_insert_with(|| offset.to_string());

    let store = ShiftStore::from_config(&config).map_err(config_error)?;
    tracing::debug!(%today, %offset, base_url = %config.api.base_url, "caja CLI starting");

    match &cli.command {
        Commands::Status => commands::run_status(&store).await,
        Commands::Open(args) => commands::run_open(&store, args).await,
        Commands::Close(args) => commands::run_close(&store, args).await,
        Commands::History(args) => commands::run_history(&store, args, today, offset).await,
        Commands::Arqueo(range) => commands::run_reconciliation(&store, range, today).await,
        Commands::Export(args) => commands::run_export(&store, args, today).await,
        Commands::Config(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn cli_parse_open() {
        let cli = Cli::try_parse_from(["caja", "open", "--amount", "200", "--notes", "turno"]).unwrap();
        match cli.command {
            Commands::Open(args) => {
                assert_eq!(args.amount, "200");
                assert_eq!(args.notes.as_deref(), Some("turno"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cli_open_requires_amount() {
        assert!(Cli::try_parse_from(["caja", "open"]).is_err());
    }

    #[test]
    fn cli_parse_close_overrides() {
        let cli = Cli::try_parse_from(["caja", "close", "--cash", "480", "--card", "20"]).unwrap();
        match cli.command {
            Commands::Close(args) => {
                assert_eq!(args.cash.as_deref(), Some("480"));
                assert_eq!(args.card.as_deref(), Some("20"));
                assert!(args.yape.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cli_parse_history_range() {
        let cli = Cli::try_parse_from([
            "caja", "history", "--from", "01/01/2024", "--to", "2024-01-31", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::History(args) => {
                assert_eq!(args.range.from, NaiveDate::from_ymd_opt(2024, 1, 1));
                assert_eq!(args.range.to, NaiveDate::from_ymd_opt(2024, 1, 31));
                assert_eq!(args.page, 2);
                assert!(args.limit.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn cli_rejects_bad_date() {
        assert!(Cli::try_parse_from(["caja", "arqueo", "--from", "ayer"]).is_err());
    }

    #[test]
    fn cli_parse_config_write() {
        let cli = Cli::try_parse_from(["caja", "config", "--write"]).unwrap();
        match cli.command {
            Commands::Config(args) => assert!(args.write),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn config_errors_carry_a_hint() {
        let err = config_error(ClientError::InvalidUrl("ftp://pos".into()));
        assert!(format!("{err:#}").starts_with("invalid configuration"));

        let err = config_error(ClientError::Network("down".into()));
        assert!(!format!("{err:#}").contains("invalid configuration"));
    }

    #[test]
    fn cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["caja", "status", "-vv", "--api-url", "http://pos:3000/api"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.api_url.as_deref(), Some("http://pos:3000/api"));
        assert!(matches!(cli.command, Commands::Status));
    }
}
