//! Subcommand handlers. Each one drives the store and the view-models the
//! same way an interactive screen would, then prints the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate};
use clap::Args;
use tracing::{debug, info};

use caja_client::{ClientConfig, ClientError, ShiftStore};
use caja_core::control::ShiftControl;
use caja_core::history::ShiftHistory;
use caja_core::validation::parse_date;
use caja_core::{HistoryFilter, PaymentMethod};

use crate::render;

/// Date arguments accept `YYYY-MM-DD` or `dd/mm/yyyy`.
pub fn parse_day(text: &str) -> std::result::Result<NaiveDate, String> {
    parse_date("fecha", text).map_err(|e| e.to_string())
}

/// Operator-facing failure: the message the store would display.
fn operator_error(err: ClientError) -> anyhow::Error {
    anyhow::Error::msg(err.user_message())
}

// =============================================================================
// Arguments
// =============================================================================

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Opening float, e.g. 200 or 150.50.
    #[arg(long)]
    pub amount: String,

    #[arg(long)]
    pub notes: Option<String>,
}

/// Counted amounts. Omitted methods keep the pre-filled expected value.
#[derive(Args, Debug)]
pub struct CloseArgs {
    #[arg(long)]
    pub cash: Option<String>,
    #[arg(long)]
    pub yape: Option<String>,
    #[arg(long)]
    pub plin: Option<String>,
    #[arg(long)]
    pub transfer: Option<String>,
    #[arg(long)]
    pub card: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl CloseArgs {
    fn overrides(&self) -> [(PaymentMethod, Option<&String>); 5] {
        [
            (PaymentMethod::Cash, self.cash.as_ref()),
            (PaymentMethod::Yape, self.yape.as_ref()),
            (PaymentMethod::Plin, self.plin.as_ref()),
            (PaymentMethod::Transfer, self.transfer.as_ref()),
            (PaymentMethod::Card, self.card.as_ref()),
        ]
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct RangeArgs {
    /// First day (defaults to today).
    #[arg(long, value_parser = parse_day)]
    pub from: Option<NaiveDate>,

    /// Last day (defaults to today).
    #[arg(long, value_parser = parse_day)]
    pub to: Option<NaiveDate>,
}

impl RangeArgs {
    fn filter(&self, today: NaiveDate) -> HistoryFilter {
        HistoryFilter {
            date_from: self.from.unwrap_or(today),
            date_to: self.to.unwrap_or(today),
        }
    }
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Rows per page (defaults to the configured page size).
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Output file (defaults to `arqueo_<from>_<to>.xlsx`).
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Save the effective settings to the config file.
    #[arg(long)]
    pub write: bool,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn run_status(store: &ShiftStore) -> Result<()> {
    let result = store.fetch_status().await;
    print_control(store, &ShiftControl::new()).await;
    result.map(|_| ()).map_err(operator_error)
}

pub async fn run_open(store: &ShiftStore, args: &OpenArgs) -> Result<()> {
    let snapshot = store.fetch_status().await.map_err(operator_error)?;

    let mut control = ShiftControl::new();
    let form = control.begin_open(snapshot.status)?;
    form.opening_amount = args.amount.clone();
    form.notes = args.notes.clone().unwrap_or_default();
    let request = form.to_request()?;

    let result = store
        .open_shift(request.opening_amount, request.notes.as_deref())
        .await;
    control.finish_open(&result);
    print_control(store, &control).await;

    let receipt = result.map_err(operator_error)?;
    info!(movement_id = ?receipt.id, "Open submitted");
    Ok(())
}

pub async fn run_close(store: &ShiftStore, args: &CloseArgs) -> Result<()> {
    let snapshot = store.fetch_status().await.map_err(operator_error)?;

    let mut control = ShiftControl::new();
    let form = control.begin_close(&snapshot)?;
    for (method, text) in args.overrides() {
        if let Some(text) = text {
            form.set_field(method, text.clone());
        }
    }
    form.notes = args.notes.clone().unwrap_or_default();
    let request = form.to_request()?;

    // Print what is about to be declared before the form goes away.
    print_control(store, &control).await;

    let result = store
        .close_shift(request.counted, request.notes.as_deref())
        .await;
    control.finish_close(&result);

    let receipt = result.map_err(operator_error)?;
    if let Some(variance) = receipt.variance {
        println!("Diferencia registrada: {}", caja_core::format::signed_currency(variance));
    }
    print_control(store, &control).await;
    Ok(())
}

pub async fn run_history(
    store: &ShiftStore,
    args: &HistoryArgs,
    today: NaiveDate,
    offset: FixedOffset,
) -> Result<()> {
    let page_size = args.limit.unwrap_or(store.settings().history_page_size);
    let mut history = ShiftHistory::new(today, page_size)?.with_utc_offset(offset);
    let range = args.range.filter(today);
    history.set_date_from(range.date_from);
    history.set_date_to(range.date_to);

    let query = history.apply()?;
    let mut page = store.fetch_history(query).await.map_err(operator_error)?;

    if args.page > 1 {
        let query = history.go_to_page(args.page, &page.pagination)?;
        debug!(page = query.page, "Jumping to requested page");
        page = store.fetch_history(query).await.map_err(operator_error)?;
    }

    print!("{}", render::history(&history.view(&page)));
    Ok(())
}

pub async fn run_reconciliation(
    store: &ShiftStore,
    range: &RangeArgs,
    today: NaiveDate,
) -> Result<()> {
    let summary = store
        .fetch_reconciliation(range.filter(today))
        .await
        .map_err(operator_error)?;
    print!("{}", render::reconciliation(&summary));
    Ok(())
}

pub async fn run_export(store: &ShiftStore, args: &ExportArgs, today: NaiveDate) -> Result<()> {
    let filter = args.range.filter(today);
    let bytes = store
        .export_reconciliation(filter)
        .await
        .map_err(operator_error)?;

    let path = args.out.clone().unwrap_or_else(|| default_export_path(&filter));
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Arqueo exportado a {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub fn run_config(
    config: &ClientConfig,
    args: &ConfigArgs,
    path: Option<PathBuf>,
) -> std::result::Result<(), ClientError> {
    print!("{}", render::config(config));
    if args.write {
        let target = path.clone().or_else(ClientConfig::default_config_path);
        config.save(path)?;
        if let Some(target) = target {
            println!("Configuración guardada en {}", target.display());
        }
    }
    Ok(())
}

fn default_export_path(filter: &HistoryFilter) -> PathBuf {
    PathBuf::from(format!(
        "arqueo_{}_{}.xlsx",
        filter.date_from.format("%Y-%m-%d"),
        filter.date_to.format("%Y-%m-%d")
    ))
}

async fn print_control(store: &ShiftStore, control: &ShiftControl) {
    let state = store.state().await;
    let view = control.view(
        state.snapshot.as_ref(),
        state.error.as_deref(),
        state.is_loading(),
    );
    print!("{}", render::control(&view));
}
