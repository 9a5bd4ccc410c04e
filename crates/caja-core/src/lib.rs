//! # caja-core: Pure Shift Logic for the Cash Register
//!
//! Everything about a register shift that can be decided without talking to
//! the backend: money arithmetic, domain types, the per-operation request
//! state machine and the two view-models (Shift Control, Shift History).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Caja Workspace                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/caja-cli (front end)                      │   │
//! │  │        status ─ open ─ close ─ history ─ arqueo ─ export        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            caja-client (config, REST client, ShiftStore)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ caja-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │   │  money  │ │  types  │ │ operation │ │ control │ │history │ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │            NO I/O • NO NETWORK • NO CLOCK READS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer-cent money type and its decimal wire codec
//! - [`types`] - Shift status, movements, payment buckets, paging
//! - [`operation`] - Per-operation request state and tokens
//! - [`control`] - Shift Control view-model (open/close forms, variance)
//! - [`history`] - Shift History view-model (date range, pages, rows)
//! - [`format`] - Currency, date and label formatting
//! - [`validation`] - Field checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::control::CloseForm;
//! use caja_core::{DailySalesSummary, Money, PaymentMethod};
//!
//! let mut sales = DailySalesSummary::default();
//! sales.payment_breakdown.cash = Money::from_cents(30_000);
//! sales.total_income = Money::from_cents(30_000);
//!
//! let mut form = CloseForm::prefill(Money::from_cents(20_000), &sales);
//! assert_eq!(form.field(PaymentMethod::Cash), "500.00");
//!
//! form.set_field(PaymentMethod::Cash, "480");
//! assert_eq!(form.variance(), Money::from_cents(18_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod control;
pub mod error;
pub mod format;
pub mod history;
pub mod money;
pub mod operation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use operation::{OperationKind, OperationState, OperationTable, RequestToken};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency symbol shown to operators (Peruvian sol).
pub const CURRENCY_SYMBOL: &str = "S/";

/// History rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page the history endpoint is asked for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of "observaciones".
pub const MAX_NOTES_LEN: usize = 255;

/// Seconds an error message stays visible before it clears itself.
pub const ERROR_CLEAR_SECS: u64 = 5;
