//! # caja-client: Backend Access and Shift Store
//!
//! The I/O half of the register: configuration, the `/caja` REST client and
//! the [`ShiftStore`] every view reads from.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         caja-client                                     │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  ShiftStore (store.rs)                           │  │
//! │  │  snapshot • history page • error (auto-clears) • operations      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ Arc<dyn CajaApi>                        │
//! │                               ▼                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  HttpCajaApi   │  │   protocol     │  │   ClientConfig         │    │
//! │  │  (api.rs)      │──│  envelopes,    │  │   caja.toml + env      │    │
//! │  │  reqwest       │  │  Spanish DTOs  │  │   overrides            │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  STORE EVENTS (StoreEventEmitter):                                     │
//! │  • snapshot  • history  • error  • error cleared                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - `CajaApi` trait and its reqwest implementation
//! - [`config`] - Client configuration (API URL, token, timeouts, paging)
//! - [`error`] - Client error types
//! - [`protocol`] - Wire DTOs and envelope handling
//! - [`store`] - The shift store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caja_client::{ClientConfig, ShiftStore};
//! use caja_core::Money;
//!
//! let config = ClientConfig::load(None)?;
//! let store = ShiftStore::from_config(&config)?;
//!
//! let snapshot = store.fetch_status().await?;
//! if !snapshot.status.is_open() {
//!     store.open_shift(Money::from_cents(20_000), None).await?;
//! }
//! println!("Status: {:?}", store.status().await);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod protocol;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{CajaApi, HttpCajaApi};
pub use config::{ApiSettings, ClientConfig, StoreSettings};
pub use error::{ClientError, ClientResult};
pub use protocol::{MovementReceipt, ReconciliationSummary};
pub use store::{NoOpEmitter, ShiftStore, StoreEventEmitter, StoreState};
