//! # Shift Store
//!
//! Single source of truth for the register: current status, active movement,
//! today's sales, the current history page and the current error message.
//! Every network call about shifts goes through here.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ShiftStore                                     │
//! │                                                                         │
//! │  open_shift / close_shift                                               │
//! │     │ begin(kind) ── Busy? ──► Err(Busy)                                │
//! │     ▼                                                                   │
//! │  CajaApi call ─── Err ──► fail(token) + set_error ──► Err(e)            │
//! │     │ Ok                                                                │
//! │     ▼                                                                   │
//! │  complete(token)                                                        │
//! │  supersede(FetchStatus) ──► GET /caja/estado ──► snapshot replaced      │
//! │                                                                         │
//! │  fetch_history: supersede(FetchHistory), the latest filter wins         │
//! │                                                                         │
//! │  No optimistic updates: the snapshot only changes from a server reply.  │
//! │                                                                         │
//! │  set_error: error = msg, generation += 1, spawn timer(generation)       │
//! │  timer fires: clears only if generation is unchanged                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is cheap to clone; clones share the same state. Build one at
//! the application root and pass it down.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use caja_core::control::{CloseShiftRequest, OpenShiftRequest};
use caja_core::validation::{
    validate_date_range, validate_non_negative, validate_notes, validate_page_size,
};
use caja_core::{
    HistoryFilter, HistoryQuery, Money, OperationKind, OperationTable, Page, PaymentBreakdown,
    RequestToken, ShiftMovement, ShiftStatus, ShiftStatusSnapshot,
};

use crate::api::{CajaApi, HttpCajaApi};
use crate::config::{ClientConfig, StoreSettings};
use crate::error::{ClientError, ClientResult};
use crate::protocol::{MovementReceipt, ReconciliationSummary};

// =============================================================================
// Event Emitter
// =============================================================================

/// Observer of store changes, e.g. a UI bridge.
pub trait StoreEventEmitter: Send + Sync {
    /// A new status snapshot was stored.
    fn emit_snapshot(&self, snapshot: &ShiftStatusSnapshot);

    /// A new history page was stored.
    fn emit_history(&self, page: &Page<ShiftMovement>);

    /// An error message was set.
    fn emit_error(&self, message: &str);

    /// The error message was cleared (timer or explicit).
    fn emit_error_cleared(&self);
}

/// Emitter that ignores everything.
pub struct NoOpEmitter;

impl StoreEventEmitter for NoOpEmitter {
    fn emit_snapshot(&self, _snapshot: &ShiftStatusSnapshot) {}
    fn emit_history(&self, _page: &Page<ShiftMovement>) {}
    fn emit_error(&self, _message: &str) {}
    fn emit_error_cleared(&self) {}
}

// =============================================================================
// Store State
// =============================================================================

/// Everything the views render from.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Last snapshot confirmed by the server. `None` before the first fetch.
    pub snapshot: Option<ShiftStatusSnapshot>,

    /// Last fetched history page. Replaced in place on every fetch.
    pub history: Option<Page<ShiftMovement>>,

    /// Message shown to the operator; clears itself after a few seconds.
    pub error: Option<String>,

    pub operations: OperationTable,

    error_generation: u64,
}

impl StoreState {
    /// True while any request is in flight.
    pub fn is_loading(&self) -> bool {
        self.operations.any_pending()
    }

    pub fn status(&self) -> Option<ShiftStatus> {
        self.snapshot.as_ref().map(|s| s.status)
    }
}

// =============================================================================
// Shift Store
// =============================================================================

#[derive(Clone)]
pub struct ShiftStore {
    state: Arc<RwLock<StoreState>>,
    api: Arc<dyn CajaApi>,
    emitter: Arc<dyn StoreEventEmitter>,
    settings: StoreSettings,
}

impl ShiftStore {
    pub fn new(api: Arc<dyn CajaApi>, settings: StoreSettings) -> Self {
        Self::with_emitter(api, settings, Arc::new(NoOpEmitter))
    }

    pub fn with_emitter(
        api: Arc<dyn CajaApi>,
        settings: StoreSettings,
        emitter: Arc<dyn StoreEventEmitter>,
    ) -> Self {
        ShiftStore {
            state: Arc::new(RwLock::new(StoreState::default())),
            api,
            emitter,
            settings,
        }
    }

    /// Builds a store talking HTTP to the configured backend.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let api = HttpCajaApi::new(&config.api)?;
        info!(base_url = %api.base_url(), "Shift store ready");
        Ok(Self::new(Arc::new(api), config.store))
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn state(&self) -> StoreState {
        self.state.read().await.clone()
    }

    pub async fn snapshot(&self) -> Option<ShiftStatusSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    pub async fn status(&self) -> Option<ShiftStatus> {
        self.state.read().await.status()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading()
    }

    /// Clears the error message now.
    pub async fn clear_error(&self) {
        let mut state = self.state.write().await;
        state.error_generation += 1;
        if state.error.take().is_some() {
            self.emitter.emit_error_cleared();
        }
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Fetches status, active movement and today's sales.
    ///
    /// On failure the previous snapshot stays and the error is shown.
    pub async fn fetch_status(&self) -> ClientResult<ShiftStatusSnapshot> {
        let token = self.begin(OperationKind::FetchStatus).await?;
        self.run_fetch_status(token).await
    }

    async fn run_fetch_status(&self, token: RequestToken) -> ClientResult<ShiftStatusSnapshot> {
        debug!(request_id = %token.id, seq = token.seq, "Fetching register status");
        let result = self.api.fetch_status(token.id).await;

        let mut state = self.state.write().await;
        if !state.operations.is_current(&token) {
            debug!(request_id = %token.id, "Discarding stale status response");
            return result;
        }

        match result {
            Ok(snapshot) => {
                state.operations.complete(&token);
                debug!(status = %snapshot.status, "Register status updated");
                state.snapshot = Some(snapshot.clone());
                self.emitter.emit_snapshot(&snapshot);
                Ok(snapshot)
            }
            Err(err) => {
                warn!(request_id = %token.id, error = %err, "Status fetch failed");
                state.operations.fail(&token, err.user_message());
                self.set_error(&mut state, err.user_message());
                Err(err)
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Opens a shift with a starting float.
    ///
    /// "No shift open" is checked by the backend. A negative amount is only
    /// logged.
    pub async fn open_shift(
        &self,
        opening_amount: Money,
        notes: Option<&str>,
    ) -> ClientResult<MovementReceipt> {
        if let Err(err) = validate_non_negative("monto inicial", opening_amount) {
            warn!(%opening_amount, error = %err, "Opening a shift with a negative amount");
        }
        let notes = self.check(validate_notes(notes)).await?;
        let request = OpenShiftRequest {
            opening_amount,
            notes,
        };

        let token = self.begin(OperationKind::OpenShift).await?;
        debug!(request_id = %token.id, %opening_amount, "Opening shift");
        let result = self.api.open_shift(token.id, &request).await;
        let receipt = self.finish_mutation(token, result).await?;

        info!(movement_id = ?receipt.id, %opening_amount, "Shift opened");
        self.refetch_after_mutation().await;
        Ok(receipt)
    }

    /// Closes the shift declaring the counted amount per payment method.
    ///
    /// A mismatch against the system total never blocks the request.
    pub async fn close_shift(
        &self,
        counted: PaymentBreakdown,
        notes: Option<&str>,
    ) -> ClientResult<MovementReceipt> {
        let notes = self.check(validate_notes(notes)).await?;
        let request = CloseShiftRequest { counted, notes };

        let token = self.begin(OperationKind::CloseShift).await?;
        debug!(request_id = %token.id, declared = %counted.total(), "Closing shift");
        let result = self.api.close_shift(token.id, &request).await;
        let receipt = self.finish_mutation(token, result).await?;

        info!(
            movement_id = ?receipt.id,
            variance = ?receipt.variance.map(|v| v.to_string()),
            "Shift closed"
        );
        self.refetch_after_mutation().await;
        Ok(receipt)
    }

    async fn finish_mutation(
        &self,
        token: RequestToken,
        result: ClientResult<MovementReceipt>,
    ) -> ClientResult<MovementReceipt> {
        let mut state = self.state.write().await;
        match result {
            Ok(receipt) => {
                state.operations.complete(&token);
                Ok(receipt)
            }
            Err(err) => {
                warn!(request_id = %token.id, operation = %token.kind, error = %err, "Shift mutation failed");
                state.operations.fail(&token, err.user_message());
                self.set_error(&mut state, err.user_message());
                Err(err)
            }
        }
    }

    /// Status refetch after a confirmed mutation. Always runs: an in-flight
    /// user fetch becomes stale.
    async fn refetch_after_mutation(&self) {
        let token = self
            .state
            .write()
            .await
            .operations
            .supersede(OperationKind::FetchStatus);
        // A failed refetch already surfaces its own error.
        let _ = self.run_fetch_status(token).await;
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Fetches one history page and replaces the stored one.
    ///
    /// A newer query supersedes one still in flight: the older response is
    /// discarded, so the stored page always matches the last filter asked for.
    pub async fn fetch_history(&self, query: HistoryQuery) -> ClientResult<Page<ShiftMovement>> {
        self.check(validate_page_size(query.page_size)).await?;
        self.check(validate_date_range(&query.filter)).await?;

        let token = self
            .state
            .write()
            .await
            .operations
            .supersede(OperationKind::FetchHistory);
        debug!(
            request_id = %token.id,
            page = query.page,
            from = %query.filter.date_from,
            to = %query.filter.date_to,
            "Fetching shift history"
        );
        let result = self.api.fetch_history(token.id, &query).await;

        let mut state = self.state.write().await;
        if !state.operations.is_current(&token) {
            debug!(request_id = %token.id, "Discarding stale history response");
            return result;
        }

        match result {
            Ok(page) => {
                state.operations.complete(&token);
                debug!(
                    rows = page.items.len(),
                    total = page.pagination.total,
                    "History page updated"
                );
                state.history = Some(page.clone());
                self.emitter.emit_history(&page);
                Ok(page)
            }
            Err(err) => {
                warn!(request_id = %token.id, error = %err, "History fetch failed");
                state.operations.fail(&token, err.user_message());
                self.set_error(&mut state, err.user_message());
                Err(err)
            }
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Reconciliation summary for a date range. Not stored.
    pub async fn fetch_reconciliation(
        &self,
        filter: HistoryFilter,
    ) -> ClientResult<ReconciliationSummary> {
        self.check(validate_date_range(&filter)).await?;
        let request_id = Uuid::new_v4();
        debug!(%request_id, from = %filter.date_from, to = %filter.date_to, "Fetching reconciliation");
        let result = self.api.fetch_reconciliation(request_id, &filter).await;
        self.surface(result).await
    }

    /// Spreadsheet export of the reconciliation. Saving it is the caller's job.
    pub async fn export_reconciliation(&self, filter: HistoryFilter) -> ClientResult<Vec<u8>> {
        self.check(validate_date_range(&filter)).await?;
        let request_id = Uuid::new_v4();
        debug!(%request_id, from = %filter.date_from, to = %filter.date_to, "Exporting reconciliation");
        let result = self.api.export_reconciliation(request_id, &filter).await;
        if let Ok(bytes) = &result {
            info!(bytes = bytes.len(), "Reconciliation exported");
        }
        self.surface(result).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn begin(&self, kind: OperationKind) -> ClientResult<RequestToken> {
        let mut state = self.state.write().await;
        state.operations.begin(kind).map_err(|err| {
            debug!(operation = %kind, error = %err, "Rejected while busy");
            ClientError::from(err)
        })
    }

    /// Surfaces a local validation failure like any other error.
    async fn check<T>(&self, result: Result<T, caja_core::ValidationError>) -> ClientResult<T> {
        self.surface(result.map_err(ClientError::from)).await
    }

    async fn surface<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            warn!(error = %err, "Store operation failed");
            let mut state = self.state.write().await;
            self.set_error(&mut state, err.user_message());
        }
        result
    }

    /// Shows a message and schedules its removal.
    fn set_error(&self, state: &mut StoreState, message: String) {
        state.error_generation += 1;
        let generation = state.error_generation;
        self.emitter.emit_error(&message);
        state.error = Some(message);

        let store = self.clone();
        let delay = self.settings.error_clear_after();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = store.state.write().await;
            if state.error_generation == generation && state.error.take().is_some() {
                debug!("Error message cleared after timeout");
                store.emitter.emit_error_cleared();
            }
        });
    }
}

impl std::fmt::Debug for ShiftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShiftStore")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
