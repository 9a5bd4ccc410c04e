//! In-memory backend for store tests.
//!
//! Behaves like the `/caja` endpoints: rejects opening twice, rejects closing
//! a closed register, computes the variance, keeps a movement ledger.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use caja_client::{
    CajaApi, ClientError, ClientResult, MovementReceipt, ReconciliationSummary, ShiftStore,
    StoreEventEmitter, StoreSettings,
};
use caja_core::control::{CloseShiftRequest, OpenShiftRequest};
use caja_core::{
    DailySalesSummary, HistoryFilter, HistoryQuery, Money, MovementType, Page, Pagination,
    PaymentBreakdown, ShiftMovement, ShiftStatus, ShiftStatusSnapshot,
};

pub const OP_STATUS: &str = "fetch_status";
pub const OP_OPEN: &str = "open_shift";
pub const OP_CLOSE: &str = "close_shift";
pub const OP_HISTORY: &str = "fetch_history";
pub const OP_RECONCILIATION: &str = "fetch_reconciliation";
pub const OP_EXPORT: &str = "export_reconciliation";

pub fn soles(major: i64) -> Money {
    Money::from_major_minor(major, 0)
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn breakdown(cash: i64, yape: i64, plin: i64, transfer: i64, card: i64) -> PaymentBreakdown {
    PaymentBreakdown {
        cash: soles(cash),
        yape: soles(yape),
        plin: soles(plin),
        transfer: soles(transfer),
        card: soles(card),
    }
}

// =============================================================================
// Fake Server State
// =============================================================================

#[derive(Debug, Clone)]
pub struct FakeServer {
    pub status: ShiftStatus,
    pub opening_amount: Money,
    pub sales: PaymentBreakdown,
    pub movements: Vec<ShiftMovement>,
    /// Close into PENDING_CLOSE instead of CLOSED.
    pub flag_reconciliation: bool,
    pub now: DateTime<Utc>,
    next_id: u32,
}

impl Default for FakeServer {
    fn default() -> Self {
        FakeServer {
            status: ShiftStatus::Closed,
            opening_amount: Money::zero(),
            sales: PaymentBreakdown::default(),
            movements: Vec::new(),
            flag_reconciliation: false,
            now: at(2024, 1, 1, 8),
            next_id: 1,
        }
    }
}

impl FakeServer {
    fn next_id(&mut self) -> String {
        let id = format!("mov-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn aperture(&self) -> Option<ShiftMovement> {
        self.movements
            .iter()
            .rev()
            .find(|m| m.movement_type == MovementType::Aperture)
            .cloned()
    }

    pub fn snapshot(&self) -> ShiftStatusSnapshot {
        ShiftStatusSnapshot {
            status: self.status,
            movement: match self.status {
                ShiftStatus::Closed => None,
                _ => self.aperture(),
            },
            daily_sales: DailySalesSummary {
                total_income: self.sales.total(),
                payment_breakdown: self.sales,
                formal_vouchers: 2,
                informal_vouchers: 1,
                payments: 3,
            },
        }
    }

    fn rejected(message: &str) -> ClientError {
        ClientError::Server {
            code: 0,
            message: message.to_string(),
        }
    }

    fn open(&mut self, request: &OpenShiftRequest) -> ClientResult<MovementReceipt> {
        if self.status != ShiftStatus::Closed {
            return Err(Self::rejected("Ya existe una caja abierta"));
        }
        let id = self.next_id();
        self.movements.push(ShiftMovement {
            id: id.clone(),
            movement_type: MovementType::Aperture,
            timestamp: self.now,
            opening_amount: Some(request.opening_amount),
            closing_amount: None,
            counted: None,
            total_sales: None,
            variance: None,
            amount: None,
            notes: request.notes.clone(),
            operator: None,
        });
        self.status = ShiftStatus::Open;
        self.opening_amount = request.opening_amount;
        Ok(MovementReceipt {
            id: Some(id),
            variance: None,
        })
    }

    fn close(&mut self, request: &CloseShiftRequest) -> ClientResult<MovementReceipt> {
        if self.status != ShiftStatus::Open {
            return Err(Self::rejected("No hay caja abierta"));
        }
        let declared = request.counted.total();
        let system = self.sales.total();
        let variance = declared - system;
        let id = self.next_id();
        self.movements.push(ShiftMovement {
            id: id.clone(),
            movement_type: MovementType::Closure,
            timestamp: self.now,
            opening_amount: None,
            closing_amount: Some(declared),
            counted: Some(request.counted),
            total_sales: Some(system),
            variance: Some(variance),
            amount: None,
            notes: request.notes.clone(),
            operator: None,
        });
        self.status = if self.flag_reconciliation {
            ShiftStatus::PendingClose
        } else {
            ShiftStatus::Closed
        };
        Ok(MovementReceipt {
            id: Some(id),
            variance: Some(variance),
        })
    }

    fn history(&self, query: &HistoryQuery) -> Page<ShiftMovement> {
        let matching: Vec<ShiftMovement> = self
            .movements
            .iter()
            .filter(|m| query.filter.contains(m.timestamp.date_naive()))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let size = query.page_size as usize;
        let items = matching
            .into_iter()
            .skip((query.page as usize - 1) * size)
            .take(size)
            .collect();
        Page {
            items,
            pagination: Pagination {
                page: query.page,
                limit: query.page_size,
                total,
                total_pages: total.div_ceil(u64::from(query.page_size)) as u32,
            },
        }
    }
}

// =============================================================================
// Fake API
// =============================================================================

#[derive(Default)]
pub struct FakeCajaApi {
    pub server: Mutex<FakeServer>,
    status_delays: Mutex<VecDeque<Duration>>,
    mutation_delays: Mutex<VecDeque<Duration>>,
    history_delays: Mutex<VecDeque<Duration>>,
    failures: Mutex<HashMap<&'static str, VecDeque<ClientError>>>,
    calls: Mutex<Vec<(&'static str, Uuid)>>,
}

impl FakeCajaApi {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A register already open with `opening` and today's `sales`.
    pub fn open_with(opening: Money, sales: PaymentBreakdown) -> Arc<Self> {
        let api = Self::default();
        {
            let mut server = api.server.lock().unwrap();
            server
                .open(&OpenShiftRequest {
                    opening_amount: opening,
                    notes: None,
                })
                .unwrap();
            server.sales = sales;
        }
        Arc::new(api)
    }

    pub fn with_server(&self, f: impl FnOnce(&mut FakeServer)) {
        f(&mut self.server.lock().unwrap());
    }

    pub fn delay_next_status(&self, delay: Duration) {
        self.status_delays.lock().unwrap().push_back(delay);
    }

    pub fn delay_next_mutation(&self, delay: Duration) {
        self.mutation_delays.lock().unwrap().push_back(delay);
    }

    pub fn delay_next_history(&self, delay: Duration) {
        self.history_delays.lock().unwrap().push_back(delay);
    }

    pub fn fail_next(&self, operation: &'static str, error: ClientError) {
        self.failures
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub fn calls_to(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(op, _)| *op == operation)
            .count()
    }

    pub fn request_ids(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().iter().map(|(_, id)| *id).collect()
    }

    fn record(&self, operation: &'static str, request_id: Uuid) -> ClientResult<()> {
        self.calls.lock().unwrap().push((operation, request_id));
        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn pause(queue: &Mutex<VecDeque<Duration>>) {
        let delay = queue.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CajaApi for FakeCajaApi {
    async fn fetch_status(&self, request_id: Uuid) -> ClientResult<ShiftStatusSnapshot> {
        self.record(OP_STATUS, request_id)?;
        // The server answers with the state at request time.
        let snapshot = self.server.lock().unwrap().snapshot();
        Self::pause(&self.status_delays).await;
        Ok(snapshot)
    }

    async fn open_shift(
        &self,
        request_id: Uuid,
        request: &OpenShiftRequest,
    ) -> ClientResult<MovementReceipt> {
        self.record(OP_OPEN, request_id)?;
        Self::pause(&self.mutation_delays).await;
        self.server.lock().unwrap().open(request)
    }

    async fn close_shift(
        &self,
        request_id: Uuid,
        request: &CloseShiftRequest,
    ) -> ClientResult<MovementReceipt> {
        self.record(OP_CLOSE, request_id)?;
        Self::pause(&self.mutation_delays).await;
        self.server.lock().unwrap().close(request)
    }

    async fn fetch_history(
        &self,
        request_id: Uuid,
        query: &HistoryQuery,
    ) -> ClientResult<Page<ShiftMovement>> {
        self.record(OP_HISTORY, request_id)?;
        let page = self.server.lock().unwrap().history(query);
        Self::pause(&self.history_delays).await;
        Ok(page)
    }

    async fn fetch_reconciliation(
        &self,
        request_id: Uuid,
        _filter: &HistoryFilter,
    ) -> ClientResult<ReconciliationSummary> {
        self.record(OP_RECONCILIATION, request_id)?;
        let server = self.server.lock().unwrap();
        Ok(ReconciliationSummary {
            total_ingresos: Some(server.sales.total()),
            monto_inicial: Some(server.opening_amount),
            ..ReconciliationSummary::default()
        })
    }

    async fn export_reconciliation(
        &self,
        request_id: Uuid,
        _filter: &HistoryFilter,
    ) -> ClientResult<Vec<u8>> {
        self.record(OP_EXPORT, request_id)?;
        Ok(b"PK\x03\x04arqueo".to_vec())
    }
}

// =============================================================================
// Store Helpers
// =============================================================================

pub fn store_for(api: Arc<FakeCajaApi>) -> ShiftStore {
    ShiftStore::new(api, StoreSettings::default())
}

/// Emitter that records every event name.
#[derive(Default)]
pub struct RecordingEmitter {
    pub events: Mutex<Vec<String>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl StoreEventEmitter for RecordingEmitter {
    fn emit_snapshot(&self, snapshot: &ShiftStatusSnapshot) {
        self.events
            .lock()
            .unwrap()
            .push(format!("snapshot:{}", snapshot.status));
    }

    fn emit_history(&self, page: &Page<ShiftMovement>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("history:{}", page.items.len()));
    }

    fn emit_error(&self, message: &str) {
        self.events.lock().unwrap().push(format!("error:{}", message));
    }

    fn emit_error_cleared(&self) {
        self.events.lock().unwrap().push("error_cleared".to_string());
    }
}
