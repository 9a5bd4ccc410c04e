//! # Domain Types
//!
//! Core domain types for the cash-register shift controller.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │ ShiftStatusSnapshot  (GET /caja/estado, always server-derived)   │  │
//! │  │  ├── status: ShiftStatus        CLOSED | OPEN | PENDING_CLOSE    │  │
//! │  │  ├── movement: ShiftMovement?   the active APERTURE, if any      │  │
//! │  │  └── daily_sales: DailySalesSummary                              │  │
//! │  │        ├── total_income                                          │  │
//! │  │        └── payment_breakdown: PaymentBreakdown                   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ShiftMovement  │   │  MovementType   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (server)    │   │  Aperture       │   │  Cash           │       │
//! │  │  movement_type  │   │  Closure        │   │  Yape           │       │
//! │  │  timestamp      │   │  Income         │   │  Plin           │       │
//! │  │  amounts…       │   │  Expense        │   │  Transfer       │       │
//! │  │  operator (ref) │   └─────────────────┘   │  Card           │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! The backend speaks Spanish (`ABIERTA`, `CIERRE`, `EFECTIVO`…). Each enum
//! knows its wire name and parses it back through `FromStr`, accepting the
//! English names as well so fixtures and logs stay readable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Shift Status
// =============================================================================

/// The status of the cash register as reported by the server.
///
/// ## Transitions (client view, server-confirmed only)
/// ```text
///   CLOSED ──open_shift ok──► OPEN ──close_shift ok──► CLOSED
///                               │
///                               └──server flags reconciliation──► PENDING_CLOSE
///
///   PENDING_CLOSE ──(external correction)──► CLOSED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    /// No shift in progress.
    #[default]
    Closed,
    /// A shift is running; sales are attributed to it.
    Open,
    /// Closed by the operator but flagged by the server for reconciliation.
    PendingClose,
}

impl ShiftStatus {
    /// Name used by the REST API.
    pub const fn wire_name(&self) -> &'static str {
        match self {
            ShiftStatus::Closed => "CERRADA",
            ShiftStatus::Open => "ABIERTA",
            ShiftStatus::PendingClose => "PENDIENTE_CIERRE",
        }
    }

    /// Returns true if a shift is running.
    pub const fn is_open(&self) -> bool {
        matches!(self, ShiftStatus::Open)
    }
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftStatus::Closed => write!(f, "CLOSED"),
            ShiftStatus::Open => write!(f, "OPEN"),
            ShiftStatus::PendingClose => write!(f, "PENDING_CLOSE"),
        }
    }
}

impl FromStr for ShiftStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CERRADA" | "CERRADO" | "CLOSED" => Ok(ShiftStatus::Closed),
            "ABIERTA" | "ABIERTO" | "OPEN" => Ok(ShiftStatus::Open),
            "PENDIENTE_CIERRE" | "PENDIENTE" | "PENDING_CLOSE" => Ok(ShiftStatus::PendingClose),
            other => Err(ValidationError::InvalidFormat {
                field: "estado".to_string(),
                reason: format!("unknown register status '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Kind of ledger entry in the shift history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Shift opened with a starting float.
    Aperture,
    /// Shift closed with counted buckets.
    Closure,
    /// Cash put into the drawer during the shift.
    Income,
    /// Cash taken out of the drawer during the shift.
    Expense,
}

impl MovementType {
    pub const fn wire_name(&self) -> &'static str {
        match self {
            MovementType::Aperture => "APERTURA",
            MovementType::Closure => "CIERRE",
            MovementType::Income => "INGRESO",
            MovementType::Expense => "EGRESO",
        }
    }
}

impl FromStr for MovementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "APERTURA" | "APERTURE" => Ok(MovementType::Aperture),
            "CIERRE" | "CLOSURE" => Ok(MovementType::Closure),
            "INGRESO" | "INCOME" => Ok(MovementType::Income),
            "EGRESO" | "EXPENSE" => Ok(MovementType::Expense),
            other => Err(ValidationError::InvalidFormat {
                field: "tipoMovimiento".to_string(),
                reason: format!("unknown movement type '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// A payment method bucket, tracked independently through the shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash in the drawer.
    Cash,
    /// Yape mobile wallet.
    Yape,
    /// Plin mobile wallet.
    Plin,
    /// Bank transfer.
    Transfer,
    /// Card on an external terminal.
    Card,
}

impl PaymentMethod {
    /// All methods in canonical display order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Yape,
        PaymentMethod::Plin,
        PaymentMethod::Transfer,
        PaymentMethod::Card,
    ];

    /// Key used in the `mediosPago` object of the status response.
    pub const fn wire_key(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "EFECTIVO",
            PaymentMethod::Yape => "YAPE",
            PaymentMethod::Plin => "PLIN",
            PaymentMethod::Transfer => "TRANSFERENCIA",
            PaymentMethod::Card => "TARJETA",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EFECTIVO" | "CASH" => Ok(PaymentMethod::Cash),
            "YAPE" => Ok(PaymentMethod::Yape),
            "PLIN" => Ok(PaymentMethod::Plin),
            "TRANSFERENCIA" | "TRANSFER" => Ok(PaymentMethod::Transfer),
            "TARJETA" | "CARD" => Ok(PaymentMethod::Card),
            other => Err(ValidationError::InvalidFormat {
                field: "medioPago".to_string(),
                reason: format!("unknown payment method '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Payment Breakdown
// =============================================================================

/// One money bucket per payment method.
///
/// Used both for the server's sales breakdown and for the operator's
/// counted amounts at closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    pub cash: Money,
    pub yape: Money,
    pub plin: Money,
    pub transfer: Money,
    pub card: Money,
}

impl PaymentBreakdown {
    /// Returns the bucket for a method.
    pub fn get(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Yape => self.yape,
            PaymentMethod::Plin => self.plin,
            PaymentMethod::Transfer => self.transfer,
            PaymentMethod::Card => self.card,
        }
    }

    /// Returns a mutable reference to the bucket for a method.
    pub fn get_mut(&mut self, method: PaymentMethod) -> &mut Money {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Yape => &mut self.yape,
            PaymentMethod::Plin => &mut self.plin,
            PaymentMethod::Transfer => &mut self.transfer,
            PaymentMethod::Card => &mut self.card,
        }
    }

    /// Replaces the bucket for a method.
    pub fn set(&mut self, method: PaymentMethod, amount: Money) {
        *self.get_mut(method) = amount;
    }

    /// Iterates `(method, amount)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (PaymentMethod, Money)> + '_ {
        PaymentMethod::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Sum of all buckets.
    pub fn total(&self) -> Money {
        self.iter().map(|(_, amount)| amount).sum()
    }

    /// Returns true if at least one bucket is nonzero.
    pub fn any_nonzero(&self) -> bool {
        self.iter().any(|(_, amount)| !amount.is_zero())
    }
}

// =============================================================================
// Variance Sign
// =============================================================================

/// Sign of a closure variance, used to color the variance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VarianceSign {
    /// Declared more than the system expected.
    Surplus,
    /// Declared less than the system expected.
    Shortage,
    /// Exact match.
    Balanced,
}

impl VarianceSign {
    pub fn of(variance: Money) -> Self {
        if variance.is_positive() {
            VarianceSign::Surplus
        } else if variance.is_negative() {
            VarianceSign::Shortage
        } else {
            VarianceSign::Balanced
        }
    }
}

/// Computes `declared - system`, the closure variance ("diferencia").
#[inline]
pub fn variance(declared: Money, system: Money) -> Money {
    declared - system
}

// =============================================================================
// Operator
// =============================================================================

/// The user who registered a movement. Lookup only; never owned by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperatorRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Shift Movement
// =============================================================================

/// One ledger entry: an aperture, a closure, or a cash income/expense.
///
/// ## Field Presence by Type
/// ```text
/// APERTURE  → opening_amount
/// CLOSURE   → closing_amount, counted, total_sales, variance
/// INCOME    → amount
/// EXPENSE   → amount
/// all       → notes?, operator?
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftMovement {
    /// Server-assigned opaque identifier.
    pub id: String,

    pub movement_type: MovementType,

    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,

    /// Starting float (APERTURE).
    pub opening_amount: Option<Money>,

    /// Total declared at closure (CLOSURE).
    pub closing_amount: Option<Money>,

    /// Counted amount per payment method (CLOSURE).
    pub counted: Option<PaymentBreakdown>,

    /// Sales total computed by the server at closure time (CLOSURE).
    pub total_sales: Option<Money>,

    /// Server-computed variance (CLOSURE). Authoritative once submitted.
    pub variance: Option<Money>,

    /// Amount moved in or out of the drawer (INCOME / EXPENSE).
    pub amount: Option<Money>,

    pub notes: Option<String>,

    pub operator: Option<OperatorRef>,
}

impl ShiftMovement {
    /// Sum of the counted buckets, for closures that carry them.
    pub fn declared_total(&self) -> Option<Money> {
        self.counted.as_ref().map(PaymentBreakdown::total)
    }

    /// Sign of the variance, for closures that carry one.
    pub fn variance_sign(&self) -> Option<VarianceSign> {
        self.variance.map(VarianceSign::of)
    }
}

// =============================================================================
// Daily Sales Summary
// =============================================================================

/// Today's sales as computed by the server on every status query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySalesSummary {
    /// System total used as the reference at closure.
    pub total_income: Money,

    pub payment_breakdown: PaymentBreakdown,

    /// Number of formal vouchers (facturas/boletas) issued today.
    pub formal_vouchers: u32,

    /// Number of informal vouchers (notas de venta) issued today.
    pub informal_vouchers: u32,

    /// Number of payments registered today.
    pub payments: u32,
}

// =============================================================================
// Status Snapshot
// =============================================================================

/// Everything `GET /caja/estado` returns, in domain terms.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftStatusSnapshot {
    pub status: ShiftStatus,

    /// The active movement (the shift's APERTURE) when a shift is open.
    pub movement: Option<ShiftMovement>,

    pub daily_sales: DailySalesSummary,
}

impl ShiftStatusSnapshot {
    /// Starting float of the active shift, zero when none is reported.
    pub fn opening_amount(&self) -> Money {
        self.movement
            .as_ref()
            .and_then(|m| m.opening_amount)
            .unwrap_or_default()
    }
}

// =============================================================================
// History Paging
// =============================================================================

/// Inclusive calendar date range for the movement history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryFilter {
    #[ts(as = "String")]
    pub date_from: NaiveDate,
    #[ts(as = "String")]
    pub date_to: NaiveDate,
}

impl HistoryFilter {
    /// A single-day range.
    pub fn single_day(day: NaiveDate) -> Self {
        HistoryFilter {
            date_from: day,
            date_to: day,
        }
    }

    /// Returns true if `date_from <= date_to`.
    pub fn is_ordered(&self) -> bool {
        self.date_from <= self.date_to
    }

    /// Returns true if the day is inside the range (inclusive).
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.date_from <= day && day <= self.date_to
    }
}

/// One page request against the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub filter: HistoryFilter,
}

/// Pagination block returned alongside a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// A page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing_accepts_wire_and_english_names() {
        assert_eq!("ABIERTA".parse::<ShiftStatus>().unwrap(), ShiftStatus::Open);
        assert_eq!("cerrada".parse::<ShiftStatus>().unwrap(), ShiftStatus::Closed);
        assert_eq!(
            "PENDIENTE_CIERRE".parse::<ShiftStatus>().unwrap(),
            ShiftStatus::PendingClose
        );
        assert_eq!(
            "pending_close".parse::<ShiftStatus>().unwrap(),
            ShiftStatus::PendingClose
        );
        assert!("SUSPENDIDA".parse::<ShiftStatus>().is_err());

        for status in [ShiftStatus::Closed, ShiftStatus::Open, ShiftStatus::PendingClose] {
            assert_eq!(status.wire_name().parse::<ShiftStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_default_is_closed() {
        assert_eq!(ShiftStatus::default(), ShiftStatus::Closed);
        assert!(!ShiftStatus::default().is_open());
    }

    #[test]
    fn test_movement_type_parsing() {
        assert_eq!("APERTURA".parse::<MovementType>().unwrap(), MovementType::Aperture);
        assert_eq!("Cierre".parse::<MovementType>().unwrap(), MovementType::Closure);
        assert_eq!("EGRESO".parse::<MovementType>().unwrap(), MovementType::Expense);
        assert!("AJUSTE".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_payment_method_wire_keys() {
        let keys: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.wire_key()).collect();
        assert_eq!(keys, ["EFECTIVO", "YAPE", "PLIN", "TRANSFERENCIA", "TARJETA"]);
        assert_eq!("tarjeta".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
    }

    #[test]
    fn test_breakdown_total_and_any_nonzero() {
        let mut breakdown = PaymentBreakdown::default();
        assert!(!breakdown.any_nonzero());
        assert!(breakdown.total().is_zero());

        breakdown.set(PaymentMethod::Cash, Money::from_major_minor(480, 0));
        breakdown.set(PaymentMethod::Yape, Money::from_major_minor(50, 0));
        breakdown.set(PaymentMethod::Card, Money::from_major_minor(20, 0));

        assert!(breakdown.any_nonzero());
        assert_eq!(breakdown.total(), Money::from_major_minor(550, 0));
        assert_eq!(breakdown.get(PaymentMethod::Plin), Money::zero());
    }

    #[test]
    fn test_variance_and_sign() {
        let declared = Money::from_major_minor(550, 0);
        let system = Money::from_major_minor(370, 0);
        let diff = variance(declared, system);
        assert_eq!(diff, Money::from_major_minor(180, 0));
        assert_eq!(VarianceSign::of(diff), VarianceSign::Surplus);
        assert_eq!(VarianceSign::of(-diff), VarianceSign::Shortage);
        assert_eq!(VarianceSign::of(Money::zero()), VarianceSign::Balanced);
    }

    #[test]
    fn test_history_filter_range() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let filter = HistoryFilter::single_day(day);
        assert!(filter.is_ordered());
        assert!(filter.contains(day));
        assert!(!filter.contains(day.succ_opt().unwrap()));

        let reversed = HistoryFilter {
            date_from: day.succ_opt().unwrap(),
            date_to: day,
        };
        assert!(!reversed.is_ordered());
    }

    #[test]
    fn test_snapshot_opening_amount_defaults_to_zero() {
        assert!(ShiftStatusSnapshot::default().opening_amount().is_zero());
    }
}
