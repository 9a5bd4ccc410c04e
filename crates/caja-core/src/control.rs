//! # Shift Control
//!
//! View-model behind the register's main screen: which action is offered,
//! the open/close forms, and the live declared-vs-system arithmetic.
//!
//! ## Screen States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     What the operator sees                              │
//! │                                                                         │
//! │  CLOSED          [ Abrir caja ]                                         │
//! │                   └─► OpenForm { opening_amount: "0", notes }           │
//! │                                                                         │
//! │  OPEN            [ Cerrar caja ]                                        │
//! │                   └─► CloseForm pre-filled from today's sales:          │
//! │                        cash     = opening float + cash sales            │
//! │                        yape…    = that method's sales                   │
//! │                       live: declared total | system total | variance    │
//! │                                                                         │
//! │  PENDING_CLOSE   (badge only, no action)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Form Lifetime
//! Forms live only for one interaction. Cancel or a successful submit drops
//! them. A failed submit keeps them exactly as typed so the operator can fix
//! and resubmit without re-entering anything.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::format;
use crate::money::Money;
use crate::types::{
    variance, DailySalesSummary, PaymentBreakdown, PaymentMethod, ShiftStatus,
    ShiftStatusSnapshot, VarianceSign,
};
use crate::validation::{validate_notes, ValidationResult};

// =============================================================================
// Actions
// =============================================================================

/// The single action a status offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftAction {
    OpenShift,
    CloseShift,
}

impl ShiftAction {
    pub const fn name(&self) -> &'static str {
        match self {
            ShiftAction::OpenShift => "open shift",
            ShiftAction::CloseShift => "close shift",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            ShiftAction::OpenShift => "Abrir caja",
            ShiftAction::CloseShift => "Cerrar caja",
        }
    }
}

/// Action gating by status.
pub const fn available_action(status: ShiftStatus) -> Option<ShiftAction> {
    match status {
        ShiftStatus::Closed => Some(ShiftAction::OpenShift),
        ShiftStatus::Open => Some(ShiftAction::CloseShift),
        ShiftStatus::PendingClose => None,
    }
}

fn require_action(status: ShiftStatus, action: ShiftAction) -> CoreResult<()> {
    if available_action(status) == Some(action) {
        Ok(())
    } else {
        Err(CoreError::ActionUnavailable {
            action: action.name(),
            status,
        })
    }
}

// =============================================================================
// Submit Payloads
// =============================================================================

/// What the store needs to open a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpenShiftRequest {
    pub opening_amount: Money,
    pub notes: Option<String>,
}

/// What the store needs to close a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseShiftRequest {
    pub counted: PaymentBreakdown,
    pub notes: Option<String>,
}

// =============================================================================
// Open Form
// =============================================================================

/// Form state for opening a shift. Fields hold raw operator text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpenForm {
    pub opening_amount: String,
    pub notes: String,
}

impl Default for OpenForm {
    fn default() -> Self {
        OpenForm {
            opening_amount: "0".to_string(),
            notes: String::new(),
        }
    }
}

impl OpenForm {
    /// Opening amount as money; non-numeric text counts as zero.
    pub fn amount(&self) -> Money {
        Money::parse_input(&self.opening_amount)
    }

    /// Builds the submit payload. Only the notes can fail validation; the
    /// amount is never blocked here.
    pub fn to_request(&self) -> ValidationResult<OpenShiftRequest> {
        Ok(OpenShiftRequest {
            opening_amount: self.amount(),
            notes: validate_notes(Some(&self.notes))?,
        })
    }
}

// =============================================================================
// Close Form
// =============================================================================

/// Form state for closing a shift.
///
/// ## Invariants
/// - `declared_total() == counted().total()`
/// - `variance() == declared_total() - system_total()`, in exact cents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseForm {
    /// Raw text per method, in `PaymentMethod::ALL` order.
    fields: [String; 5],
    pub notes: String,
    /// Pre-filled values, kept to show "expected" next to each field.
    expected: PaymentBreakdown,
    system_total: Money,
}

impl CloseForm {
    /// Builds the form with every bucket pre-filled from today's sales.
    ///
    /// ## Pre-fill Rule
    /// ```text
    /// opening float  = 200.00       sales EFECTIVO = 300.00
    ///                                     YAPE     =  50.00
    ///                                     TARJETA  =  20.00
    /// ─────────────────────────────────────────────────────
    /// cash field     = 200 + 300 = 500.00
    /// yape field     =  50.00   plin = 0.00   transfer = 0.00   card = 20.00
    /// ```
    pub fn prefill(opening_amount: Money, sales: &DailySalesSummary) -> Self {
        let mut expected = sales.payment_breakdown;
        expected.cash += opening_amount;

        let fields = PaymentMethod::ALL.map(|method| format::amount(expected.get(method)));

        CloseForm {
            fields,
            notes: String::new(),
            expected,
            system_total: sales.total_income,
        }
    }

    /// Raw text of one field.
    pub fn field(&self, method: PaymentMethod) -> &str {
        &self.fields[method_index(method)]
    }

    /// Replaces the text of one field. Nothing is rewritten.
    pub fn set_field(&mut self, method: PaymentMethod, text: impl Into<String>) {
        self.fields[method_index(method)] = text.into();
    }

    /// Pre-filled value of one field.
    pub fn expected(&self, method: PaymentMethod) -> Money {
        self.expected.get(method)
    }

    /// Counted buckets, each field coerced to money.
    pub fn counted(&self) -> PaymentBreakdown {
        let mut counted = PaymentBreakdown::default();
        for method in PaymentMethod::ALL {
            counted.set(method, Money::parse_input(self.field(method)));
        }
        counted
    }

    pub fn declared_total(&self) -> Money {
        self.counted().total()
    }

    /// `DailySalesSummary.total_income` at the time the form was opened.
    pub fn system_total(&self) -> Money {
        self.system_total
    }

    pub fn variance(&self) -> Money {
        variance(self.declared_total(), self.system_total)
    }

    pub fn variance_sign(&self) -> VarianceSign {
        VarianceSign::of(self.variance())
    }

    /// Builds the submit payload. A mismatch never blocks submission.
    pub fn to_request(&self) -> ValidationResult<CloseShiftRequest> {
        Ok(CloseShiftRequest {
            counted: self.counted(),
            notes: validate_notes(Some(&self.notes))?,
        })
    }
}

const fn method_index(method: PaymentMethod) -> usize {
    match method {
        PaymentMethod::Cash => 0,
        PaymentMethod::Yape => 1,
        PaymentMethod::Plin => 2,
        PaymentMethod::Transfer => 3,
        PaymentMethod::Card => 4,
    }
}

// =============================================================================
// Shift Control
// =============================================================================

/// Transient UI state of the control screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftControl {
    open_form: Option<OpenForm>,
    close_form: Option<CloseForm>,
}

impl ShiftControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows the open form (`opening_amount = "0"`).
    pub fn begin_open(&mut self, status: ShiftStatus) -> CoreResult<&mut OpenForm> {
        require_action(status, ShiftAction::OpenShift)?;
        self.close_form = None;
        Ok(self.open_form.insert(OpenForm::default()))
    }

    /// Shows the close form pre-filled from the snapshot.
    pub fn begin_close(&mut self, snapshot: &ShiftStatusSnapshot) -> CoreResult<&mut CloseForm> {
        require_action(snapshot.status, ShiftAction::CloseShift)?;
        self.open_form = None;
        Ok(self
            .close_form
            .insert(CloseForm::prefill(snapshot.opening_amount(), &snapshot.daily_sales)))
    }

    /// Drops whichever form is showing.
    pub fn cancel(&mut self) {
        self.open_form = None;
        self.close_form = None;
    }

    pub fn open_form(&self) -> Option<&OpenForm> {
        self.open_form.as_ref()
    }

    pub fn close_form(&self) -> Option<&CloseForm> {
        self.close_form.as_ref()
    }

    /// Applies the outcome of an open submit: success drops the form,
    /// failure keeps it untouched.
    pub fn finish_open<T, E>(&mut self, outcome: &Result<T, E>) {
        if outcome.is_ok() {
            self.open_form = None;
        }
    }

    /// Same as [`finish_open`](Self::finish_open) for the close form.
    pub fn finish_close<T, E>(&mut self, outcome: &Result<T, E>) {
        if outcome.is_ok() {
            self.close_form = None;
        }
    }

    /// Builds what to render from the latest snapshot, the store error and
    /// the store's loading flag.
    pub fn view(
        &self,
        snapshot: Option<&ShiftStatusSnapshot>,
        error: Option<&str>,
        loading: bool,
    ) -> ControlView {
        let status = snapshot.map(|s| s.status);
        let action = status.and_then(available_action).map(|action| ActionButton {
            action,
            label: action.label().to_string(),
            enabled: !loading,
        });

        ControlView {
            status,
            badge: status
                .map(format::status_label)
                .unwrap_or("Consultando estado…")
                .to_string(),
            action,
            daily_sales: snapshot.map(|s| s.daily_sales.clone()),
            opening_amount: snapshot.and_then(|s| s.movement.as_ref()?.opening_amount),
            open_form: self.open_form.clone(),
            close_form: self.close_form.as_ref().map(CloseFormView::from),
            error: error.map(str::to_string),
            loading,
        }
    }
}

// =============================================================================
// Render Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActionButton {
    pub action: ShiftAction,
    pub label: String,
    /// False while any request is in flight.
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseFieldView {
    pub method: PaymentMethod,
    pub label: String,
    pub text: String,
    pub expected: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CloseFormView {
    pub fields: Vec<CloseFieldView>,
    pub notes: String,
    pub declared_total: Money,
    pub system_total: Money,
    pub variance: Money,
    pub variance_sign: VarianceSign,
}

impl From<&CloseForm> for CloseFormView {
    fn from(form: &CloseForm) -> Self {
        CloseFormView {
            fields: PaymentMethod::ALL
                .into_iter()
                .map(|method| CloseFieldView {
                    method,
                    label: format::method_label(method).to_string(),
                    text: form.field(method).to_string(),
                    expected: form.expected(method),
                })
                .collect(),
            notes: form.notes.clone(),
            declared_total: form.declared_total(),
            system_total: form.system_total(),
            variance: form.variance(),
            variance_sign: form.variance_sign(),
        }
    }
}

/// Everything the control screen renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ControlView {
    /// `None` until the first status fetch lands.
    pub status: Option<ShiftStatus>,
    pub badge: String,
    /// `None` for PENDING_CLOSE and before the first fetch.
    pub action: Option<ActionButton>,
    pub daily_sales: Option<DailySalesSummary>,
    pub opening_amount: Option<Money>,
    pub open_form: Option<OpenForm>,
    pub close_form: Option<CloseFormView>,
    /// Shown next to the action button.
    pub error: Option<String>,
    pub loading: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
