//! # Formatting Helpers
//!
//! Operator-facing text for amounts, dates and enum labels. Pure functions,
//! no locale lookup: the register always runs in Peruvian soles and Spanish.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::money::Money;
use crate::types::{MovementType, PaymentMethod, ShiftStatus, VarianceSign};
use crate::CURRENCY_SYMBOL;

/// Formats money with the currency symbol and thousands separators.
///
/// ```rust
/// use caja_core::format::currency;
/// use caja_core::Money;
///
/// assert_eq!(currency(Money::from_cents(123_450)), "S/ 1,234.50");
/// assert_eq!(currency(Money::from_cents(-1_200)), "-S/ 12.00");
/// ```
pub fn currency(value: Money) -> String {
    let sign = if value.is_negative() { "-" } else { "" };
    format!(
        "{}{} {}.{:02}",
        sign,
        CURRENCY_SYMBOL,
        group_thousands(value.major().unsigned_abs()),
        value.minor()
    )
}

/// Formats a variance with an explicit sign (`+S/ 180.00`, `-S/ 5.00`, `S/ 0.00`).
pub fn signed_currency(value: Money) -> String {
    if value.is_positive() {
        format!("+{}", currency(value))
    } else {
        currency(value)
    }
}

/// Plain two-decimal amount as used in form fields (`"1234.50"`).
pub fn amount(value: Money) -> String {
    value.to_string()
}

/// `dd/mm/yyyy`.
pub fn date(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}

/// `dd/mm/yyyy HH:MM` on the operator's wall clock.
///
/// The offset is passed in so this module never reads the system clock.
pub fn datetime(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%d/%m/%Y %H:%M").to_string()
}

pub fn status_label(status: ShiftStatus) -> &'static str {
    match status {
        ShiftStatus::Closed => "Caja cerrada",
        ShiftStatus::Open => "Caja abierta",
        ShiftStatus::PendingClose => "Cierre pendiente",
    }
}

pub fn movement_label(kind: MovementType) -> &'static str {
    match kind {
        MovementType::Aperture => "Apertura",
        MovementType::Closure => "Cierre",
        MovementType::Income => "Ingreso",
        MovementType::Expense => "Egreso",
    }
}

pub fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Efectivo",
        PaymentMethod::Yape => "Yape",
        PaymentMethod::Plin => "Plin",
        PaymentMethod::Transfer => "Transferencia",
        PaymentMethod::Card => "Tarjeta",
    }
}

pub fn variance_label(sign: VarianceSign) -> &'static str {
    match sign {
        VarianceSign::Surplus => "Sobrante",
        VarianceSign::Shortage => "Faltante",
        VarianceSign::Balanced => "Cuadrado",
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
