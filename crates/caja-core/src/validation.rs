//! # Validation Module
//!
//! Input checks for the shift forms and the history filter.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form fields (this crate)                                     │
//! │  ├── Amount text → Money (coerced to 0 for live totals)                │
//! │  └── Notes length, date order, page bounds                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Store (caja-client)                                          │
//! │  └── Advisory only: a negative opening amount is logged, not blocked   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend (authoritative)                                      │
//! │  ├── "a shift is already open" / "no open shift"                       │
//! │  └── amount rules, reconciliation flags                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are deliberately NOT hard-blocked here: the backend decides.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::HistoryFilter;
use crate::{MAX_NOTES_LEN, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

/// Checks that an amount is zero or more.
///
/// ```rust
/// use caja_core::validation::validate_non_negative;
/// use caja_core::Money;
///
/// assert!(validate_non_negative("opening amount", Money::zero()).is_ok());
/// assert!(validate_non_negative("opening amount", Money::from_cents(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Normalizes free-text notes ("observaciones").
///
/// ## Rules
/// - Whitespace-only notes become `None` (the field is omitted on the wire)
/// - At most `MAX_NOTES_LEN` characters after trimming
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        });
    }

    Ok(Some(notes.to_string()))
}

// =============================================================================
// Date Validators
// =============================================================================

/// Parses a date typed as `YYYY-MM-DD` or `dd/mm/yyyy`.
pub fn parse_date(field: &str, text: &str) -> ValidationResult<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or dd/mm/yyyy".to_string(),
        })
}

/// Checks that the history range is ordered.
pub fn validate_date_range(filter: &HistoryFilter) -> ValidationResult<()> {
    if !filter.is_ordered() {
        return Err(ValidationError::InvalidFormat {
            field: "date range".to_string(),
            reason: format!(
                "start {} is after end {}",
                filter.date_from, filter.date_to
            ),
        });
    }
    Ok(())
}

// =============================================================================
// Paging Validators
// =============================================================================

/// Checks a history page size (1..=MAX_PAGE_SIZE).
pub fn validate_page_size(size: u32) -> ValidationResult<()> {
    if size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page size".to_string(),
        });
    }
    if size > MAX_PAGE_SIZE {
        return Err(ValidationError::InvalidFormat {
            field: "page size".to_string(),
            reason: format!("must be at most {}", MAX_PAGE_SIZE),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("amount", Money::from_cents(1)).is_ok());
        assert!(validate_non_negative("amount", Money::zero()).is_ok());
        assert_eq!(
            validate_non_negative("amount", Money::from_cents(-100)),
            Err(ValidationError::MustBeNonNegative {
                field: "amount".to_string()
            })
        );
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes(None).unwrap(), None);
        assert_eq!(validate_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_notes(Some("  faltó sencillo ")).unwrap(),
            Some("faltó sencillo".to_string())
        );
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LEN))).is_ok());
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LEN + 1))).is_err());
    }

    #[test]
    fn test_parse_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(parse_date("from", "2024-01-31").unwrap(), expected);
        assert_eq!(parse_date("from", "31/01/2024").unwrap(), expected);
        assert!(matches!(
            parse_date("from", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(parse_date("from", "2024-02-30").is_err());
        assert!(parse_date("from", "ayer").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(validate_date_range(&HistoryFilter { date_from: a, date_to: b }).is_ok());
        assert!(validate_date_range(&HistoryFilter::single_day(a)).is_ok());
        assert!(validate_date_range(&HistoryFilter { date_from: b, date_to: a }).is_err());
    }

    #[test]
    fn test_validate_page_size() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }
}
