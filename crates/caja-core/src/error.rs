//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                          │
//! │  ├── CoreError        - View-model rule violations                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caja-client errors (separate crate)                                   │
//! │  └── ClientError      - Network, server envelope, config failures      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → store.error string  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::operation::OperationKind;
use crate::types::ShiftStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the pure shift logic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The requested action is not offered for the current status.
    ///
    /// ## When This Occurs
    /// ```text
    /// status = OPEN           → "open shift" requested   → ActionUnavailable
    /// status = CLOSED         → "close shift" requested  → ActionUnavailable
    /// status = PENDING_CLOSE  → any action requested     → ActionUnavailable
    /// ```
    #[error("Action '{action}' is not available while the register is {status}")]
    ActionUnavailable {
        action: &'static str,
        status: ShiftStatus,
    },

    /// History filter with `date_from` after `date_to`.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },

    /// Requested history page outside `1..=total_pages`.
    #[error("Page {requested} is out of range (1-{total_pages})")]
    PageOutOfRange { requested: u32, total_pages: u32 },

    /// An operation was requested while a conflicting request is in flight.
    ///
    /// ## When This Occurs
    /// - The same operation is already pending (double submit)
    /// - Opening while a close is pending, or the other way round
    #[error("Cannot start {requested} while {in_flight} is in progress")]
    Busy {
        requested: OperationKind,
        in_flight: OperationKind,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Amount must be zero or more.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric amount, malformed date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
