//! # Operation State
//!
//! Per-operation request tracking for the shift store.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One state machine per OperationKind                    │
//! │                                                                         │
//! │   ┌──────┐  begin()   ┌─────────┐  complete(token)  ┌───────────┐      │
//! │   │ Idle │ ─────────► │ Pending │ ────────────────► │ Succeeded │      │
//! │   └──────┘            └────┬────┘                   └───────────┘      │
//! │       ▲                    │ fail(token, msg)                           │
//! │       │                    ▼                                            │
//! │       │               ┌────────┐                                        │
//! │       └── begin() ────│ Failed │  (Succeeded/Failed also accept begin)  │
//! │                       └────────┘                                        │
//! │                                                                         │
//! │  ADMISSION RULES                                                        │
//! │  • begin(kind) while kind is Pending            → Busy                  │
//! │  • begin(open/close) while the other is Pending → Busy                  │
//! │  • supersede(kind) always starts; the older token goes stale            │
//! │  • complete/fail with a stale token             → ignored (false)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request gets a [`RequestToken`]: a monotonic sequence number for the
//! staleness check and a UUID used as the `X-Request-Id` header and in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Operation Kind
// =============================================================================

/// The store operations that touch the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    FetchStatus,
    OpenShift,
    CloseShift,
    FetchHistory,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::FetchStatus,
        OperationKind::OpenShift,
        OperationKind::CloseShift,
        OperationKind::FetchHistory,
    ];

    /// Returns true for operations that change server state.
    pub const fn is_mutation(&self) -> bool {
        matches!(self, OperationKind::OpenShift | OperationKind::CloseShift)
    }

    const fn index(&self) -> usize {
        match self {
            OperationKind::FetchStatus => 0,
            OperationKind::OpenShift => 1,
            OperationKind::CloseShift => 2,
            OperationKind::FetchHistory => 3,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::FetchStatus => write!(f, "fetch_status"),
            OperationKind::OpenShift => write!(f, "open_shift"),
            OperationKind::CloseShift => write!(f, "close_shift"),
            OperationKind::FetchHistory => write!(f, "fetch_history"),
        }
    }
}

// =============================================================================
// Request Token
// =============================================================================

/// Identity of one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RequestToken {
    pub kind: OperationKind,
    /// Monotonic across all kinds of one table.
    #[ts(type = "number")]
    pub seq: u64,
    /// Correlation id sent as `X-Request-Id`.
    #[ts(as = "String")]
    pub id: Uuid,
}

// =============================================================================
// Operation State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OperationState {
    #[default]
    Idle,
    Pending { request: RequestToken },
    Succeeded,
    Failed { message: String },
}

impl OperationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, OperationState::Pending { .. })
    }

    fn token(&self) -> Option<&RequestToken> {
        match self {
            OperationState::Pending { request } => Some(request),
            _ => None,
        }
    }
}

// =============================================================================
// Operation Table
// =============================================================================

/// The state of every operation kind, plus the token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperationTable {
    states: [OperationState; 4],
    #[ts(type = "number")]
    next_seq: u64,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of one operation kind.
    pub fn state(&self, kind: OperationKind) -> &OperationState {
        &self.states[kind.index()]
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.state(kind).is_pending()
    }

    /// True while any request is in flight. Drives the disabled buttons.
    pub fn any_pending(&self) -> bool {
        self.states.iter().any(OperationState::is_pending)
    }

    /// Starts an operation, enforcing the admission rules.
    pub fn begin(&mut self, kind: OperationKind) -> CoreResult<RequestToken> {
        if self.is_pending(kind) {
            return Err(CoreError::Busy {
                requested: kind,
                in_flight: kind,
            });
        }

        if kind.is_mutation() {
            if let Some(other) = OperationKind::ALL
                .into_iter()
                .find(|other| other.is_mutation() && *other != kind && self.is_pending(*other))
            {
                return Err(CoreError::Busy {
                    requested: kind,
                    in_flight: other,
                });
            }
        }

        Ok(self.start(kind))
    }

    /// Starts an operation unconditionally; a pending request of the same
    /// kind becomes stale.
    pub fn supersede(&mut self, kind: OperationKind) -> RequestToken {
        self.start(kind)
    }

    /// Marks the request as succeeded. Returns false for a stale token.
    pub fn complete(&mut self, token: &RequestToken) -> bool {
        self.finish(token, OperationState::Succeeded)
    }

    /// Marks the request as failed. Returns false for a stale token.
    pub fn fail(&mut self, token: &RequestToken, message: impl Into<String>) -> bool {
        self.finish(
            token,
            OperationState::Failed {
                message: message.into(),
            },
        )
    }

    /// Returns true if the token is the one currently pending for its kind.
    pub fn is_current(&self, token: &RequestToken) -> bool {
        self.state(token.kind).token() == Some(token)
    }

    fn start(&mut self, kind: OperationKind) -> RequestToken {
        self.next_seq += 1;
        let token = RequestToken {
            kind,
            seq: self.next_seq,
            id: Uuid::new_v4(),
        };
        self.states[kind.index()] = OperationState::Pending { request: token };
        token
    }

    fn finish(&mut self, token: &RequestToken, next: OperationState) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.states[token.kind.index()] = next;
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
