//! # Client Error Types
//!
//! Error types for the REST client, the configuration layer and the store.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Network        │  │  Server { code, msg }   │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Http { status, msg }   │ │
//! │  │  ConfigLoad/Save│  │  Decode         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │     Local       │  │  Concurrency    │                              │
//! │  │  Validation     │  │  Busy           │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every store failure ends up as one line of text for the operator:
//! [`ClientError::user_message`]. Backend messages go through verbatim.

use thiserror::Error;

use caja_core::{CoreError, OperationKind, ValidationError};

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The backend could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// No response within the configured request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The response body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// The backend answered with an envelope whose `code` is not 1.
    ///
    /// ## When This Occurs
    /// ```text
    /// POST /caja/abrir  while a shift is OPEN → { code: 0, message: "Ya existe una caja abierta" }
    /// POST /caja/cerrar while CLOSED          → { code: 0, message: "No hay caja abierta" }
    /// ```
    #[error("{message}")]
    Server { code: i64, message: String },

    /// Non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An operation of a conflicting kind is already in flight.
    #[error("Another request is in progress ({0})")]
    Busy(OperationKind),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Busy { in_flight, .. } => ClientError::Busy(in_flight),
            CoreError::Validation(inner) => ClientError::Validation(inner),
            other => ClientError::Validation(ValidationError::InvalidFormat {
                field: "request".to_string(),
                reason: other.to_string(),
            }),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Maps a reqwest failure, turning timeouts into [`ClientError::Timeout`].
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(timeout_secs)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }

    /// Returns true if the backend was never reached or never answered.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }

    /// Returns true if the backend answered with a failure.
    pub fn is_server(&self) -> bool {
        matches!(self, ClientError::Server { .. } | ClientError::Http { .. })
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    /// Text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Http { message, .. } if !message.is_empty() => message.clone(),
            ClientError::Http { status, .. } => format!("Error del servidor ({})", status),
            ClientError::Network(_) => "No se pudo conectar con el servidor".to_string(),
            ClientError::Timeout(secs) => {
                format!("El servidor no respondió en {} segundos", secs)
            }
            ClientError::Decode(_) => "Respuesta inesperada del servidor".to_string(),
            ClientError::Busy(_) => "Espere a que termine la operación en curso".to_string(),
            other => other.to_string(),
        }
    }
}
