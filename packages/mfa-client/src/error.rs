//! Structured error types for the verification core.
//!
//! `VerifyError` provides pattern-matchable failures instead of generic
//! `anyhow::Error`. The two validation variants are produced locally and
//! never reach the transport; `Server` wraps whatever the server reported,
//! verbatim, with no retry and no reinterpretation.
//!
//! # The Error Boundary Rule
//!
//! > **No `anyhow::Error` ever crosses the verification surface.**
//!
//! - `anyhow` stays at the application boundary (configuration loading)
//! - `VerifyError` is the only error type the step and strategy emit
//!
//! Every variant carries a stable, machine-readable code via
//! [`VerifyError::error_code`], so callers can branch without string-matching
//! display output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::Method;

/// A failure reported by the server (or the transport in front of it)
/// while submitting proof of possession.
///
/// Carried verbatim to the caller: `error_code` is the server's stable
/// identifier, `message` is human-readable, `status_code` is the HTTP
/// status (0 when the request never reached the server).
///
/// The serde form matches the wire schema (`errorCode` / `statusCode`).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ServerError {
    /// Stable machine-readable identifier, e.g. `invalid_otp`.
    #[serde(rename = "errorCode")]
    pub error_code: String,

    /// Human-readable description, suitable for display.
    pub message: String,

    /// HTTP status reported by the server; 0 when the request failed
    /// before a response arrived.
    #[serde(rename = "statusCode", default)]
    pub status_code: u16,
}

impl ServerError {
    /// A failure that happened before any server response arrived
    /// (connection refused, DNS, timeout at the socket level).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            error_code: "connection_error".into(),
            message: message.into(),
            status_code: 0,
        }
    }
}

/// Failures of a single `verify` call.
///
/// The two validation variants are terminal before any network action: the
/// caller must resupply input. `Server` is terminal for the submission
/// phase: no decision is pending after it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// A required input field was missing or empty.
    #[error("required field `{field}` is missing or empty")]
    FieldRequired {
        /// Name of the offending field, e.g. `otpCode`.
        field: &'static str,
    },

    /// The one-time code does not match the expected format.
    #[error("one-time code does not match the expected format")]
    InvalidOtpFormat,

    /// The server rejected the submission.
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl VerifyError {
    /// Stable machine-readable code for this failure.
    pub fn error_code(&self) -> &str {
        match self {
            VerifyError::FieldRequired { .. } => "field_required",
            VerifyError::InvalidOtpFormat => "invalid_otp_format",
            VerifyError::Server(err) => &err.error_code,
        }
    }
}

/// Failures of transaction-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// A verification step was requested for a method the transaction
    /// does not declare.
    #[error("method `{method}` is not available on this transaction")]
    MethodNotAvailable {
        /// The undeclared method.
        method: Method,
    },
}
