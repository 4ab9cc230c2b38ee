//! Factor-specific authentication strategies.
//!
//! The factor set is closed - one-time code, SMS code, push approval - so
//! polymorphism is a plain enum rather than open-ended dynamic dispatch.
//! A strategy knows its method tag and, for the code-based factors, how to
//! package a submitted code into a transport call. It holds no state across
//! calls.
//!
//! Otp and Sms are behaviorally identical at submission time; they differ
//! only in their tag and in the enrollment metadata consumed elsewhere.
//! Push never contacts the transport at all - its outcome is produced
//! entirely by the decision event channel.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::credential::Credential;
use crate::error::{ServerError, VerifyError};
use crate::transport::{Transport, VERIFY_OTP_PATH};

/// The authentication factor a step verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// One-time code from an authenticator app.
    Otp,
    /// One-time code delivered by SMS.
    Sms,
    /// Push approval on an enrolled device.
    Push,
}

impl Method {
    /// The wire tag for this method.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Otp => "otp",
            Method::Sms => "sms",
            Method::Push => "push",
        }
    }

    /// Whether verification of this method consumes a user-entered code.
    pub fn requires_code(self) -> bool {
        matches!(self, Method::Otp | Method::Sms)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "otp" => Ok(Method::Otp),
            "sms" => Ok(Method::Sms),
            "push" => Ok(Method::Push),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Parse failure for a method tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown authentication method `{0}`")]
pub struct UnknownMethod(pub String);

/// Expected shape of a user-entered one-time code.
///
/// Fixed-length numeric. The length is configuration, not a constant:
/// deployments differ, so it travels with the transaction rather than
/// being hard-coded at the validation site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFormat {
    length: usize,
}

impl CodeFormat {
    /// The most common deployment: six digits.
    pub const DEFAULT_LENGTH: usize = 6;

    /// A format accepting codes of exactly `length` digits.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Expected code length.
    pub fn length(self) -> usize {
        self.length
    }

    /// Check a user-entered code against this format.
    pub fn validate(self, code: &str) -> Result<(), VerifyError> {
        if code.len() == self.length && code.bytes().all(|b| b.is_ascii_digit()) {
            Ok(())
        } else {
            Err(VerifyError::InvalidOtpFormat)
        }
    }
}

impl Default for CodeFormat {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LENGTH)
    }
}

/// Submission policy for one factor of one transaction.
///
/// Pure per call: holds only the method tag plus the credential and
/// transport handle needed to submit proof.
#[derive(Clone)]
pub struct AuthStrategy {
    method: Method,
    credential: Credential,
    transport: Arc<dyn Transport>,
}

impl AuthStrategy {
    /// Create a strategy for `method` submitting on behalf of `credential`.
    pub fn new(method: Method, credential: Credential, transport: Arc<dyn Transport>) -> Self {
        Self {
            method,
            credential,
            transport,
        }
    }

    /// The method this strategy verifies.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Submit a validated one-time code to the server.
    ///
    /// `Ok(())` acknowledges receipt of the submission; the accept/reject
    /// decision still arrives later on the event channel. Push involves no
    /// submission, so for a push strategy this returns `Ok(())` without
    /// touching the transport.
    pub async fn submit(&self, code: &str) -> Result<(), ServerError> {
        if !self.method.requires_code() {
            return Ok(());
        }

        tracing::debug!(method = %self.method, "submitting one-time code");
        self.transport
            .post(
                VERIFY_OTP_PATH,
                &self.credential,
                json!({ "code": code, "type": "manual_input" }),
            )
            .await
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStrategy")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
