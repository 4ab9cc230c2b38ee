//! Transport contract and the production HTTP implementation.
//!
//! The verification core talks to the server through the [`Transport`]
//! trait: a single authenticated `post` whose `Ok(())` acknowledges
//! *receipt* of a submission, never the final authentication decision (that
//! arrives out-of-band on the event source). The trait is injected, so the
//! core is testable against a recorded double and the production client is
//! swappable.
//!
//! [`HttpTransport`] is the reqwest-backed implementation: bearer
//! authorization from the [`Credential`], JSON bodies, and non-2xx
//! responses decoded into [`ServerError`] so server-reported failures
//! propagate verbatim.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::ServerError;

/// Endpoint for one-time code submission.
pub const VERIFY_OTP_PATH: &str = "api/verify-otp";

/// Authenticated request channel to the verification server.
///
/// Stateless from the core's perspective: no connection affinity, no
/// retry. Retry/backoff policy belongs to an outer layer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to `path` on behalf of `credential`.
    ///
    /// `Ok(())` means the server accepted the submission for processing.
    async fn post(
        &self,
        path: &str,
        credential: &Credential,
        body: Value,
    ) -> Result<(), ServerError>;
}

/// Production transport over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a transport from client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        path: &str,
        credential: &Credential,
        body: Value,
    ) -> Result<(), ServerError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "submitting verification request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.token())
            .json(&body)
            .send()
            .await
            .map_err(|err| ServerError::transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Prefer the server's own error body; fall back to the status line
        // when the body is not in the expected shape.
        match response.json::<ServerError>().await {
            Ok(mut err) => {
                if err.status_code == 0 {
                    err.status_code = status.as_u16();
                }
                Err(err)
            }
            Err(_) => Err(ServerError {
                error_code: "invalid_response".into(),
                message: format!("server returned {status} with an undecodable body"),
                status_code: status.as_u16(),
            }),
        }
    }
}
