//! Client configuration loaded from environment variables.

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use crate::strategy::CodeFormat;

/// Configuration for the verification client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the verification server, e.g. `https://tenant.example.com`.
    pub base_url: String,
    /// Expected length of user-entered one-time codes.
    pub otp_code_length: usize,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `MFA_BASE_URL` (required) and `MFA_OTP_CODE_LENGTH`
    /// (optional, defaults to six digits). A `.env` file is honored in
    /// development.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            base_url: env::var("MFA_BASE_URL").context("MFA_BASE_URL must be set")?,
            otp_code_length: env::var("MFA_OTP_CODE_LENGTH")
                .unwrap_or_else(|_| CodeFormat::DEFAULT_LENGTH.to_string())
                .parse()
                .context("MFA_OTP_CODE_LENGTH must be a valid number")?,
        })
    }

    /// The one-time code format this configuration implies.
    pub fn code_format(&self) -> CodeFormat {
        CodeFormat::new(self.otp_code_length)
    }
}
