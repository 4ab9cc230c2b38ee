//! Testing utilities for the verification core.
//!
//! # Feature Flag
//!
//! This module is available to this crate's own tests and to downstream
//! crates via the `testing` feature:
//!
//! ```toml
//! [dev-dependencies]
//! mfa-client = { version = "0.1", features = ["testing"] }
//! ```
//!
//! [`MockTransport`] stands in for the HTTP transport: it records every
//! call, can be scripted to fail with a given server error, and can run a
//! hook synchronously inside `post` - which is how tests prove that hub
//! subscriptions are taken before any network action.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::credential::Credential;
use crate::error::ServerError;
use crate::transport::Transport;

/// One recorded `post` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The path the call targeted.
    pub path: String,
    /// The bearer token the call was authorized with.
    pub token: String,
    /// The JSON body.
    pub body: Value,
}

type PostHook = Box<dyn Fn() + Send + Sync>;

/// A transport double that records calls instead of performing IO.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<RecordedCall>>,
    fail_with: Mutex<Option<ServerError>>,
    on_post: Mutex<Option<PostHook>>,
}

impl MockTransport {
    /// A transport that accepts every submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that rejects every submission with `error`.
    pub fn failing(error: ServerError) -> Self {
        let transport = Self::new();
        *transport.fail_with.lock().unwrap() = Some(error);
        transport
    }

    /// Run `hook` synchronously inside every subsequent `post`, after the
    /// call is recorded and before the scripted outcome is returned.
    pub fn on_post(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_post.lock().unwrap() = Some(Box::new(hook));
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls recorded so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        path: &str,
        credential: &Credential,
        body: Value,
    ) -> Result<(), ServerError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            token: credential.token().to_string(),
            body,
        });

        if let Some(hook) = &*self.on_post.lock().unwrap() {
            hook();
        }

        match &*self.fail_with.lock().unwrap() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
