//! # mfa-client
//!
//! The verification core of a multi-factor authentication client: given an
//! in-progress login transaction and a chosen factor - one-time code, SMS
//! code, or push approval - drive the factor's proof-of-possession protocol
//! to a terminal accept/reject decision.
//!
//! ## Architecture
//!
//! Two independently-arriving asynchronous signals have to be coordinated:
//! the request/response exchange that submits proof, and the decision the
//! server pushes out-of-band. The core keeps them on separate, explicit
//! channels and correlates the push side by transaction identity.
//!
//! ```text
//! caller ── verify(request) ──► VerificationStep
//!                                   │ validate
//!                                   │ subscribe_once ×2   (before any IO)
//!                                   ▼
//!                  AuthStrategy ── post api/verify-otp ──► server
//!                                   │
//!              Result ◄─────────────┘ (submission outcome)
//!
//! server push ──► LoginEventBus ──► DecisionHub(accepted)┐ first match
//!                               └─► DecisionHub(rejected)┘ wins
//!                                   │
//!              StepEvent::AuthResponse + PendingDecision (decision outcome)
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Decisions are scoped** - an event only ever reaches subscribers
//!    whose transaction identity matches its `txId`
//! 2. **Subscribe before submit** - hub subscriptions exist before any
//!    transport call, so a synchronously-delivered decision is never missed
//! 3. **One decision per call** - hub subscriptions are one-shot and are
//!    released at every terminal state
//! 4. **Two channels, two meanings** - the submission `Result` acknowledges
//!    receipt of proof; only the decision channel carries accept/reject
//!
//! ## Example
//!
//! ```ignore
//! use mfa_client::{
//!     HttpTransport, LoginEventBus, Method, Transaction, VerifyRequest,
//! };
//! use std::sync::Arc;
//!
//! // The bus is fed by whatever socket layer receives server pushes.
//! let bus = LoginEventBus::new();
//! let transport = Arc::new(HttpTransport::new("https://tenant.example.com"));
//!
//! let transaction = Transaction::builder(tx_id, bearer_token)
//!     .with_methods([Method::Otp, Method::Push])
//!     .build(bus.clone(), transport);
//!
//! let step = transaction.step(Method::Otp)?;
//! let mut events = step.subscribe();
//!
//! // Submission phase: the Result acknowledges receipt of the proof.
//! let pending = step.verify(VerifyRequest::code("123456")).await?;
//!
//! // Decision phase: accept/reject arrives out-of-band.
//! if let Some(response) = pending.decision().await {
//!     println!("accepted: {}", response.accepted);
//! }
//! ```

// Core modules
mod config;
mod credential;
mod enrollment;
mod error;
mod events;
mod hub;
mod step;
mod strategy;
mod transaction;
mod transport;

// Testing utilities (feature-gated)
#[cfg(any(test, feature = "testing"))]
pub mod testing;

// End-to-end scenarios (test-only)
#[cfg(test)]
mod integration_tests;

// Re-export configuration
pub use config::ClientConfig;

// Re-export credential and enrollment data
pub use credential::Credential;
pub use enrollment::Enrollment;

// Re-export error types
pub use error::{ServerError, TransactionError, VerifyError};

// Re-export the event source
pub use events::{LoginEvent, LoginEventBus};

// Re-export correlation hubs
pub use hub::{DecisionHub, DecisionKind, DecisionSubscription};

// Re-export the controller surface
pub use step::{
    AuthResponse, PendingDecision, StepEvent, StepState, VerificationStep, VerifyRequest,
};

// Re-export strategies
pub use strategy::{AuthStrategy, CodeFormat, Method, UnknownMethod};

// Re-export transaction types
pub use transaction::{Transaction, TransactionBuilder, TransactionState, TxId};

// Re-export the transport seam
pub use transport::{HttpTransport, Transport, VERIFY_OTP_PATH};

// Re-export commonly used external types
pub use async_trait::async_trait;
