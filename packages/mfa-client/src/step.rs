//! The verification step controller.
//!
//! A step composes one [`AuthStrategy`] with the owning transaction's two
//! decision hubs and drives a single factor to a terminal accept/reject
//! decision. The two phases report on two explicit channels:
//!
//! - the **submission phase** (validate + submit proof) reports through the
//!   `Result` of [`VerificationStep::verify`]; failures are additionally
//!   emitted as [`StepEvent::Error`] for observers that watch the step
//!   instead of holding the call site
//! - the **decision phase** (the server's accept/reject, pushed
//!   out-of-band) reports only through [`StepEvent::AuthResponse`] and the
//!   one-shot [`PendingDecision`] handle - never through the submission
//!   `Result`
//!
//! # Ordering
//!
//! Hub subscriptions are taken strictly before any transport call. A fast
//! server (or an in-process transport in tests) may publish the decision
//! synchronously inside the submission; receivers created beforehand still
//! observe it. This is the one ordering invariant `verify` must preserve.
//!
//! # Lifecycle of one `verify` call
//!
//! ```text
//! Idle ─ validate ─► Failed (terminal, nothing subscribed)
//!          │
//!          ▼
//!      Subscribed ─ submit(otp/sms) ─► SubmitFailed (terminal, subscriptions released)
//!          │              │
//!          │ (push)       ▼
//!          └─────────► Pending ─ first hub event ─► Resolved (terminal, one-shot)
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};

use crate::error::VerifyError;
use crate::hub::DecisionHub;
use crate::strategy::{AuthStrategy, CodeFormat, Method};
use crate::transaction::TxId;

/// Capacity of the per-step event channel. Steps emit at most one error
/// and one response per verify call; headroom covers repeated attempts.
const STEP_EVENT_CAPACITY: usize = 16;

/// The terminal decision of a verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Whether the login was accepted.
    pub accepted: bool,
    /// Signature issued for an accepted login; absent on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Observable output of a verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// A submission-phase failure (validation or server rejection of the
    /// proof). Terminal for that call; no decision is pending after it.
    Error(VerifyError),
    /// The terminal accept/reject decision.
    AuthResponse(AuthResponse),
}

/// Persistable state of a step: just the method selection.
///
/// Subscription state is ephemeral and never serialized;
/// pairing this with the owning transaction's snapshot is enough to
/// resume "which step was active" after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    /// The method this step verifies.
    pub method: Method,
}

/// Handle resolving to the decision of one `verify` call.
///
/// Dropping the handle does not cancel resolution - observers subscribed
/// to the step still receive the [`StepEvent::AuthResponse`].
pub struct PendingDecision {
    decided: oneshot::Receiver<AuthResponse>,
}

impl PendingDecision {
    /// Wait for the terminal decision.
    ///
    /// Returns `None` if the event source closed before a decision
    /// arrived for this transaction.
    pub async fn decision(self) -> Option<AuthResponse> {
        self.decided.await.ok()
    }
}

impl std::fmt::Debug for PendingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDecision").finish_non_exhaustive()
    }
}

/// Drives one authentication factor to a terminal decision.
pub struct VerificationStep {
    strategy: AuthStrategy,
    tx_id: TxId,
    accepted: DecisionHub,
    rejected: DecisionHub,
    code_format: CodeFormat,
    events: broadcast::Sender<StepEvent>,
}

/// Input to [`VerificationStep::verify`].
///
/// The wire name of the code field is `otpCode`; push verification
/// carries no user-entered proof and uses [`VerifyRequest::empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// The user-entered one-time code, for the code-based factors.
    #[serde(rename = "otpCode", skip_serializing_if = "Option::is_none")]
    pub otp_code: Option<String>,
}

impl VerifyRequest {
    /// A request carrying a one-time code.
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            otp_code: Some(code.into()),
        }
    }

    /// A request with no user-entered proof (push).
    pub fn empty() -> Self {
        Self::default()
    }
}

impl VerificationStep {
    pub(crate) fn new(
        strategy: AuthStrategy,
        tx_id: TxId,
        accepted: DecisionHub,
        rejected: DecisionHub,
        code_format: CodeFormat,
    ) -> Self {
        let (events, _) = broadcast::channel(STEP_EVENT_CAPACITY);
        Self {
            strategy,
            tx_id,
            accepted,
            rejected,
            code_format,
            events,
        }
    }

    /// The method this step verifies.
    pub fn method(&self) -> Method {
        self.strategy.method()
    }

    /// Snapshot the step's persistable state.
    pub fn state(&self) -> StepState {
        StepState {
            method: self.method(),
        }
    }

    /// Observe this step's submission errors and terminal decision.
    ///
    /// The receiver sees events from `verify` calls made after this point.
    pub fn subscribe(&self) -> broadcast::Receiver<StepEvent> {
        self.events.subscribe()
    }

    /// Verify this factor.
    ///
    /// Validates the request, subscribes to both decision hubs for the
    /// owning transaction, and (for the code-based factors) submits the
    /// proof. `Ok` means the submission was accepted and the decision is
    /// pending on the returned handle; `Err` is terminal for this call.
    ///
    /// Spawns one resolver task on the current tokio runtime; the task
    /// exits at the first matching decision and holds the only
    /// subscription state, so discarding the step leaks nothing.
    pub async fn verify(&self, request: VerifyRequest) -> Result<PendingDecision, VerifyError> {
        let code = match self.validate(&request) {
            Ok(code) => code,
            Err(err) => {
                tracing::debug!(tx_id = %self.tx_id, code = err.error_code(), "validation failed");
                self.emit(StepEvent::Error(err.clone()));
                return Err(err);
            }
        };

        // Both subscriptions must exist before any transport call: a
        // synchronous transport may publish the decision inside submit.
        let accepted = self.accepted.subscribe_once(self.tx_id.clone());
        let rejected = self.rejected.subscribe_once(self.tx_id.clone());

        let (decided_tx, decided_rx) = oneshot::channel();
        let events = self.events.clone();
        let tx_id = self.tx_id.clone();
        let resolver = tokio::spawn(async move {
            // First hub to fire wins; dropping the loser releases its
            // subscription. Exiting after one decision makes the pair
            // one-shot: later events for this transaction fire nothing.
            let response = tokio::select! {
                event = accepted.wait() => event.map(|event| AuthResponse {
                    accepted: true,
                    signature: event.signature().map(str::to_owned),
                }),
                event = rejected.wait() => event.map(|_| AuthResponse {
                    accepted: false,
                    signature: None,
                }),
            };

            if let Some(response) = response {
                tracing::debug!(%tx_id, accepted = response.accepted, "verification resolved");
                let _ = events.send(StepEvent::AuthResponse(response.clone()));
                let _ = decided_tx.send(response);
            }
        });

        if let Some(code) = code {
            if let Err(err) = self.strategy.submit(&code).await {
                // The proof never reached the server, so no decision is
                // coming; release both subscriptions.
                resolver.abort();
                let err = VerifyError::from(err);
                tracing::debug!(tx_id = %self.tx_id, code = err.error_code(), "submission failed");
                self.emit(StepEvent::Error(err.clone()));
                return Err(err);
            }
        }

        Ok(PendingDecision {
            decided: decided_rx,
        })
    }

    /// Validate the request against this step's method.
    ///
    /// Code factors require a non-empty code in the configured format;
    /// push carries no user-entered proof and always validates.
    fn validate(&self, request: &VerifyRequest) -> Result<Option<String>, VerifyError> {
        if !self.method().requires_code() {
            return Ok(None);
        }

        let code = request.otp_code.as_deref().unwrap_or("");
        if code.is_empty() {
            return Err(VerifyError::FieldRequired { field: "otpCode" });
        }
        self.code_format.validate(code)?;
        Ok(Some(code.to_owned()))
    }

    fn emit(&self, event: StepEvent) {
        // No subscribers is fine; callers may rely on the Result alone.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for VerificationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationStep")
            .field("method", &self.method())
            .field("tx_id", &self.tx_id)
            .finish_non_exhaustive()
    }
}
