//! Login transaction: identity, credential, enrollments, and the decision
//! hubs scoped to it.
//!
//! A `Transaction` is the composition root for verification: every step,
//! strategy, and hub is constructed against one. Its identity (`TxId`)
//! is immutable for its lifetime. State can be snapshotted with
//! [`Transaction::state`] and rebuilt with [`Transaction::restore`] so a UI
//! can survive a reload; the event bus and transport are runtime handles
//! and are re-supplied at restore time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::enrollment::Enrollment;
use crate::error::TransactionError;
use crate::events::LoginEventBus;
use crate::hub::{DecisionHub, DecisionKind};
use crate::step::{StepState, VerificationStep};
use crate::strategy::{AuthStrategy, CodeFormat, Method};
use crate::transport::Transport;

/// Server-issued identity of one login transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Wrap a transaction identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TxId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TxId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An in-progress login awaiting second-factor verification.
pub struct Transaction {
    tx_id: TxId,
    credential: Credential,
    methods: Vec<Method>,
    enrollments: Vec<Enrollment>,
    code_format: CodeFormat,
    bus: LoginEventBus,
    transport: Arc<dyn Transport>,
}

impl Transaction {
    /// Start building a transaction from its identity and bearer token.
    pub fn builder(tx_id: impl Into<TxId>, token: impl Into<String>) -> TransactionBuilder {
        TransactionBuilder {
            tx_id: tx_id.into(),
            token: token.into(),
            methods: Vec::new(),
            enrollments: Vec::new(),
            code_format: CodeFormat::default(),
        }
    }

    /// Rebuild a transaction from a previously captured snapshot.
    ///
    /// The bus and transport are runtime handles, not state; supplying the
    /// same bus yields hubs scoped to the same stream the original saw.
    pub fn restore(
        state: TransactionState,
        bus: LoginEventBus,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let mut builder =
            Transaction::builder(state.tx_id, state.token).with_methods(state.methods);
        for enrollment in state.enrollments {
            builder = builder.with_enrollment(enrollment);
        }
        builder.build(bus, transport)
    }

    /// This transaction's identity.
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    /// The bearer credential bound to this transaction.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Methods this transaction declares as available.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Registered factors.
    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrollments
    }

    /// Hub delivering acceptance decisions for this transaction's stream.
    pub fn accepted(&self) -> DecisionHub {
        DecisionHub::new(DecisionKind::Accepted, self.bus.clone())
    }

    /// Hub delivering rejection decisions for this transaction's stream.
    pub fn rejected(&self) -> DecisionHub {
        DecisionHub::new(DecisionKind::Rejected, self.bus.clone())
    }

    /// Obtain a verification step for `method`.
    ///
    /// Fails if the transaction does not declare the method.
    pub fn step(&self, method: Method) -> Result<VerificationStep, TransactionError> {
        if !self.methods.contains(&method) {
            return Err(TransactionError::MethodNotAvailable { method });
        }
        Ok(VerificationStep::new(
            AuthStrategy::new(method, self.credential.clone(), Arc::clone(&self.transport)),
            self.tx_id.clone(),
            self.accepted(),
            self.rejected(),
            self.code_format,
        ))
    }

    /// Resume the step a serialized UI had active.
    pub fn step_from_state(&self, state: StepState) -> Result<VerificationStep, TransactionError> {
        self.step(state.method)
    }

    /// Snapshot this transaction's persistable state.
    pub fn state(&self) -> TransactionState {
        TransactionState {
            tx_id: self.tx_id.clone(),
            token: self.credential.token().to_string(),
            methods: self.methods.clone(),
            enrollments: self.enrollments.clone(),
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("tx_id", &self.tx_id)
            .field("methods", &self.methods)
            .field("enrollments", &self.enrollments.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Transaction`].
pub struct TransactionBuilder {
    tx_id: TxId,
    token: String,
    methods: Vec<Method>,
    enrollments: Vec<Enrollment>,
    code_format: CodeFormat,
}

impl TransactionBuilder {
    /// Declare an available method.
    pub fn with_method(mut self, method: Method) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    /// Declare several available methods.
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        for method in methods {
            self = self.with_method(method);
        }
        self
    }

    /// Attach a registered factor.
    pub fn with_enrollment(mut self, enrollment: Enrollment) -> Self {
        self.enrollments.push(enrollment);
        self
    }

    /// Override the expected one-time code format.
    pub fn with_code_format(mut self, code_format: CodeFormat) -> Self {
        self.code_format = code_format;
        self
    }

    /// Finish, binding the transaction to its event source and transport.
    pub fn build(self, bus: LoginEventBus, transport: Arc<dyn Transport>) -> Transaction {
        Transaction {
            tx_id: self.tx_id,
            credential: Credential::new(self.token),
            methods: self.methods,
            enrollments: self.enrollments,
            code_format: self.code_format,
            bus,
            transport,
        }
    }
}

/// Persistable snapshot of a [`Transaction`].
///
/// Wire-compatible camelCase field names, so the snapshot can live next to
/// the rest of a session's serialized state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionState {
    /// Transaction identity.
    pub tx_id: TxId,
    /// Raw bearer token.
    pub token: String,
    /// Declared methods.
    pub methods: Vec<Method>,
    /// Registered factors.
    pub enrollments: Vec<Enrollment>,
}
