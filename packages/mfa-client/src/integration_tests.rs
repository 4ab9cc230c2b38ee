//! End-to-end scenarios over a real bus and a recorded transport.
//!
//! These tests drive whole transactions the way an embedding UI would:
//! build the transaction, pick a step, verify, and let a synthetic
//! publisher stand in for the server's push channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::enrollment::Enrollment;
use crate::error::{ServerError, VerifyError};
use crate::events::{LoginEvent, LoginEventBus};
use crate::step::{AuthResponse, StepEvent, VerifyRequest};
use crate::strategy::{CodeFormat, Method};
use crate::testing::MockTransport;
use crate::transaction::{Transaction, TxId};
use crate::transport::Transport;

fn full_transaction(
    tx: &str,
    bus: &LoginEventBus,
    transport: Arc<MockTransport>,
) -> Transaction {
    Transaction::builder(tx, format!("token-{tx}"))
        .with_methods([Method::Otp, Method::Sms, Method::Push])
        .with_enrollment(
            Enrollment::new("enr-phone", vec![Method::Sms]).with_phone_number("+15551230000"),
        )
        .with_enrollment(
            Enrollment::new("enr-device", vec![Method::Otp, Method::Push])
                .with_device_name("pixel-9"),
        )
        .build(bus.clone(), transport)
}

fn accepted(tx: &str, signature: &str) -> LoginEvent {
    LoginEvent::Complete {
        tx_id: TxId::new(tx),
        signature: signature.into(),
    }
}

#[tokio::test]
async fn test_otp_flow_end_to_end() {
    let bus = LoginEventBus::new();
    let transport = Arc::new(MockTransport::new());
    let tx = full_transaction("tx-otp", &bus, transport.clone());

    let step = tx.step(Method::Otp).unwrap();
    let mut events = step.subscribe();

    let pending = step.verify(VerifyRequest::code("123456")).await.unwrap();

    // Submission went out with the transaction's own credential.
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token, "token-tx-otp");

    // The decision arrives out-of-band, later.
    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(accepted("tx-otp", "proof-sig"));

    let response = pending.decision().await.unwrap();
    assert_eq!(
        response,
        AuthResponse {
            accepted: true,
            signature: Some("proof-sig".into()),
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        StepEvent::AuthResponse(response)
    );
}

#[tokio::test]
async fn test_sms_flow_with_custom_code_length() {
    let bus = LoginEventBus::new();
    let transport = Arc::new(MockTransport::new());
    let tx = Transaction::builder("tx-sms", "tok")
        .with_method(Method::Sms)
        .with_code_format(CodeFormat::new(8))
        .build(bus.clone(), transport.clone());

    let step = tx.step(Method::Sms).unwrap();

    // The default six-digit code no longer fits.
    assert_eq!(
        step.verify(VerifyRequest::code("123456")).await.unwrap_err(),
        VerifyError::InvalidOtpFormat
    );
    assert_eq!(transport.call_count(), 0);

    let pending = step.verify(VerifyRequest::code("12345678")).await.unwrap();
    assert_eq!(transport.call_count(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(LoginEvent::Rejected {
        tx_id: TxId::new("tx-sms"),
    });

    let response = pending.decision().await.unwrap();
    assert!(!response.accepted);
}

#[tokio::test]
async fn test_push_flow_is_event_only() {
    let bus = LoginEventBus::new();
    let transport = Arc::new(MockTransport::new());
    let tx = full_transaction("tx-push", &bus, transport.clone());

    let step = tx.step(Method::Push).unwrap();
    let pending = step.verify(VerifyRequest::empty()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(accepted("tx-push", "push-sig"));

    let response = pending.decision().await.unwrap();
    assert!(response.accepted);
    assert_eq!(response.signature.as_deref(), Some("push-sig"));
    assert_eq!(transport.call_count(), 0, "push never touches the transport");
}

#[tokio::test]
async fn test_concurrent_transactions_stay_isolated() {
    let bus = LoginEventBus::new();
    let transport = Arc::new(MockTransport::new());
    let tx_a = full_transaction("tx-a", &bus, transport.clone());
    let tx_b = full_transaction("tx-b", &bus, transport.clone());

    let step_a = tx_a.step(Method::Push).unwrap();
    let step_b = tx_b.step(Method::Push).unwrap();

    let pending_a = step_a.verify(VerifyRequest::empty()).await.unwrap();
    let pending_b = step_b.verify(VerifyRequest::empty()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(accepted("tx-b", "sig-b"));

    let response_b = timeout(Duration::from_secs(1), pending_b.decision())
        .await
        .unwrap()
        .unwrap();
    assert!(response_b.accepted);

    // Transaction A saw nothing from B's decision.
    assert!(
        timeout(Duration::from_millis(50), pending_a.decision())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_reload_resume_via_serialized_state() {
    let bus = LoginEventBus::new();
    let transport: Arc<dyn Transport> = Arc::new(MockTransport::new());
    let original = full_transaction("tx-reload", &bus, Arc::new(MockTransport::new()));
    let step_state = original.step(Method::Sms).unwrap().state();
    let tx_state = original.state();
    drop(original);

    // A reloaded UI rebuilds both from their snapshots.
    let restored = Transaction::restore(tx_state, bus.clone(), transport);
    let step = restored.step_from_state(step_state).unwrap();
    assert_eq!(step.method(), Method::Sms);

    let pending = step.verify(VerifyRequest::code("123456")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(accepted("tx-reload", "sig"));

    assert!(pending.decision().await.unwrap().accepted);
}

#[tokio::test]
async fn test_server_rejection_of_proof_ends_the_attempt() {
    let bus = LoginEventBus::new();
    let transport = Arc::new(MockTransport::failing(ServerError {
        error_code: "too_many_attempts".into(),
        message: "slow down".into(),
        status_code: 429,
    }));
    let tx = full_transaction("tx-throttled", &bus, transport);

    let step = tx.step(Method::Otp).unwrap();
    let err = step.verify(VerifyRequest::code("123456")).await.unwrap_err();

    assert_eq!(err.error_code(), "too_many_attempts");

    // Even a matching decision afterwards resolves nothing: the failed
    // submission released both hub subscriptions.
    let mut events = step.subscribe();
    tokio::time::sleep(Duration::from_millis(20)).await;
    bus.publish(accepted("tx-throttled", "sig"));
    assert!(
        timeout(Duration::from_millis(50), events.recv()).await.is_err()
    );
}
