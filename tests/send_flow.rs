//! End-to-end submission tests against a stub node.

use octra_wallet::blockchain::signer::SignedTransaction;
use octra_wallet::{AccountState, Amount, TransactionIntent, WalletError, WalletSession};

mod common;

use common::{StubNode, ONES_ADDRESS, ZERO_ADDRESS, ZERO_SECRET_64};

#[tokio::test]
async fn test_login_derives_known_address() {
    let node = StubNode::start().await;
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();

    assert_eq!(session.address().as_str(), ZERO_ADDRESS);
    assert_eq!(
        session.public_key_base64(),
        "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik="
    );
    assert_eq!(node.hits(), 0);
}

#[tokio::test]
async fn test_send_builds_signs_and_submits() {
    let node = StubNode::start().await;
    node.set_balance(ZERO_ADDRESS, 200, r#"{"balance":"100","nonce":5}"#);
    node.set_send_reply(200, r#"{"status":"accepted","tx_hash":"abc","pool_info":{"size":1}}"#);

    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();
    let result = session
        .send(&TransactionIntent::new(ONES_ADDRESS, 10.0))
        .await
        .unwrap();

    assert!(result.success, "unexpected failure: {:?}", result.error);
    assert_eq!(result.tx_hash.as_deref(), Some("abc"));
    assert_eq!(result.pool_info, Some(serde_json::json!({"size": 1})));
    assert!(result.response_time >= 0.0);

    let submitted = node.submitted();
    assert_eq!(submitted.len(), 1);
    let body = &submitted[0];
    assert_eq!(body["from"], ZERO_ADDRESS);
    assert_eq!(body["to_"], ONES_ADDRESS);
    assert_eq!(body["amount"], "10000000");
    assert_eq!(body["nonce"], 6);
    assert_eq!(body["ou"], "1");
    assert!(body["timestamp"].as_f64().unwrap() > 1_600_000_000.0);

    let signed: SignedTransaction = serde_json::from_value(body.clone()).unwrap();
    signed.verify().unwrap();
}

#[tokio::test]
async fn test_large_transfer_uses_higher_tier() {
    let node = StubNode::start().await;
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();
    let state = AccountState::new(Amount::from_micro(5_000_000_000), 0);

    let result = session
        .send_with_state(&TransactionIntent::new(ONES_ADDRESS, 1000.0), &state)
        .await
        .unwrap();

    assert!(result.success);
    let body = &node.submitted()[0];
    assert_eq!(body["ou"], "3");
    assert_eq!(body["nonce"], 1);
    assert_eq!(body["amount"], "1000000000");
}

#[tokio::test]
async fn test_legacy_ok_reply_is_success() {
    let node = StubNode::start().await;
    node.set_send_reply(200, "OK 7f3a9c");
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();
    let state = AccountState::new(Amount::from_micro(50_000_000), 2);

    let result = session
        .send_with_state(&TransactionIntent::new(ONES_ADDRESS, 1.5), &state)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.tx_hash.as_deref(), Some("7f3a9c"));
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn test_node_rejection_is_reported_not_raised() {
    let node = StubNode::start().await;
    node.set_send_reply(400, r#"{"error":"duplicate nonce"}"#);
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();
    let state = AccountState::new(Amount::from_micro(50_000_000), 2);

    let result = session
        .send_with_state(&TransactionIntent::new(ONES_ADDRESS, 1.0), &state)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.tx_hash, None);
    assert_eq!(result.error.as_deref(), Some("duplicate nonce"));
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_node() {
    let node = StubNode::start().await;
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();
    let state = AccountState::new(Amount::from_micro(5_000_000), 0);

    let err = session
        .send_with_state(&TransactionIntent::new(ONES_ADDRESS, 10.0), &state)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WalletError::InsufficientBalance {
            have: Amount::from_micro(5_000_000),
            want: Amount::from_micro(10_000_000),
        }
    );

    let err = session
        .send_with_state(&TransactionIntent::new("octNOPE", 1.0), &state)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAddress(_)));

    let err = session
        .send_with_state(&TransactionIntent::new(ONES_ADDRESS, 0.0), &state)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(_)));

    assert_eq!(node.hits(), 0);
}

#[tokio::test]
async fn test_unknown_account_cannot_send() {
    let node = StubNode::start().await;
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();

    // No balance registered: the node answers 404 and the account is empty.
    let err = session
        .send(&TransactionIntent::new(ONES_ADDRESS, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientBalance { .. }));
    assert_eq!(node.hits(), 1);
    assert!(node.submitted().is_empty());
}

#[tokio::test]
async fn test_unreachable_node_yields_failed_result() {
    let session = WalletSession::login(ZERO_SECRET_64, common::unreachable_client().await).unwrap();
    let state = AccountState::new(Amount::from_micro(50_000_000), 0);

    let result = session
        .send_with_state(&TransactionIntent::new(ONES_ADDRESS, 1.0), &state)
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_dry_run_signature_verifies_without_network() {
    let node = StubNode::start().await;
    let session = WalletSession::login(ZERO_SECRET_64, node.client()).unwrap();
    let state = AccountState::new(Amount::from_micro(50_000_000), 9);
    let intent = TransactionIntent::new(ONES_ADDRESS, 2.0);

    let preview = session.preview(&intent, &state).unwrap();
    assert_eq!(preview.nonce, 10);
    assert_eq!(preview.fee, Amount::from_micro(1_000));
    assert_eq!(preview.total, Amount::from_micro(2_001_000));

    let signed = session.prepare(&intent, &state).unwrap();
    assert_eq!(signed.tx.nonce, 10);
    signed.verify().unwrap();
    assert_eq!(node.hits(), 0);
}
