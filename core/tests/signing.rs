//! Selective report signing and verification.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, TimeZone, Utc};
use creditreport_core::error::ReportError;
use creditreport_core::keys::{KeyProvider, KeyRing};
use creditreport_core::report::{AccountReference, CreditScoreReport};
use creditreport_core::signer::{sign, verify};
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

// RSA-2048 generation is slow; share one key ring across the file.
fn keys() -> &'static KeyRing {
    static KEYS: OnceLock<KeyRing> = OnceLock::new();
    KEYS.get_or_init(|| KeyRing::generate().unwrap())
}

fn report() -> CreditScoreReport {
    CreditScoreReport {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        account_reference: AccountReference {
            iban: Some("DE89370400440532013000".to_string()),
            ..AccountReference::default()
        },
        initial_balance: BigDecimal::from_str("2500.00").unwrap(),
        last_data_fetch_time: Utc.with_ymd_and_hms(2021, 1, 2, 12, 0, 0).unwrap(),
        currency: "EUR".to_string(),
        newest_transaction_date: NaiveDate::from_ymd_opt(2020, 12, 28),
        oldest_transaction_date: NaiveDate::from_ymd_opt(2019, 11, 3),
        credit_limit: Some(BigDecimal::from_str("-1000.00").unwrap()),
        transactions_size: 420,
        account_holder: Some("Acme GmbH".to_string()),
        credit_score_monthly: Vec::new(),
    }
}

/// RSA-2048 signatures are 256 bytes, so 344 base64 characters.
#[test]
fn signature_has_fixed_length() {
    let signature = sign(&report(), keys()).unwrap();
    assert_eq!(signature.signature.len(), 344);
}

/// With every candidate field present, the recorded paths are the full
/// candidate list in order.
#[test]
fn signs_all_present_fields_in_candidate_order() {
    let signature = sign(&report(), keys()).unwrap();
    assert_eq!(
        signature.signed_field_paths,
        vec![
            "iban",
            "initialBalance",
            "newestTransactionDate",
            "oldestTransactionDate",
            "creditLimit",
            "transactionsSize",
        ]
    );
}

/// Absent optional fields are dropped from the recorded paths, and the
/// signature still verifies.
#[test]
fn absent_fields_are_not_signed() {
    let mut report = report();
    report.credit_limit = None;
    report.account_reference.iban = None;

    let signature = sign(&report, keys()).unwrap();
    assert_eq!(
        signature.signed_field_paths,
        vec![
            "initialBalance",
            "newestTransactionDate",
            "oldestTransactionDate",
            "transactionsSize",
        ]
    );
    assert!(verify(&report, &signature, keys()).unwrap());
}

/// Sign then verify with the same key ring.
#[test]
fn sign_verify_round_trip() {
    let report = report();
    let signature = sign(&report, keys()).unwrap();
    assert_eq!(signature.key_id, keys().current_key_id());
    assert!(verify(&report, &signature, keys()).unwrap());
}

/// Changing a signed field after signing breaks verification.
#[test]
fn tampered_signed_field_fails_verification() {
    let mut report = report();
    let signature = sign(&report, keys()).unwrap();

    report.initial_balance = BigDecimal::from_str("9999.00").unwrap();
    assert!(!verify(&report, &signature, keys()).unwrap());
}

/// Fields outside the signed set are not protected.
#[test]
fn unsigned_field_changes_do_not_affect_verification() {
    let mut report = report();
    let signature = sign(&report, keys()).unwrap();

    report.currency = "USD".to_string();
    report.account_holder = Some("Someone Else".to_string());
    assert!(verify(&report, &signature, keys()).unwrap());
}

/// A corrupted signature verifies as false, not as an error.
#[test]
fn corrupted_signature_is_false() {
    let report = report();
    let mut signature = sign(&report, keys()).unwrap();

    // Flip one base64 character, keeping the encoding valid.
    let mut bytes = signature.signature.into_bytes();
    bytes[0] = if bytes[0] == b'A' { b'B' } else { b'A' };
    signature.signature = String::from_utf8(bytes).unwrap();

    assert!(!verify(&report, &signature, keys()).unwrap());
}

/// A signature checked against the wrong public key is false.
#[test]
fn wrong_key_is_false() {
    let report = report();
    let other = KeyRing::generate().unwrap();

    let mut ring = KeyRing::generate().unwrap();
    ring.register_public_key(other.current_key_id(), other.current_public_key());

    // Signed under the ring's key, claimed to be under the other key.
    let mut signature = sign(&report, &ring).unwrap();
    signature.key_id = other.current_key_id();
    assert!(!verify(&report, &signature, &ring).unwrap());
}

/// An unknown key id is an error, not a false result.
#[test]
fn unknown_key_id_is_an_error() {
    let report = report();
    let mut signature = sign(&report, keys()).unwrap();
    signature.key_id = Uuid::new_v4();

    match verify(&report, &signature, keys()) {
        Err(ReportError::UnknownKey { .. }) => {}
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Undecodable signature bytes are a distinct malformed-input error.
#[test]
fn garbage_signature_is_an_error() {
    let report = report();
    let mut signature = sign(&report, keys()).unwrap();
    signature.signature = "not base64 at all!".to_string();

    match verify(&report, &signature, keys()) {
        Err(ReportError::MalformedSignature(_)) => {}
        other => panic!("expected MalformedSignature, got {other:?}"),
    }
}

/// Verification follows the stored path list, so dropping a path from the
/// record changes the canonical sequence and fails verification.
#[test]
fn stored_paths_are_authoritative() {
    let report = report();
    let mut signature = sign(&report, keys()).unwrap();
    signature.signed_field_paths.pop();

    assert!(!verify(&report, &signature, keys()).unwrap());
}

/// A stored path the schema no longer resolves is an error.
#[test]
fn unknown_stored_path_is_an_error() {
    let report = report();
    let mut signature = sign(&report, keys()).unwrap();
    signature.signed_field_paths.push("ancientField".to_string());

    match verify(&report, &signature, keys()) {
        Err(ReportError::UnknownSignedField { path }) => assert_eq!(path, "ancientField"),
        other => panic!("expected UnknownSignedField, got {other:?}"),
    }
}

/// A stored path whose field has since gone absent is an error.
#[test]
fn missing_signed_field_is_an_error() {
    let mut report = report();
    let signature = sign(&report, keys()).unwrap();

    report.credit_limit = None;
    match verify(&report, &signature, keys()) {
        Err(ReportError::MissingSignedField { path }) => assert_eq!(path, "creditLimit"),
        other => panic!("expected MissingSignedField, got {other:?}"),
    }
}

/// The key provider refuses ids it has never seen.
#[test]
fn key_provider_rejects_unknown_ids() {
    match keys().public_key(Uuid::new_v4()) {
        Err(ReportError::UnknownKey { .. }) => {}
        other => panic!("expected UnknownKey, got {:?}", other.map(|_| ())),
    }
}
