//! End-to-end: assemble, sign, persist, reload, verify.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, TimeZone, Utc};
use creditreport_core::assembler::{AccountSnapshot, ReportAssembler};
use creditreport_core::category::Category;
use creditreport_core::keys::KeyRing;
use creditreport_core::report::AccountReference;
use creditreport_core::signer;
use creditreport_core::store::ReportStore;
use creditreport_core::transaction::Transaction;
use std::str::FromStr;
use std::sync::OnceLock;
use uuid::Uuid;

fn keys() -> &'static KeyRing {
    static KEYS: OnceLock<KeyRing> = OnceLock::new();
    KEYS.get_or_init(|| KeyRing::generate().unwrap())
}

fn assembler() -> ReportAssembler<&'static KeyRing> {
    ReportAssembler::new(keys())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn snapshot() -> AccountSnapshot {
    AccountSnapshot {
        user_id: Uuid::new_v4(),
        account_reference: AccountReference {
            iban: Some("DE89370400440532013000".to_string()),
            ..AccountReference::default()
        },
        balance: dec("2500.00"),
        credit_limit: Some(dec("-1000.00")),
        currency: "EUR".to_string(),
        last_data_fetch_time: Utc.with_ymd_and_hms(2021, 1, 2, 12, 0, 0).unwrap(),
        account_holder: Some("Acme GmbH".to_string()),
    }
}

fn transactions() -> Vec<Transaction> {
    vec![
        Transaction::new(date(2020, 12, 3), dec("3000.00"), Some("Revenue".to_string())),
        Transaction::new(date(2020, 12, 15), dec("-800.00"), Some("Rent and Facilities".to_string())),
        Transaction::new(date(2020, 12, 20), dec("-50.00"), None),
        Transaction::new(date(2020, 11, 5), dec("2800.00"), Some("Revenue".to_string())),
        Transaction::new(date(2020, 11, 18), dec("-760.00"), Some("Rent and Facilities".to_string())),
    ]
}

/// The assembled report carries snapshot fields, date extremes, and one
/// monthly record per month with transactions.
#[test]
fn assembles_report_from_snapshot_and_transactions() {
    let signed = assembler().assemble(&snapshot(), &transactions()).unwrap();
    let report = &signed.report;

    assert_eq!(report.initial_balance, dec("2500.00"));
    assert_eq!(report.transactions_size, 5);
    assert_eq!(report.newest_transaction_date, Some(date(2020, 12, 20)));
    assert_eq!(report.oldest_transaction_date, Some(date(2020, 11, 5)));
    assert_eq!(report.credit_score_monthly.len(), 2);

    let december = &report.credit_score_monthly[1];
    assert_eq!((december.year, december.month), (2020, 12));
    assert_eq!(december.incoming_transactions_size, 1);
    assert_eq!(december.outgoing_transactions_size, 2);

    // Category amounts are magnitudes; the unlabeled debit lands in
    // OTHER_EXPENSES via the sign fallback.
    assert_eq!(december.categorized_amounts[&Category::Revenue].amount, dec("3000.00"));
    assert_eq!(
        december.categorized_amounts[&Category::RentAndFacilities].amount,
        dec("800.00")
    );
    assert_eq!(
        december.categorized_amounts[&Category::OtherExpenses].amount,
        dec("50.00")
    );
}

/// Derived totals always match the category breakdown.
#[test]
fn monthly_totals_derive_from_categories() {
    let signed = assembler().assemble(&snapshot(), &transactions()).unwrap();
    let december = &signed.report.credit_score_monthly[1];

    assert_eq!(december.total_incoming(), dec("3000.00"));
    assert_eq!(december.total_outgoing(), dec("850.00"));
}

/// No transactions: no monthly records, no date extremes, still signed.
#[test]
fn empty_transactions_produce_a_minimal_report() {
    let signed = assembler().assemble(&snapshot(), &[]).unwrap();
    let report = &signed.report;

    assert!(report.credit_score_monthly.is_empty());
    assert_eq!(report.newest_transaction_date, None);
    assert_eq!(report.oldest_transaction_date, None);
    assert_eq!(report.transactions_size, 0);
    // Date fields dropped out of the signed set.
    assert_eq!(
        signed.signature.signed_field_paths,
        vec!["iban", "initialBalance", "creditLimit", "transactionsSize"]
    );
    assert!(signer::verify(report, &signed.signature, keys()).unwrap());
}

/// Store round trip: the reloaded report still verifies against its
/// stored signature.
#[test]
fn persisted_report_round_trips_and_verifies() {
    let store = ReportStore::in_memory().unwrap();
    store.migrate().unwrap();

    let snapshot = snapshot();
    let signed = assembler().assemble(&snapshot, &transactions()).unwrap();
    store.insert_signed_report(&signed).unwrap();

    let reloaded = store
        .find_signed_report_by_user(snapshot.user_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded, signed);
    assert!(signer::verify(&reloaded.report, &reloaded.signature, keys()).unwrap());

    let signature = store.report_signature(snapshot.user_id).unwrap().unwrap();
    assert_eq!(signature, signed.signature);

    assert!(store.find_signed_report_by_user(Uuid::new_v4()).unwrap().is_none());
}

/// Deleting a report cascades to its monthly and category rows.
#[test]
fn delete_removes_the_whole_report_tree() {
    let store = ReportStore::in_memory().unwrap();
    store.migrate().unwrap();

    let snapshot = snapshot();
    let signed = assembler().assemble(&snapshot, &transactions()).unwrap();
    store.insert_signed_report(&signed).unwrap();

    store.delete_report_by_user(snapshot.user_id).unwrap();
    assert!(store.find_signed_report_by_user(snapshot.user_id).unwrap().is_none());
}

/// The windowed category query only returns rows inside the bounds.
#[test]
fn categorized_entries_respect_the_window() {
    let store = ReportStore::in_memory().unwrap();
    store.migrate().unwrap();

    let snapshot = snapshot();
    let signed = assembler().assemble(&snapshot, &transactions()).unwrap();
    store.insert_signed_report(&signed).unwrap();

    let december_only = store
        .categorized_entries_for_user(snapshot.user_id, date(2020, 12, 1), date(2020, 12, 31))
        .unwrap();
    assert!(december_only.iter().all(|e| e.date == date(2020, 12, 1)));
    assert_eq!(december_only.len(), 3);

    let nothing = store
        .categorized_entries_for_user(snapshot.user_id, date(2021, 2, 1), date(2021, 6, 30))
        .unwrap();
    assert!(nothing.is_empty());
}

/// Syncing the archive persists the public key once; the reload path
/// hands back a usable key.
#[test]
fn public_key_archive_round_trips() {
    let store = ReportStore::in_memory().unwrap();
    store.migrate().unwrap();

    let ring = KeyRing::generate().unwrap();
    let now = Utc.with_ymd_and_hms(2021, 1, 2, 12, 0, 0).unwrap();
    ring.sync_archive(&store, now).unwrap();
    // Second sync is a no-op, not a duplicate insert.
    ring.sync_archive(&store, now).unwrap();

    let keys_in_store = store.public_keys().unwrap();
    assert_eq!(keys_in_store.len(), 1);
    assert_eq!(keys_in_store[0].0, ring.current_key_id());

    let mut fresh = KeyRing::generate().unwrap();
    fresh.load_archive(&store).unwrap();
    let der = fresh.public_key_der(ring.current_key_id()).unwrap();
    assert_eq!(der, keys_in_store[0].1);
}
