//! The candidate list of signable report fields.
//!
//! The list is a fixed, versioned constant. Selection probes each
//! candidate against a concrete report instance and keeps, in candidate
//! order, only the fields that are actually present; an absent optional
//! field is silently dropped from what gets signed. That is the whole
//! schema-evolution story: a report format that omits a field simply
//! signs fewer fields, and old signatures keep verifying against the
//! paths recorded with them.
//!
//! Removing an accessor from this table while persisted signatures still
//! reference its path is a data-migration hazard; check the stored
//! `signed_field_paths` before dropping one.

use crate::report::CreditScoreReport;

pub type FieldAccessor = fn(&CreditScoreReport) -> Option<String>;

fn iban(report: &CreditScoreReport) -> Option<String> {
    report.account_reference.iban.clone()
}

fn initial_balance(report: &CreditScoreReport) -> Option<String> {
    Some(report.initial_balance.to_string())
}

fn newest_transaction_date(report: &CreditScoreReport) -> Option<String> {
    report.newest_transaction_date.map(|d| d.to_string())
}

fn oldest_transaction_date(report: &CreditScoreReport) -> Option<String> {
    report.oldest_transaction_date.map(|d| d.to_string())
}

fn credit_limit(report: &CreditScoreReport) -> Option<String> {
    report.credit_limit.as_ref().map(|c| c.to_string())
}

fn transactions_size(report: &CreditScoreReport) -> Option<String> {
    Some(report.transactions_size.to_string())
}

/// Candidate paths in signing order. Order matters: it is baked into the
/// canonical byte sequence.
pub const SIGNED_FIELD_CANDIDATES: &[(&str, FieldAccessor)] = &[
    ("iban", iban),
    ("initialBalance", initial_balance),
    ("newestTransactionDate", newest_transaction_date),
    ("oldestTransactionDate", oldest_transaction_date),
    ("creditLimit", credit_limit),
    ("transactionsSize", transactions_size),
];

/// The candidate paths present on this report instance, in candidate
/// order. This is what gets recorded as `signed_field_paths`.
pub fn select_present_fields(report: &CreditScoreReport) -> Vec<String> {
    SIGNED_FIELD_CANDIDATES
        .iter()
        .filter(|(_, accessor)| accessor(report).is_some())
        .map(|(path, _)| (*path).to_string())
        .collect()
}

/// Resolve a stored path back to its accessor. `None` means the current
/// schema no longer knows the path.
pub fn accessor_for(path: &str) -> Option<FieldAccessor> {
    SIGNED_FIELD_CANDIDATES
        .iter()
        .find(|(candidate, _)| *candidate == path)
        .map(|(_, accessor)| *accessor)
}
