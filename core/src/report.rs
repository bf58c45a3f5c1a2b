//! The assembled credit score report and its signature record.
//!
//! A report is created once per completed user journey and is immutable
//! once signed: mutating any signed field without re-signing breaks
//! verification, by design.

use crate::monthly::MonthlyReport;
use crate::types::{KeyId, ReportId, UserId};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// How the account is identified by the bank. At least one of the
/// variants is expected to be present; which one depends on the market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_pan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_code_account_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditScoreReport {
    pub id: ReportId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub account_reference: AccountReference,
    pub initial_balance: BigDecimal,
    pub last_data_fetch_time: DateTime<Utc>,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_transaction_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_transaction_date: Option<NaiveDate>,
    /// Zero or negative by convention; an overdraft facility of 1000
    /// is stored as `-1000.00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_limit: Option<BigDecimal>,
    pub transactions_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,
    pub credit_score_monthly: Vec<MonthlyReport>,
}

/// The permanent signature record stored next to a report.
///
/// `signed_field_paths` is authoritative: verification rebuilds the
/// canonical byte sequence from this list, never from the current
/// candidate list, so schema evolution cannot retroactively change what
/// an old signature covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSignature {
    /// Base64-encoded RSA-PSS signature bytes.
    pub signature: String,
    pub key_id: KeyId,
    pub signed_field_paths: Vec<String>,
}

/// A report together with the signature it was sealed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedReport {
    pub report: CreditScoreReport,
    pub signature: ReportSignature,
}
