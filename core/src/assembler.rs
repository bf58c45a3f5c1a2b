//! Report assembly: turn a fetched account snapshot plus its transaction
//! list into a signed, persistable report.
//!
//! Assembly is a pure fold over the inputs followed by one signing step.
//! Nothing here touches the database; the caller persists the result
//! through the store.

use crate::balance::{balance_history, month_balances};
use crate::keys::KeyProvider;
use crate::monthly::{MonthBalances, MonthlyReport};
use crate::report::{AccountReference, CreditScoreReport, SignedReport};
use crate::signer;
use crate::transaction::Transaction;
use crate::types::UserId;
use crate::window::first_day_of_month;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything the data-fetch layer knows about the account itself,
/// independent of the transaction list.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub user_id: UserId,
    pub account_reference: AccountReference,
    /// Current booked balance at fetch time.
    pub balance: BigDecimal,
    pub credit_limit: Option<BigDecimal>,
    pub currency: String,
    pub last_data_fetch_time: DateTime<Utc>,
    pub account_holder: Option<String>,
}

/// Builds and signs reports with the keys of a [`KeyProvider`].
pub struct ReportAssembler<K: KeyProvider> {
    keys: K,
}

impl<K: KeyProvider> ReportAssembler<K> {
    pub fn new(keys: K) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Assemble the report for a snapshot and sign it.
    pub fn assemble(
        &self,
        snapshot: &AccountSnapshot,
        transactions: &[Transaction],
    ) -> crate::error::ReportResult<SignedReport> {
        let report = build_report(snapshot, transactions);
        let signature = signer::sign(&report, &self.keys)?;
        Ok(SignedReport { report, signature })
    }
}

/// Pure report construction, no signing.
///
/// An empty transaction list yields a report with no monthly records and
/// no newest/oldest dates; everything else comes from the snapshot.
pub fn build_report(snapshot: &AccountSnapshot, transactions: &[Transaction]) -> CreditScoreReport {
    let newest_transaction_date = transactions.iter().map(|t| t.date).max();
    let oldest_transaction_date = transactions.iter().map(|t| t.date).min();

    let history = balance_history(&snapshot.balance, transactions);
    let by_month = transactions_by_month(transactions);

    let credit_score_monthly = by_month
        .into_iter()
        .map(|(month_start, month_txns)| {
            // Every month key comes from a transaction date, so the
            // history has at least the boundary sample for it.
            let balances = month_balances(&history, month_start)
                .unwrap_or_else(|| flat_balances(&snapshot.balance));
            monthly_report(month_start, balances, &month_txns)
        })
        .collect();

    CreditScoreReport {
        id: Uuid::new_v4(),
        user_id: snapshot.user_id,
        account_reference: snapshot.account_reference.clone(),
        initial_balance: snapshot.balance.clone(),
        last_data_fetch_time: snapshot.last_data_fetch_time,
        currency: snapshot.currency.clone(),
        newest_transaction_date,
        oldest_transaction_date,
        credit_limit: snapshot.credit_limit.clone(),
        transactions_size: transactions.len() as u32,
        account_holder: snapshot.account_holder.clone(),
        credit_score_monthly,
    }
}

fn transactions_by_month(
    transactions: &[Transaction],
) -> BTreeMap<NaiveDate, Vec<&Transaction>> {
    let mut by_month: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        by_month.entry(first_day_of_month(tx.date)).or_default().push(tx);
    }
    by_month
}

fn monthly_report(
    month_start: NaiveDate,
    balances: MonthBalances,
    transactions: &[&Transaction],
) -> MonthlyReport {
    let incoming = transactions.iter().filter(|t| t.is_incoming()).count() as u32;
    let outgoing = transactions.len() as u32 - incoming;

    // Category amounts are magnitudes: sum the signed amounts per
    // category, then take the absolute value of the sum.
    let mut per_category: BTreeMap<crate::category::Category, (BigDecimal, u32)> = BTreeMap::new();
    for tx in transactions {
        let slot = per_category
            .entry(tx.category())
            .or_insert_with(|| (BigDecimal::zero(), 0));
        slot.0 += tx.amount.clone();
        slot.1 += 1;
    }

    MonthlyReport::build(
        month_start.year(),
        month_start.month(),
        balances,
        incoming,
        outgoing,
        per_category
            .into_iter()
            .map(|(category, (sum, count))| (category, sum.abs(), count)),
    )
}

/// Fallback for a month without balance samples: report the current
/// balance flat across the month rather than inventing movement.
fn flat_balances(balance: &BigDecimal) -> MonthBalances {
    MonthBalances {
        highest: balance.clone(),
        lowest: balance.clone(),
        average: balance.clone(),
    }
}
