//! Running balance reconstruction.
//!
//! Banks report the account's current balance and a list of booked
//! transactions, not a balance per day. Walking the transactions newest
//! to oldest and subtracting each day's net amount rebuilds the balance
//! the account had before every transaction day.
//!
//! Transactions within one day are collapsed first: exact intra-day
//! ordering is not always supplied, so the balance is evaluated at end
//! of day rather than after each transaction.

use crate::money::round_half_up;
use crate::monthly::MonthBalances;
use crate::transaction::Transaction;
use crate::window::{first_day_of_month, last_day_of_month};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Balance the account held before the transactions of `date` were booked.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSample {
    pub date: NaiveDate,
    pub amount_before_transaction: BigDecimal,
}

/// Rebuild the balance history for a transaction list, newest first.
///
/// The current balance is anchored on the last day of the newest
/// transaction's month; each month boundary repeats the running balance
/// so every month with transactions has at least one sample.
///
/// Returns an empty history for an empty transaction list.
pub fn balance_history(
    current_balance: &BigDecimal,
    transactions: &[Transaction],
) -> Vec<BalanceSample> {
    let by_day = net_amount_per_day(transactions);
    let mut samples = Vec::new();

    let Some((&newest_day, _)) = by_day.iter().next_back() else {
        return samples;
    };

    let mut running = current_balance.clone();
    let mut last_seen_day = newest_day;
    samples.push(BalanceSample {
        date: last_day_of_month(newest_day),
        amount_before_transaction: running.clone(),
    });

    for (&day, net_amount) in by_day.iter().rev() {
        if first_day_of_month(day) != first_day_of_month(last_seen_day) {
            // Month boundary: carry the running balance into the older month.
            samples.push(BalanceSample {
                date: last_day_of_month(day),
                amount_before_transaction: running.clone(),
            });
        }
        running = running - net_amount;
        samples.push(BalanceSample {
            date: day,
            amount_before_transaction: running.clone(),
        });
        last_seen_day = day;
    }

    samples
}

/// Highest / lowest / average balance over the samples belonging to the
/// month containing `date`. `None` when no sample falls in that month.
pub fn month_balances(history: &[BalanceSample], date: NaiveDate) -> Option<MonthBalances> {
    let month_start = first_day_of_month(date);
    let in_month: Vec<&BigDecimal> = history
        .iter()
        .filter(|s| first_day_of_month(s.date) == month_start)
        .map(|s| &s.amount_before_transaction)
        .collect();

    let first = in_month.first()?;
    let mut highest = (*first).clone();
    let mut lowest = (*first).clone();
    let mut sum = BigDecimal::zero();

    for balance in &in_month {
        if **balance > highest {
            highest = (*balance).clone();
        }
        if **balance < lowest {
            lowest = (*balance).clone();
        }
        sum = sum + *balance;
    }

    let average = round_half_up(&(sum / BigDecimal::from(in_month.len() as u64)));
    Some(MonthBalances {
        highest,
        lowest,
        average,
    })
}

fn net_amount_per_day(transactions: &[Transaction]) -> BTreeMap<NaiveDate, BigDecimal> {
    let mut by_day: BTreeMap<NaiveDate, BigDecimal> = BTreeMap::new();
    for tx in transactions {
        let slot = by_day.entry(tx.date).or_insert_with(BigDecimal::zero);
        *slot = &*slot + &tx.amount;
    }
    by_day
}
