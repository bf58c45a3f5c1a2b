//! One calendar month of a report.
//!
//! RULE: `total_incoming` / `total_outgoing` are never stored. They are
//! always derived from the category breakdown, so the two can never drift
//! apart.

use crate::category::Category;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Total and count for one category within one month.
///
/// `transaction_count` of zero is tolerated for legacy rows; new data
/// always carries a positive count alongside a nonzero amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedAmount {
    pub amount: BigDecimal,
    pub transaction_count: u32,
}

/// Highest / lowest / average balance observed within one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBalances {
    pub highest: BigDecimal,
    pub lowest: BigDecimal,
    pub average: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub highest_balance: BigDecimal,
    pub lowest_balance: BigDecimal,
    pub average_balance: BigDecimal,
    pub incoming_transactions_size: u32,
    pub outgoing_transactions_size: u32,
    pub categorized_amounts: BTreeMap<Category, CategorizedAmount>,
}

impl MonthlyReport {
    /// Build one month's record from immutable parts.
    ///
    /// The category inputs are folded into a single map; entries for the
    /// same category are merged by summing amount and count.
    pub fn build(
        year: i32,
        month: u32,
        balances: MonthBalances,
        incoming_transactions_size: u32,
        outgoing_transactions_size: u32,
        categorized: impl IntoIterator<Item = (Category, BigDecimal, u32)>,
    ) -> Self {
        assert!((1..=12).contains(&month), "month out of range: {month}");

        let categorized_amounts = categorized.into_iter().fold(
            BTreeMap::new(),
            |mut acc: BTreeMap<Category, CategorizedAmount>, (category, amount, count)| {
                let entry = acc.entry(category).or_insert_with(|| CategorizedAmount {
                    amount: BigDecimal::zero(),
                    transaction_count: 0,
                });
                entry.amount += amount;
                entry.transaction_count += count;
                acc
            },
        );

        Self {
            year,
            month,
            highest_balance: balances.highest,
            lowest_balance: balances.lowest,
            average_balance: balances.average,
            incoming_transactions_size,
            outgoing_transactions_size,
            categorized_amounts,
        }
    }

    /// First day of this report's calendar month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("(year, month) validated at construction")
    }

    pub fn total_incoming(&self) -> BigDecimal {
        self.directed_total(|c| c.is_income())
    }

    pub fn total_outgoing(&self) -> BigDecimal {
        self.directed_total(|c| c.is_expense())
    }

    fn directed_total(&self, keep: impl Fn(Category) -> bool) -> BigDecimal {
        self.categorized_amounts
            .iter()
            .filter(|(category, _)| keep(**category))
            .fold(BigDecimal::zero(), |acc, (_, ca)| acc + &ca.amount)
    }
}
