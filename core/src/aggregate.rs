//! Per-category aggregation over a closed date window.

use crate::category::{Category, Direction};
use crate::money::{truncate_cents, zero_amount};
use crate::monthly::MonthlyReport;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One dated, already categorized amount: the unit of aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedEntry {
    pub date: NaiveDate,
    pub category: Category,
    pub amount: BigDecimal,
    pub transaction_count: u32,
}

/// Per-category summary handed to presentation and export layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: Category,
    pub direction: Direction,
    pub total_transactions: u32,
    pub total_transaction_amount: BigDecimal,
    pub average_transaction_amount: BigDecimal,
}

/// Group categorized amounts falling inside `[begin, end]` (both bounds
/// included) by category.
///
/// The average is `total / count`, truncated toward zero at 2 decimals,
/// or `0.00` when the count is zero. Amounts keep the sign they came
/// with.
pub fn aggregate_categories(
    entries: impl IntoIterator<Item = CategorizedEntry>,
    begin: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<Category, CategorySummary> {
    let mut grouped: BTreeMap<Category, (BigDecimal, u32)> = BTreeMap::new();

    for entry in entries {
        if entry.date < begin || entry.date > end {
            continue;
        }
        let slot = grouped
            .entry(entry.category)
            .or_insert_with(|| (BigDecimal::zero(), 0));
        slot.0 += entry.amount;
        slot.1 += entry.transaction_count;
    }

    grouped
        .into_iter()
        .map(|(category, (total, count))| {
            let average = if count == 0 {
                zero_amount()
            } else {
                truncate_cents(&(&total / BigDecimal::from(count)))
            };
            (
                category,
                CategorySummary {
                    category,
                    direction: category.direction(),
                    total_transactions: count,
                    total_transaction_amount: total,
                    average_transaction_amount: average,
                },
            )
        })
        .collect()
}

/// Flatten a monthly report set into categorized entries dated on the
/// first day of their month, ready for [`aggregate_categories`].
pub fn month_entries(months: &[MonthlyReport]) -> Vec<CategorizedEntry> {
    months
        .iter()
        .flat_map(|month| {
            let date = month.first_day();
            month
                .categorized_amounts
                .iter()
                .map(move |(category, ca)| CategorizedEntry {
                    date,
                    category: *category,
                    amount: ca.amount.clone(),
                    transaction_count: ca.transaction_count,
                })
        })
        .collect()
}
