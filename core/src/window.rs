//! The rolling report window: the 12 most recent fully elapsed calendar
//! months relative to the report fetch time.
//!
//! The data source is assumed to provide more than 13 months of history.
//! That assumption is documented, not enforced: with fewer months the
//! indicators are computed over whatever is present and `months_covered`
//! says how much that was.

use crate::money::{round_half_up, zero_amount};
use crate::monthly::MonthlyReport;
use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub const TRANSACTION_WINDOW_MONTHS: u32 = 12;

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date) + Months::new(1) - Days::new(1)
}

/// First day of the oldest month in the window.
pub fn window_begin(report_fetch_time: NaiveDate) -> NaiveDate {
    first_day_of_month(report_fetch_time - Months::new(TRANSACTION_WINDOW_MONTHS))
}

/// Last day of the newest fully elapsed month.
pub fn window_end(report_fetch_time: NaiveDate) -> NaiveDate {
    last_day_of_month(report_fetch_time - Months::new(1))
}

/// Derived 12-month indicators. Never persisted; recomputed on demand
/// from the monthly report set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingWindowIndicators {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub incoming_transactions_size: u32,
    pub outgoing_transactions_size: u32,
    pub monthly_average_income: BigDecimal,
    pub monthly_average_cost: BigDecimal,
    pub total_income_amount: BigDecimal,
    pub total_outgoing_amount: BigDecimal,
    pub average_income_transaction_amount: BigDecimal,
    pub average_outcome_transaction_amount: BigDecimal,
    /// How many monthly records actually fell inside the window.
    pub months_covered: usize,
}

/// Select the monthly reports whose month lies inside the closed interval
/// `[begin, end]`, sorted ascending by `(year, month)`.
///
/// A month is inside iff its first day is. Both bounds are included.
/// `begin` must precede `end`; anything else is a programming error.
pub fn months_in_window<'a>(
    all_months: impl IntoIterator<Item = &'a MonthlyReport>,
    begin: NaiveDate,
    end: NaiveDate,
) -> Vec<&'a MonthlyReport> {
    assert!(
        begin < end,
        "window begin {begin} must be before window end {end}"
    );

    let mut selected: Vec<&MonthlyReport> = all_months
        .into_iter()
        .filter(|m| {
            let first = m.first_day();
            first >= begin && first <= end
        })
        .collect();
    // Summation is commutative; the ordering is for reproducibility.
    selected.sort_by_key(|m| (m.year, m.month));
    selected
}

/// Compute the rolling 12-month indicators for a report fetched at
/// `report_fetch_time`.
pub fn rolling_window_indicators(
    all_months: &[MonthlyReport],
    report_fetch_time: NaiveDate,
) -> RollingWindowIndicators {
    let begin = window_begin(report_fetch_time);
    let end = window_end(report_fetch_time);

    let selected = months_in_window(all_months, begin, end);
    let months_covered = selected.len();
    if months_covered < TRANSACTION_WINDOW_MONTHS as usize {
        log::warn!(
            "rolling window {begin}..{end} covers only {months_covered} month(s); \
             averages still divide by {TRANSACTION_WINDOW_MONTHS}"
        );
    }

    let mut incoming_transactions_size: u32 = 0;
    let mut outgoing_transactions_size: u32 = 0;
    let mut total_income = BigDecimal::zero();
    let mut total_outgoing = BigDecimal::zero();

    for month in &selected {
        incoming_transactions_size += month.incoming_transactions_size;
        outgoing_transactions_size += month.outgoing_transactions_size;
        total_income += month.total_incoming();
        total_outgoing += month.total_outgoing();
    }

    RollingWindowIndicators {
        start_date: begin,
        end_date: end,
        incoming_transactions_size,
        outgoing_transactions_size,
        monthly_average_income: average_monthly_amount(&total_income),
        monthly_average_cost: average_monthly_amount(&total_outgoing),
        total_income_amount: total_income.abs(),
        total_outgoing_amount: total_outgoing.abs(),
        average_income_transaction_amount: average_transaction_amount(
            &total_income,
            incoming_transactions_size,
        ),
        average_outcome_transaction_amount: average_transaction_amount(
            &total_outgoing,
            outgoing_transactions_size,
        ),
        months_covered,
    }
}

/// `|amount| / 12`, half-up to 2 decimals; exactly `0.00` for a zero sum
/// so a negative zero can never surface.
fn average_monthly_amount(amount: &BigDecimal) -> BigDecimal {
    if amount.is_zero() {
        return zero_amount();
    }
    round_half_up(&(amount / BigDecimal::from(TRANSACTION_WINDOW_MONTHS))).abs()
}

fn average_transaction_amount(amount: &BigDecimal, transaction_count: u32) -> BigDecimal {
    if transaction_count == 0 {
        return zero_amount();
    }
    round_half_up(&(amount / BigDecimal::from(transaction_count))).abs()
}
