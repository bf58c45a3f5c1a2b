//! Raw bank transactions as the data-fetch layer hands them over.

use crate::category::Category;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One booked transaction. Amounts are signed: positive is money in,
/// negative is money out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: BigDecimal,
    /// Category label supplied by the data source, if any.
    pub category_label: Option<String>,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: BigDecimal, category_label: Option<String>) -> Self {
        Self {
            date,
            amount,
            category_label,
        }
    }

    pub fn is_incoming(&self) -> bool {
        self.amount > BigDecimal::zero()
    }

    pub fn is_outgoing(&self) -> bool {
        !self.is_incoming()
    }

    pub fn category(&self) -> Category {
        Category::classify(self.category_label.as_deref(), &self.amount)
    }
}
