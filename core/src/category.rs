//! The closed set of business categories a transaction can fall into.
//!
//! The set is versioned: adding a variant is safe, renaming or removing
//! one invalidates persisted reports that reference it by name.

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a category counts toward income or expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Loans,
    EquityFinancing,
    Revenue,
    TaxReturns,
    OtherIncome,

    InterestAndRepayments,
    Investments,
    FoodAndDrinks,
    VehicleAndDrivingExpenses,
    RentAndFacilities,
    TravelExpenses,
    MarketingAndPromotion,
    OtherOperatingCosts,
    Utilities,
    CollectionCosts,
    Salaries,
    PensionPayments,
    CorporateSavingsDeposits,
    EquityWithdrawal,
    SalesTax,
    PayrollTax,
    CorporateIncomeTax,
    UnspecifiedTax,
    OtherExpenses,
}

impl Category {
    pub const ALL: [Category; 24] = [
        Category::Loans,
        Category::EquityFinancing,
        Category::Revenue,
        Category::TaxReturns,
        Category::OtherIncome,
        Category::InterestAndRepayments,
        Category::Investments,
        Category::FoodAndDrinks,
        Category::VehicleAndDrivingExpenses,
        Category::RentAndFacilities,
        Category::TravelExpenses,
        Category::MarketingAndPromotion,
        Category::OtherOperatingCosts,
        Category::Utilities,
        Category::CollectionCosts,
        Category::Salaries,
        Category::PensionPayments,
        Category::CorporateSavingsDeposits,
        Category::EquityWithdrawal,
        Category::SalesTax,
        Category::PayrollTax,
        Category::CorporateIncomeTax,
        Category::UnspecifiedTax,
        Category::OtherExpenses,
    ];

    /// The label banks and category feeds use for this category.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::Loans => "Loans",
            Category::EquityFinancing => "Equity Financing",
            Category::Revenue => "Revenue",
            Category::TaxReturns => "Tax Returns",
            Category::OtherIncome => "Other Income",
            Category::InterestAndRepayments => "Interest and Repayments",
            Category::Investments => "Investments",
            Category::FoodAndDrinks => "Food and Drinks",
            Category::VehicleAndDrivingExpenses => "Vehicles and Driving Expenses",
            Category::RentAndFacilities => "Rent and Facilities",
            Category::TravelExpenses => "Travel Expenses",
            Category::MarketingAndPromotion => "Marketing and Promotion",
            Category::OtherOperatingCosts => "Other Operating Costs",
            Category::Utilities => "Utilities",
            Category::CollectionCosts => "Collection Costs",
            Category::Salaries => "Salaries",
            Category::PensionPayments => "Pension Payments",
            Category::CorporateSavingsDeposits => "Corporate Savings Deposits",
            Category::EquityWithdrawal => "Equity Withdrawal",
            Category::SalesTax => "Sales Tax",
            Category::PayrollTax => "Payroll Tax",
            Category::CorporateIncomeTax => "Corporate Income Tax",
            Category::UnspecifiedTax => "Unspecified Tax",
            Category::OtherExpenses => "Other Expenses",
        }
    }

    /// Stable identifier used in the database and serialized reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Loans => "LOANS",
            Category::EquityFinancing => "EQUITY_FINANCING",
            Category::Revenue => "REVENUE",
            Category::TaxReturns => "TAX_RETURNS",
            Category::OtherIncome => "OTHER_INCOME",
            Category::InterestAndRepayments => "INTEREST_AND_REPAYMENTS",
            Category::Investments => "INVESTMENTS",
            Category::FoodAndDrinks => "FOOD_AND_DRINKS",
            Category::VehicleAndDrivingExpenses => "VEHICLE_AND_DRIVING_EXPENSES",
            Category::RentAndFacilities => "RENT_AND_FACILITIES",
            Category::TravelExpenses => "TRAVEL_EXPENSES",
            Category::MarketingAndPromotion => "MARKETING_AND_PROMOTION",
            Category::OtherOperatingCosts => "OTHER_OPERATING_COSTS",
            Category::Utilities => "UTILITIES",
            Category::CollectionCosts => "COLLECTION_COSTS",
            Category::Salaries => "SALARIES",
            Category::PensionPayments => "PENSION_PAYMENTS",
            Category::CorporateSavingsDeposits => "CORPORATE_SAVINGS_DEPOSITS",
            Category::EquityWithdrawal => "EQUITY_WITHDRAWAL",
            Category::SalesTax => "SALES_TAX",
            Category::PayrollTax => "PAYROLL_TAX",
            Category::CorporateIncomeTax => "CORPORATE_INCOME_TAX",
            Category::UnspecifiedTax => "UNSPECIFIED_TAX",
            Category::OtherExpenses => "OTHER_EXPENSES",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Category::Loans
            | Category::EquityFinancing
            | Category::Revenue
            | Category::TaxReturns
            | Category::OtherIncome => Direction::Incoming,
            _ => Direction::Outgoing,
        }
    }

    pub fn is_income(self) -> bool {
        self.direction() == Direction::Incoming
    }

    pub fn is_expense(self) -> bool {
        !self.is_income()
    }

    /// Map a raw category label and signed amount to a category.
    ///
    /// Total function: an unknown or missing label falls back on the
    /// amount's sign (`> 0` is income, everything else an expense).
    pub fn classify(label: Option<&str>, amount: &BigDecimal) -> Category {
        if let Some(label) = label {
            for category in Category::ALL {
                if category.display_name().eq_ignore_ascii_case(label) {
                    return category;
                }
            }
        }

        if *amount > BigDecimal::zero() {
            Category::OtherIncome
        } else {
            Category::OtherExpenses
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}
