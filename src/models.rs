// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::LedgerError;
use crate::money::{percentage_of, round_money};

/// Closed set of values stored as their text code.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        LedgerError::validation(format!(
                            "Invalid {} '{}'",
                            stringify!($name),
                            s
                        ))
                    })
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|err: LedgerError| FromSqlError::Other(Box::new(err)))
            }
        }
    };
}

string_enum!(AccountType {
    Current => "CURRENT",
    Savings => "SAVINGS",
});

string_enum!(TransactionType {
    Income => "INCOME",
    Expense => "EXPENSE",
});

string_enum!(
    /// PENDING is the only non-terminal state.
    TransactionStatus {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
);

string_enum!(RecurringInterval {
    Daily => "DAILY",
    Weekly => "WEEKLY",
    Monthly => "MONTHLY",
    Yearly => "YEARLY",
});

string_enum!(TransactionCategory {
    Salary => "SALARY",
    Business => "BUSINESS",
    Investment => "INVESTMENT",
    Freelance => "FREELANCE",
    Rental => "RENTAL",
    Bonus => "BONUS",
    Refund => "REFUND",
    Gift => "GIFT",
    Food => "FOOD",
    Groceries => "GROCERIES",
    Transport => "TRANSPORT",
    Fuel => "FUEL",
    Bills => "BILLS",
    Rent => "RENT",
    Insurance => "INSURANCE",
    Healthcare => "HEALTHCARE",
    Shopping => "SHOPPING",
    Clothing => "CLOTHING",
    Entertainment => "ENTERTAINMENT",
    Education => "EDUCATION",
    Travel => "TRAVEL",
    Fitness => "FITNESS",
    PersonalCare => "PERSONAL_CARE",
    Subscriptions => "SUBSCRIPTIONS",
    Savings => "SAVINGS",
    Investments => "INVESTMENTS",
    LoanPayment => "LOAN_PAYMENT",
    CreditCard => "CREDIT_CARD",
    BankFees => "BANK_FEES",
    Taxes => "TAXES",
    Childcare => "CHILDCARE",
    PetCare => "PET_CARE",
    Charity => "CHARITY",
    GiftsGiven => "GIFTS_GIVEN",
    HomeImprovement => "HOME_IMPROVEMENT",
    Maintenance => "MAINTENANCE",
    Other => "OTHER",
});

string_enum!(Sector {
    Technology => "TECH",
    Financials => "FIN",
    Healthcare => "HC",
    Industrials => "IND",
    Consumer => "CONS",
    Energy => "EN",
    Other => "OTHER",
});

string_enum!(AlertType {
    PriceAbove => "PRICE_ABOVE",
    PriceBelow => "PRICE_BELOW",
});

string_enum!(AlertStatus {
    Active => "ACTIVE",
    Triggered => "TRIGGERED",
    Disabled => "DISABLED",
});

impl Default for TransactionCategory {
    fn default() -> Self {
        TransactionCategory::Other
    }
}

impl RecurringInterval {
    /// Fixed offset in days; months and years are not calendar-aware.
    pub fn days(&self) -> i64 {
        match self {
            RecurringInterval::Daily => 1,
            RecurringInterval::Weekly => 7,
            RecurringInterval::Monthly => 30,
            RecurringInterval::Yearly => 365,
        }
    }
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub r#type: AccountType,
    pub balance: Decimal,
    pub opening_balance: Decimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub category: TransactionCategory,
    pub status: TransactionStatus,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub next_recurring_date: Option<DateTime<Utc>>,
    pub last_processed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub amount: Decimal, // monthly ceiling
    pub last_alert_sent: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub sector: Sector,
    pub current_price: Decimal,
    pub previous_close: Decimal,
    pub market_cap: Option<i64>,
    pub website_url: Option<String>,
    pub is_active: bool,
    pub price_last_updated: DateTime<Utc>,
}

impl Stock {
    pub fn day_change(&self) -> Decimal {
        if self.previous_close.is_zero() {
            return Decimal::ZERO;
        }
        self.current_price - self.previous_close
    }

    pub fn day_change_percentage(&self) -> Decimal {
        percentage_of(self.day_change(), self.previous_close)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub id: String,
    pub user_id: String,
    pub stock_id: String,
    pub shares_owned: Decimal,
    pub purchase_price: Decimal, // weighted average cost
    pub purchase_date: NaiveDate,
    pub total_invested: Decimal,
    pub target_allocation_percentage: Option<Decimal>,
    pub notes: Option<String>,
    pub investment_thesis: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A holding joined with the stock it points at, plus the derived figures.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingValuation {
    pub holding: Holding,
    pub symbol: String,
    pub sector: Sector,
    pub current_price: Decimal,
    pub current_value: Decimal,
    pub unrealized_gain_loss: Decimal,
    pub unrealized_gain_loss_percentage: Decimal,
    pub day_change_value: Decimal,
}

impl HoldingValuation {
    /// Fails with [`LedgerError::Corrupt`] when the stored shares and price
    /// multiply past what a decimal can represent.
    pub fn new(holding: Holding, stock: &Stock) -> Result<Self, LedgerError> {
        let overflow = || {
            LedgerError::Corrupt(format!(
                "value of {} shares of {} overflows",
                holding.shares_owned, stock.symbol
            ))
        };
        let current_value = holding
            .shares_owned
            .checked_mul(stock.current_price)
            .ok_or_else(overflow)?;
        let day_change_value = holding
            .shares_owned
            .checked_mul(stock.day_change())
            .ok_or_else(overflow)?;
        let unrealized_gain_loss = current_value - holding.total_invested;
        Ok(Self {
            unrealized_gain_loss_percentage: percentage_of(
                unrealized_gain_loss,
                holding.total_invested,
            ),
            day_change_value,
            symbol: stock.symbol.clone(),
            sector: stock.sector,
            current_price: stock.current_price,
            current_value,
            unrealized_gain_loss,
            holding,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryFigures {
    pub total_invested: Decimal,
    pub current_portfolio_value: Decimal,
    pub total_gain_loss: Decimal,
    pub total_gain_loss_percentage: Decimal,
    pub day_change_value: Decimal,
    pub day_change_percentage: Decimal,
    pub number_of_holdings: i64,
    pub largest_holding_percentage: Decimal,
    pub sector_allocation: BTreeMap<Sector, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub figures: SummaryFigures,
    pub last_calculated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: String,
    pub user_id: String,
    pub stock_id: String,
    pub target_buy_price: Decimal,
    pub price_when_added: Option<Decimal>,
    pub planned_investment_amount: Option<Decimal>,
    pub email_alerts_enabled: bool,
    pub priority: i32,
    pub notes: Option<String>,
    pub watch_reason: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WishlistItem {
    pub fn price_change_since_added(&self, stock: &Stock) -> Decimal {
        match self.price_when_added {
            Some(added) if !added.is_zero() => stock.current_price - added,
            _ => Decimal::ZERO,
        }
    }

    pub fn price_change_percentage_since_added(&self, stock: &Stock) -> Decimal {
        match self.price_when_added {
            Some(added) => percentage_of(self.price_change_since_added(stock), added),
            None => Decimal::ZERO,
        }
    }

    pub fn distance_to_target(&self, stock: &Stock) -> Decimal {
        self.target_buy_price - stock.current_price
    }

    pub fn distance_to_target_percentage(&self, stock: &Stock) -> Decimal {
        percentage_of(self.distance_to_target(stock), stock.current_price)
    }

    pub fn should_trigger_alert(&self, stock: &Stock) -> bool {
        self.email_alerts_enabled && self.is_active && stock.current_price <= self.target_buy_price
    }

    pub fn planned_shares(&self) -> Option<Decimal> {
        let planned = self.planned_investment_amount?;
        if self.target_buy_price <= Decimal::ZERO {
            return None;
        }
        Some(round_money(planned / self.target_buy_price))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: String,
    pub wishlist_item_id: String,
    pub alert_type: AlertType,
    pub target_price: Decimal,
    pub actual_price: Decimal,
    pub status: AlertStatus,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stock(current: Decimal, previous: Decimal) -> Stock {
        Stock {
            id: "s1".into(),
            symbol: "ACME".into(),
            name: "Acme".into(),
            exchange: "NYSE".into(),
            sector: Sector::Industrials,
            current_price: current,
            previous_close: previous,
            market_cap: None,
            website_url: None,
            is_active: true,
            price_last_updated: Utc::now(),
        }
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("completed".parse::<TransactionStatus>().unwrap(), TransactionStatus::Completed);
        assert_eq!(" tech ".parse::<Sector>().unwrap(), Sector::Technology);
        assert_eq!(
            "personal_care".parse::<TransactionCategory>().unwrap(),
            TransactionCategory::PersonalCare
        );
        assert!("HOURLY".parse::<RecurringInterval>().is_err());
    }

    #[test]
    fn day_change_is_zero_without_previous_close() {
        let s = stock(dec!(12.5), Decimal::ZERO);
        assert_eq!(s.day_change(), Decimal::ZERO);
        assert_eq!(s.day_change_percentage(), Decimal::ZERO);

        let s = stock(dec!(110), dec!(100));
        assert_eq!(s.day_change(), dec!(10));
        assert_eq!(s.day_change_percentage(), dec!(10));
    }

    #[test]
    fn wishlist_alert_fires_at_or_below_target() {
        let s = stock(dec!(95), dec!(100));
        let mut item = WishlistItem {
            id: "w1".into(),
            user_id: "u1".into(),
            stock_id: "s1".into(),
            target_buy_price: dec!(95),
            price_when_added: Some(dec!(100)),
            planned_investment_amount: Some(dec!(950)),
            email_alerts_enabled: true,
            priority: 5,
            notes: None,
            watch_reason: None,
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(item.should_trigger_alert(&s));
        assert_eq!(item.price_change_percentage_since_added(&s), dec!(-5));
        assert_eq!(item.planned_shares(), Some(dec!(10)));
        item.email_alerts_enabled = false;
        assert!(!item.should_trigger_alert(&s));
    }

    #[test]
    fn valuation_guards_zero_investment() {
        let s = stock(dec!(120), dec!(118));
        let holding = Holding {
            id: "h1".into(),
            user_id: "u1".into(),
            stock_id: "s1".into(),
            shares_owned: dec!(10),
            purchase_price: dec!(100),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            total_invested: dec!(1000.00),
            target_allocation_percentage: None,
            notes: None,
            investment_thesis: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let v = HoldingValuation::new(holding.clone(), &s).unwrap();
        assert_eq!(v.current_value, dec!(1200));
        assert_eq!(v.unrealized_gain_loss, dec!(200));
        assert_eq!(v.unrealized_gain_loss_percentage, dec!(20));
        assert_eq!(v.day_change_value, dec!(20));

        let zero = Holding {
            total_invested: Decimal::ZERO,
            ..holding
        };
        let v = HoldingValuation::new(zero, &s).unwrap();
        assert_eq!(v.unrealized_gain_loss_percentage, Decimal::ZERO);
    }
}
