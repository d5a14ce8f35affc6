// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{decimal_at, fmt_ts, new_id, opt_ts_at, ts_at, write_unit};
use crate::errors::{LedgerError, Result};
use crate::models::{Budget, TransactionStatus, TransactionType};
use crate::money::{
    HUNDRED, MAX_BALANCE, ensure_at_most, ensure_money_scale, ensure_positive, percentage_of,
    round_money,
};
use crate::utils::first_of_month;

/// Minimum spacing between two budget alerts.
pub const ALERT_COOLDOWN_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize)]
pub struct UtilizationReport {
    pub budget_amount: Decimal,
    pub current_month_expenses: Decimal,
    pub remaining_budget: Decimal,
    pub utilization_percentage: Decimal,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub average_daily_spending: Decimal,
    pub projected_monthly_spending: Decimal,
    pub projected_utilization: Decimal,
    pub alert_threshold: Decimal,
    pub should_alert: bool,
    pub last_alert_sent: Option<DateTime<Utc>>,
}

fn budget_from_row(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        user_id: r.get(1)?,
        amount: decimal_at(r, 2)?,
        last_alert_sent: opt_ts_at(r, 3)?,
        created_at: ts_at(r, 4)?,
        updated_at: ts_at(r, 5)?,
    })
}

pub fn get_budget(conn: &Connection, user_id: &str) -> Result<Option<Budget>> {
    let budget = conn
        .query_row(
            "SELECT id, user_id, amount, last_alert_sent, created_at, updated_at
             FROM budgets WHERE user_id=?1",
            params![user_id],
            budget_from_row,
        )
        .optional()?;
    Ok(budget)
}

fn require_budget(conn: &Connection, user_id: &str) -> Result<Budget> {
    get_budget(conn, user_id)?.ok_or_else(|| LedgerError::not_found("Budget", user_id))
}

/// Creates the user's budget or replaces its amount.
pub fn set_budget(conn: &mut Connection, user_id: &str, amount: Decimal) -> Result<Budget> {
    ensure_positive(amount, "budget amount")?;
    ensure_at_most(amount, MAX_BALANCE, "budget amount")?;
    let amount = ensure_money_scale(amount, "budget amount")?;
    let now = fmt_ts(Utc::now());

    let unit = write_unit(conn)?;
    unit.execute(
        "INSERT INTO budgets(id, user_id, amount, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(user_id) DO UPDATE SET amount=excluded.amount, updated_at=excluded.updated_at",
        params![new_id(), user_id, amount.to_string(), now],
    )?;
    let budget = require_budget(&unit, user_id)?;
    unit.commit()?;
    info!(user_id, amount = %budget.amount, "budget set");
    Ok(budget)
}

/// Sum of completed expenses dated within `[first of month, as_of]`.
pub fn monthly_expenses(conn: &Connection, user_id: &str, as_of: DateTime<Utc>) -> Result<Decimal> {
    let start = first_of_month(as_of.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();
    let mut stmt = conn.prepare(
        "SELECT amount FROM transactions
         WHERE user_id=?1 AND type=?2 AND status=?3 AND date>=?4 AND date<=?5",
    )?;
    let rows = stmt.query_map(
        params![
            user_id,
            TransactionType::Expense,
            TransactionStatus::Completed,
            fmt_ts(start),
            fmt_ts(as_of)
        ],
        |r| decimal_at(r, 0),
    )?;
    let mut total = Decimal::ZERO;
    for amount in rows {
        total += amount?;
    }
    Ok(total)
}

/// Share of the budget consumed, capped at 100.
pub fn utilization(amount: Decimal, expenses: Decimal) -> Decimal {
    if amount.is_zero() {
        return Decimal::ZERO;
    }
    round_money(percentage_of(expenses, amount)).min(HUNDRED)
}

pub fn should_alert(
    budget: &Budget,
    utilization: Decimal,
    threshold: Decimal,
    now: DateTime<Utc>,
) -> bool {
    if utilization < threshold {
        return false;
    }
    match budget.last_alert_sent {
        Some(sent) => now - sent >= Duration::hours(ALERT_COOLDOWN_HOURS),
        None => true,
    }
}

/// Stamps the budget's alert time; callers invoke this after delivering an alert.
pub fn record_alert_sent(conn: &mut Connection, user_id: &str, now: DateTime<Utc>) -> Result<Budget> {
    let unit = write_unit(conn)?;
    let changed = unit.execute(
        "UPDATE budgets SET last_alert_sent=?2, updated_at=?3 WHERE user_id=?1",
        params![user_id, fmt_ts(now), fmt_ts(Utc::now())],
    )?;
    if changed == 0 {
        return Err(LedgerError::not_found("Budget", user_id));
    }
    let budget = require_budget(&unit, user_id)?;
    unit.commit()?;
    info!(user_id, sent_at = %now, "budget alert recorded");
    Ok(budget)
}

pub fn utilization_report(
    conn: &Connection,
    user_id: &str,
    as_of: DateTime<Utc>,
    threshold: Decimal,
) -> Result<UtilizationReport> {
    let budget = require_budget(conn, user_id)?;
    let expenses = monthly_expenses(conn, user_id, as_of)?;
    let utilization_percentage = utilization(budget.amount, expenses);

    let today = as_of.date_naive();
    let days_elapsed = today.day() - 1;
    let days_in_month = crate::utils::days_in_month(today.year(), today.month())
        .map_err(|e| LedgerError::validation(e.to_string()))?;
    let average_daily_spending = if days_elapsed == 0 {
        Decimal::ZERO
    } else {
        round_money(expenses / Decimal::from(days_elapsed))
    };
    let projected_monthly_spending =
        round_money(average_daily_spending * Decimal::from(days_in_month));
    let projected_utilization = if budget.amount.is_zero() {
        Decimal::ZERO
    } else {
        round_money(percentage_of(projected_monthly_spending, budget.amount))
    };

    let report = UtilizationReport {
        budget_amount: budget.amount,
        current_month_expenses: expenses,
        remaining_budget: budget.amount - expenses,
        utilization_percentage,
        days_elapsed,
        days_in_month,
        average_daily_spending,
        projected_monthly_spending,
        projected_utilization,
        alert_threshold: threshold,
        should_alert: should_alert(&budget, utilization_percentage, threshold, as_of),
        last_alert_sent: budget.last_alert_sent,
    };
    debug!(user_id, utilization = %report.utilization_percentage, projected = %report.projected_utilization, "budget utilization computed");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn budget(last_alert_sent: Option<DateTime<Utc>>) -> Budget {
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        Budget {
            id: "b1".into(),
            user_id: "u1".into(),
            amount: dec!(1000.00),
            last_alert_sent,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn utilization_is_capped_and_guarded() {
        assert_eq!(utilization(dec!(1000.00), dec!(850.00)), dec!(85.00));
        assert_eq!(utilization(dec!(1000.00), dec!(1500.00)), dec!(100));
        assert_eq!(utilization(Decimal::ZERO, dec!(50.00)), Decimal::ZERO);
        assert_eq!(utilization(dec!(300.00), dec!(100.00)), dec!(33.33));
    }

    #[test]
    fn alert_needs_threshold_and_cooldown() {
        let now = Utc.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap();
        assert!(!should_alert(&budget(None), dec!(79.99), dec!(80), now));
        assert!(should_alert(&budget(None), dec!(80), dec!(80), now));

        let recent = budget(Some(now - Duration::hours(23)));
        assert!(!should_alert(&recent, dec!(95), dec!(80), now));
        let stale = budget(Some(now - Duration::hours(24)));
        assert!(should_alert(&stale, dec!(95), dec!(80), now));
    }
}
