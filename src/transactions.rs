// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction lifecycle.
//!
//! Status changes go through [`transition`], a pure function that returns the
//! next state together with the side effects it requires. Callers run those
//! effects and persist the new status inside the same write unit, so a failed
//! effect (insufficient funds) leaves the row untouched.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::{decimal_at, fmt_ts, new_id, opt_ts_at, ts_at, write_unit};
use crate::errors::{LedgerError, Result};
use crate::ledger::{self, apply_completed_transaction};
use crate::models::{
    RecurringInterval, Transaction, TransactionCategory, TransactionStatus, TransactionType,
};
use crate::money::{MAX_BALANCE, ensure_at_most, ensure_money_scale, ensure_positive};

pub const MAX_DESCRIPTION_LEN: usize = 500;
/// Upper bound on occurrences generated for one template in a single run.
pub const MAX_CATCH_UP: usize = 366;

const TX_COLS: &str = "id, user_id, account_id, type, amount, description, date, category, status, \
     is_recurring, recurring_interval, next_recurring_date, last_processed, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ApplyLedgerDelta {
        account_id: String,
        r#type: TransactionType,
        amount: Decimal,
    },
}

/// Computes the result of moving `tx` to `to`. Same-state requests are no-ops.
pub fn transition(
    tx: &Transaction,
    to: TransactionStatus,
) -> Result<(Transaction, Vec<Effect>)> {
    use TransactionStatus::*;

    if tx.status == to {
        return Ok((tx.clone(), Vec::new()));
    }
    let effects = match (tx.status, to) {
        (Pending, Completed) => vec![Effect::ApplyLedgerDelta {
            account_id: tx.account_id.clone(),
            r#type: tx.r#type,
            amount: tx.amount,
        }],
        (Pending, Failed) => Vec::new(),
        (status, requested) => {
            return Err(LedgerError::AlreadyTerminal {
                id: tx.id.clone(),
                status,
                requested,
            });
        }
    };
    let mut next = tx.clone();
    next.status = to;
    Ok((next, effects))
}

fn run_effects(unit: &rusqlite::Transaction<'_>, effects: &[Effect]) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::ApplyLedgerDelta {
                account_id,
                r#type,
                amount,
            } => {
                apply_completed_transaction(unit, account_id, *r#type, *amount)?;
            }
        }
    }
    Ok(())
}

pub fn next_occurrence(date: DateTime<Utc>, interval: RecurringInterval) -> DateTime<Utc> {
    date + Duration::days(interval.days())
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Account id; the user's default account when absent.
    pub account: Option<String>,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub category: TransactionCategory,
    pub status: TransactionStatus,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub next_recurring_date: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn new(r#type: TransactionType, amount: Decimal, date: DateTime<Utc>) -> Self {
        Self {
            account: None,
            r#type,
            amount,
            description: None,
            date,
            category: TransactionCategory::default(),
            status: TransactionStatus::Pending,
            is_recurring: false,
            recurring_interval: None,
            next_recurring_date: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub account: Option<String>,
    pub r#type: Option<TransactionType>,
    pub amount: Option<Decimal>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<TransactionCategory>,
    pub is_recurring: Option<bool>,
    pub recurring_interval: Option<RecurringInterval>,
    pub next_recurring_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<String>,
    pub r#type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    /// First day of the month to restrict to.
    pub month: Option<NaiveDate>,
    pub limit: Option<usize>,
}

fn tx_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        user_id: r.get(1)?,
        account_id: r.get(2)?,
        r#type: r.get(3)?,
        amount: decimal_at(r, 4)?,
        description: r.get(5)?,
        date: ts_at(r, 6)?,
        category: r.get(7)?,
        status: r.get(8)?,
        is_recurring: r.get(9)?,
        recurring_interval: r.get(10)?,
        next_recurring_date: opt_ts_at(r, 11)?,
        last_processed: opt_ts_at(r, 12)?,
        created_at: ts_at(r, 13)?,
        updated_at: ts_at(r, 14)?,
    })
}

fn validate_amount(amount: Decimal) -> Result<Decimal> {
    ensure_positive(amount, "amount")?;
    ensure_at_most(amount, MAX_BALANCE, "amount")?;
    ensure_money_scale(amount, "amount")
}

fn validate_description(description: Option<String>) -> Result<Option<String>> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if let Some(d) = &description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(LedgerError::validation(format!(
                "description cannot exceed {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
    }
    Ok(description)
}

/// Enforces that an interval is present exactly when the row recurs, and
/// derives the next occurrence when none was supplied.
fn validate_schedule(
    date: DateTime<Utc>,
    is_recurring: bool,
    interval: Option<RecurringInterval>,
    next: Option<DateTime<Utc>>,
) -> Result<Option<DateTime<Utc>>> {
    match (is_recurring, interval) {
        (true, None) => Err(LedgerError::validation(
            "Recurring interval is required for recurring transactions",
        )),
        (false, Some(_)) => Err(LedgerError::validation(
            "Recurring interval should not be set for non-recurring transactions",
        )),
        (true, Some(interval)) => Ok(Some(next.unwrap_or_else(|| next_occurrence(date, interval)))),
        (false, None) => Ok(None),
    }
}

fn insert(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO transactions({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            TX_COLS
        ),
        params![
            tx.id,
            tx.user_id,
            tx.account_id,
            tx.r#type,
            tx.amount.to_string(),
            tx.description,
            fmt_ts(tx.date),
            tx.category,
            tx.status,
            tx.is_recurring,
            tx.recurring_interval,
            tx.next_recurring_date.map(fmt_ts),
            tx.last_processed.map(fmt_ts),
            fmt_ts(tx.created_at),
            fmt_ts(tx.updated_at),
        ],
    )?;
    Ok(())
}

fn store_status(conn: &Connection, tx_id: &str, status: TransactionStatus) -> Result<()> {
    conn.execute(
        "UPDATE transactions SET status=?2, updated_at=?3 WHERE id=?1",
        params![tx_id, status, fmt_ts(Utc::now())],
    )?;
    Ok(())
}

pub fn get_transaction(conn: &Connection, user_id: &str, tx_id: &str) -> Result<Transaction> {
    conn.query_row(
        &format!(
            "SELECT {} FROM transactions WHERE id=?1 AND user_id=?2",
            TX_COLS
        ),
        params![tx_id, user_id],
        tx_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Transaction", tx_id))
}

/// Validates and records a transaction. One created directly as COMPLETED
/// applies its ledger effect in the same unit as the insert.
pub fn post_transaction(
    conn: &mut Connection,
    user_id: &str,
    new: NewTransaction,
) -> Result<Transaction> {
    let amount = validate_amount(new.amount)?;
    let description = validate_description(new.description)?;
    let next_recurring_date = validate_schedule(
        new.date,
        new.is_recurring,
        new.recurring_interval,
        new.next_recurring_date,
    )?;

    let unit = write_unit(conn)?;
    let account = match new.account.as_deref() {
        Some(id) => ledger::get_account(&unit, user_id, id)?,
        None => ledger::default_account(&unit, user_id)?
            .ok_or_else(|| LedgerError::not_found("Account", "default"))?,
    };

    let now = Utc::now();
    let pending = Transaction {
        id: new_id(),
        user_id: user_id.to_string(),
        account_id: account.id,
        r#type: new.r#type,
        amount,
        description,
        date: new.date,
        category: new.category,
        status: TransactionStatus::Pending,
        is_recurring: new.is_recurring,
        recurring_interval: new.recurring_interval,
        next_recurring_date,
        last_processed: None,
        created_at: now,
        updated_at: now,
    };
    insert(&unit, &pending)?;

    let (tx, effects) = transition(&pending, new.status)?;
    run_effects(&unit, &effects)?;
    if tx.status != pending.status {
        store_status(&unit, &tx.id, tx.status)?;
    }
    unit.commit()?;
    info!(user_id, tx_id = %tx.id, ty = %tx.r#type, amount = %tx.amount, status = %tx.status, "transaction posted");
    Ok(tx)
}

pub fn set_transaction_status(
    conn: &mut Connection,
    user_id: &str,
    tx_id: &str,
    status: TransactionStatus,
) -> Result<Transaction> {
    let unit = write_unit(conn)?;
    let current = get_transaction(&unit, user_id, tx_id)?;
    let (next, effects) = match transition(&current, status) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(user_id, tx_id, from = %current.status, to = %status, "status change rejected");
            return Err(err);
        }
    };
    if next.status == current.status {
        debug!(user_id, tx_id, %status, "status unchanged");
        return Ok(current);
    }
    run_effects(&unit, &effects)?;
    store_status(&unit, tx_id, next.status)?;
    let stored = get_transaction(&unit, user_id, tx_id)?;
    unit.commit()?;
    info!(user_id, tx_id, from = %current.status, to = %status, "transaction status changed");
    Ok(stored)
}

pub fn update_transaction(
    conn: &mut Connection,
    user_id: &str,
    tx_id: &str,
    patch: TransactionPatch,
) -> Result<Transaction> {
    let unit = write_unit(conn)?;
    let current = get_transaction(&unit, user_id, tx_id)?;

    if current.status == TransactionStatus::Completed {
        let amount_changed = patch.amount.is_some_and(|a| a != current.amount);
        let type_changed = patch.r#type.is_some_and(|t| t != current.r#type);
        let account_changed = patch
            .account
            .as_deref()
            .is_some_and(|a| a != current.account_id);
        if amount_changed || type_changed || account_changed {
            warn!(user_id, tx_id, "edit of completed transaction rejected");
            return Err(LedgerError::CompletedImmutable(tx_id.to_string()));
        }
    }

    let mut tx = current.clone();
    if let Some(amount) = patch.amount {
        tx.amount = validate_amount(amount)?;
    }
    if let Some(ty) = patch.r#type {
        tx.r#type = ty;
    }
    if let Some(account) = patch.account.as_deref() {
        tx.account_id = ledger::get_account(&unit, user_id, account)?.id;
    }
    if let Some(description) = patch.description {
        tx.description = validate_description(Some(description))?;
    }
    if let Some(category) = patch.category {
        tx.category = category;
    }
    let schedule_touched = patch.date.is_some()
        || patch.is_recurring.is_some()
        || patch.recurring_interval.is_some();
    if let Some(date) = patch.date {
        tx.date = date;
    }
    tx.is_recurring = patch.is_recurring.unwrap_or(current.is_recurring);
    tx.recurring_interval = match (patch.is_recurring, patch.recurring_interval) {
        (Some(false), interval) => interval,
        (_, Some(interval)) => Some(interval),
        (_, None) => current.recurring_interval,
    };
    let supplied_next = patch
        .next_recurring_date
        .or(if schedule_touched { None } else { current.next_recurring_date });
    tx.next_recurring_date =
        validate_schedule(tx.date, tx.is_recurring, tx.recurring_interval, supplied_next)?;
    tx.updated_at = Utc::now();

    unit.execute(
        "UPDATE transactions SET account_id=?2, type=?3, amount=?4, description=?5, date=?6,
                category=?7, is_recurring=?8, recurring_interval=?9, next_recurring_date=?10,
                updated_at=?11
         WHERE id=?1",
        params![
            tx.id,
            tx.account_id,
            tx.r#type,
            tx.amount.to_string(),
            tx.description,
            fmt_ts(tx.date),
            tx.category,
            tx.is_recurring,
            tx.recurring_interval,
            tx.next_recurring_date.map(fmt_ts),
            fmt_ts(tx.updated_at),
        ],
    )?;
    unit.commit()?;
    info!(user_id, tx_id, "transaction updated");
    Ok(tx)
}

pub fn delete_transaction(conn: &mut Connection, user_id: &str, tx_id: &str) -> Result<()> {
    let unit = write_unit(conn)?;
    let tx = get_transaction(&unit, user_id, tx_id)?;
    if tx.status == TransactionStatus::Completed {
        warn!(user_id, tx_id, "delete of completed transaction rejected");
        return Err(LedgerError::CompletedImmutable(tx_id.to_string()));
    }
    unit.execute("DELETE FROM transactions WHERE id=?1", params![tx_id])?;
    unit.commit()?;
    info!(user_id, tx_id, "transaction deleted");
    Ok(())
}

pub fn list_transactions(
    conn: &Connection,
    user_id: &str,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {} FROM transactions WHERE user_id=?", TX_COLS);
    let mut params_vec: Vec<String> = vec![user_id.to_string()];

    if let Some(account) = &filter.account_id {
        sql.push_str(" AND account_id=?");
        params_vec.push(account.clone());
    }
    if let Some(ty) = filter.r#type {
        sql.push_str(" AND type=?");
        params_vec.push(ty.as_str().to_string());
    }
    if let Some(status) = filter.status {
        sql.push_str(" AND status=?");
        params_vec.push(status.as_str().to_string());
    }
    if let Some(month) = filter.month {
        let start = month.and_time(NaiveTime::MIN).and_utc();
        let end = month
            .checked_add_months(Months::new(1))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| LedgerError::validation(format!("month {} out of range", month)))?;
        sql.push_str(" AND date>=? AND date<?");
        params_vec.push(fmt_ts(start));
        params_vec.push(fmt_ts(end));
    }
    sql.push_str(" ORDER BY date DESC, created_at DESC, rowid DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params_vec.iter()), tx_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// One untyped input row as handed over by an importer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub date: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub amount: String,
    pub category: String,
    pub account: String,
    pub description: String,
    pub status: String,
    pub recurring_interval: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1-based position in the batch.
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub created: Vec<Transaction>,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| {
            LedgerError::validation(format!(
                "invalid date '{}', expected YYYY-MM-DD or RFC 3339",
                raw
            ))
        })
}

fn parse_row(conn: &Connection, user_id: &str, raw: &RawRow) -> Result<NewTransaction> {
    let date = parse_when(&raw.date)?;
    let r#type: TransactionType = raw.r#type.parse()?;
    let amount = Decimal::from_str_exact(raw.amount.trim())
        .map_err(|_| LedgerError::validation(format!("invalid amount '{}'", raw.amount)))?;

    let mut new = NewTransaction::new(r#type, amount, date);
    if !raw.category.trim().is_empty() {
        new.category = raw.category.parse()?;
    }
    if !raw.status.trim().is_empty() {
        new.status = raw.status.parse()?;
    }
    if !raw.recurring_interval.trim().is_empty() {
        new.is_recurring = true;
        new.recurring_interval = Some(raw.recurring_interval.parse()?);
    }
    if !raw.account.trim().is_empty() {
        new.account = Some(ledger::resolve_account(conn, user_id, &raw.account)?.id);
    }
    new.description = Some(raw.description.clone());
    Ok(new)
}

/// Validates and posts each row independently; a failing row is reported and
/// never affects its siblings.
pub fn import_transactions(conn: &mut Connection, user_id: &str, rows: Vec<RawRow>) -> ImportReport {
    let mut report = ImportReport::default();
    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 1;
        let outcome = parse_row(conn, user_id, raw).and_then(|new| post_transaction(conn, user_id, new));
        match outcome {
            Ok(tx) => report.created.push(tx),
            Err(err) => {
                warn!(user_id, row, error = %err, "import row rejected");
                report.errors.push(RowError {
                    row,
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        user_id,
        created = report.created_count(),
        errors = report.error_count(),
        "import finished"
    );
    report
}

/// Materializes every due occurrence of the user's recurring transactions as a
/// PENDING one-off row and advances each template's schedule.
pub fn process_recurring(
    conn: &mut Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Transaction>> {
    let unit = write_unit(conn)?;
    let templates = {
        let mut stmt = unit.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE user_id=?1 AND is_recurring=1 AND status<>?2
               AND next_recurring_date IS NOT NULL AND next_recurring_date<=?3
             ORDER BY next_recurring_date, rowid",
            TX_COLS
        ))?;
        let rows = stmt
            .query_map(
                params![user_id, TransactionStatus::Failed, fmt_ts(now)],
                tx_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let mut created = Vec::new();
    for template in templates {
        let (Some(interval), Some(mut due)) =
            (template.recurring_interval, template.next_recurring_date)
        else {
            continue;
        };
        let mut generated = 0;
        while due <= now && generated < MAX_CATCH_UP {
            let stamp = Utc::now();
            let occurrence = Transaction {
                id: new_id(),
                date: due,
                status: TransactionStatus::Pending,
                is_recurring: false,
                recurring_interval: None,
                next_recurring_date: None,
                last_processed: None,
                created_at: stamp,
                updated_at: stamp,
                ..template.clone()
            };
            insert(&unit, &occurrence)?;
            created.push(occurrence);
            due = next_occurrence(due, interval);
            generated += 1;
        }
        if generated == MAX_CATCH_UP && due <= now {
            warn!(user_id, tx_id = %template.id, "recurring catch-up truncated");
        }
        unit.execute(
            "UPDATE transactions SET next_recurring_date=?2, last_processed=?3, updated_at=?3
             WHERE id=?1",
            params![template.id, fmt_ts(due), fmt_ts(now)],
        )?;
        debug!(user_id, tx_id = %template.id, generated, next = %due, "recurring template advanced");
    }
    unit.commit()?;
    if !created.is_empty() {
        info!(user_id, created = created.len(), "recurring transactions generated");
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tx(status: TransactionStatus) -> Transaction {
        let at = Utc.with_ymd_and_hms(2025, 8, 10, 12, 0, 0).unwrap();
        Transaction {
            id: "t1".into(),
            user_id: "u1".into(),
            account_id: "a1".into(),
            r#type: TransactionType::Expense,
            amount: dec!(42.00),
            description: None,
            date: at,
            category: TransactionCategory::Food,
            status,
            is_recurring: false,
            recurring_interval: None,
            next_recurring_date: None,
            last_processed: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn completing_a_pending_transaction_emits_one_delta() {
        let (next, effects) = transition(&tx(TransactionStatus::Pending), TransactionStatus::Completed).unwrap();
        assert_eq!(next.status, TransactionStatus::Completed);
        assert_eq!(
            effects,
            vec![Effect::ApplyLedgerDelta {
                account_id: "a1".into(),
                r#type: TransactionType::Expense,
                amount: dec!(42.00),
            }]
        );
    }

    #[test]
    fn failing_has_no_effects() {
        let (next, effects) = transition(&tx(TransactionStatus::Pending), TransactionStatus::Failed).unwrap();
        assert_eq!(next.status, TransactionStatus::Failed);
        assert!(effects.is_empty());
    }

    #[test]
    fn same_state_is_a_no_op() {
        for status in TransactionStatus::ALL {
            let (next, effects) = transition(&tx(*status), *status).unwrap();
            assert_eq!(next.status, *status);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn terminal_states_reject_changes() {
        let err = transition(&tx(TransactionStatus::Completed), TransactionStatus::Failed).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyTerminal { .. }));
        let err = transition(&tx(TransactionStatus::Failed), TransactionStatus::Completed).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyTerminal { .. }));
        let err = transition(&tx(TransactionStatus::Completed), TransactionStatus::Pending).unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyTerminal { .. }));
    }

    #[test]
    fn schedule_offsets_are_fixed() {
        let start = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        assert_eq!(
            next_occurrence(start, RecurringInterval::Monthly),
            Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(
            next_occurrence(start, RecurringInterval::Yearly),
            Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            next_occurrence(start, RecurringInterval::Weekly),
            Utc.with_ymd_and_hms(2025, 2, 7, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn schedule_requires_interval_iff_recurring() {
        let at = Utc::now();
        assert!(validate_schedule(at, true, None, None).is_err());
        assert!(validate_schedule(at, false, Some(RecurringInterval::Daily), None).is_err());
        assert_eq!(validate_schedule(at, false, None, None).unwrap(), None);
        assert_eq!(
            validate_schedule(at, true, Some(RecurringInterval::Daily), None).unwrap(),
            Some(at + Duration::days(1))
        );
    }

    #[test]
    fn amounts_must_be_positive_cents() {
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-5)).is_err());
        assert!(validate_amount(dec!(0.001)).is_err());
        assert_eq!(validate_amount(dec!(0.01)).unwrap(), dec!(0.01));
        assert_eq!(validate_amount(MAX_BALANCE).unwrap(), MAX_BALANCE);
        assert!(matches!(
            validate_amount(MAX_BALANCE + dec!(0.01)),
            Err(LedgerError::Validation(_))
        ));
        assert!(validate_amount(Decimal::MAX).is_err());
    }
}
