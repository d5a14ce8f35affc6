// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Accounts and the balance-mutation protocol.
//!
//! A balance only ever changes through [`apply_completed_transaction`], which
//! takes an open write unit so the read-check-write sequence cannot interleave
//! with another writer. The default-account flag is maintained by
//! clear-then-set inside one unit; the partial unique index
//! `idx_accounts_one_default` rejects any state with two defaults.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{decimal_at, fmt_ts, new_id, ts_at, write_unit};
use crate::errors::{LedgerError, Result};
use crate::models::{Account, AccountType, TransactionStatus, TransactionType};
use crate::money::{MAX_BALANCE, ensure_money_scale};

pub const MAX_ACCOUNTS_PER_USER: usize = 10;
const MAX_NAME_LEN: usize = 100;

const ACCOUNT_COLS: &str =
    "id, user_id, name, type, balance, opening_balance, is_default, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub r#type: AccountType,
    pub is_default: bool,
    pub opening_balance: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub r#type: Option<AccountType>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerIssue {
    BalanceDrift {
        account: String,
        stored: Decimal,
        expected: Decimal,
    },
    NegativeBalance {
        account: String,
        balance: Decimal,
    },
    DefaultCount {
        count: usize,
    },
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        r#type: r.get(3)?,
        balance: decimal_at(r, 4)?,
        opening_balance: decimal_at(r, 5)?,
        is_default: r.get(6)?,
        created_at: ts_at(r, 7)?,
        updated_at: ts_at(r, 8)?,
    })
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return Err(LedgerError::validation("account name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::validation(format!(
            "account name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

fn name_taken(conn: &Connection, user_id: &str, name: &str, except: Option<&str>) -> Result<bool> {
    let hit: Option<String> = conn
        .query_row(
            "SELECT id FROM accounts WHERE user_id=?1 AND name=?2 AND id<>?3",
            params![user_id, name, except.unwrap_or("")],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn count_accounts(conn: &Connection, user_id: &str) -> Result<usize> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE user_id=?1",
        params![user_id],
        |r| r.get(0),
    )?;
    Ok(n as usize)
}

fn clear_default(conn: &Connection, user_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET is_default=0, updated_at=?2 WHERE user_id=?1 AND is_default=1",
        params![user_id, fmt_ts(Utc::now())],
    )?;
    Ok(())
}

fn mark_default(conn: &Connection, account_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE accounts SET is_default=1, updated_at=?2 WHERE id=?1",
        params![account_id, fmt_ts(Utc::now())],
    )?;
    Ok(())
}

/// Oldest account of the user other than `account_id`.
fn oldest_sibling(conn: &Connection, user_id: &str, account_id: &str) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT id FROM accounts WHERE user_id=?1 AND id<>?2
             ORDER BY created_at, rowid LIMIT 1",
            params![user_id, account_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

fn promote_sibling(conn: &Connection, user_id: &str, account_id: &str) -> Result<()> {
    let sibling =
        oldest_sibling(conn, user_id, account_id)?.ok_or(LedgerError::DefaultRequired)?;
    clear_default(conn, user_id)?;
    mark_default(conn, &sibling)?;
    debug!(user_id, from = account_id, to = %sibling, "promoted default account");
    Ok(())
}

pub fn create_account(conn: &mut Connection, user_id: &str, new: NewAccount) -> Result<Account> {
    let name = normalize_name(&new.name)?;
    if new.opening_balance < Decimal::ZERO {
        return Err(LedgerError::validation("opening balance cannot be negative"));
    }
    if new.opening_balance > MAX_BALANCE {
        return Err(LedgerError::validation(format!(
            "opening balance cannot exceed {}",
            MAX_BALANCE
        )));
    }
    let opening = ensure_money_scale(new.opening_balance, "opening balance")?;

    let unit = write_unit(conn)?;
    let existing = count_accounts(&unit, user_id)?;
    if existing >= MAX_ACCOUNTS_PER_USER {
        warn!(user_id, existing, "account limit reached");
        return Err(LedgerError::MaxAccountsExceeded(MAX_ACCOUNTS_PER_USER));
    }
    if name_taken(&unit, user_id, &name, None)? {
        return Err(LedgerError::DuplicateName(name));
    }
    let make_default = new.is_default || existing == 0;
    if make_default {
        clear_default(&unit, user_id)?;
    }
    let id = new_id();
    let now = fmt_ts(Utc::now());
    unit.execute(
        "INSERT INTO accounts(id, user_id, name, type, balance, opening_balance, is_default,
                              created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?7)",
        params![id, user_id, name, new.r#type, opening.to_string(), make_default, now],
    )?;
    let account = get_account(&unit, user_id, &id)?;
    unit.commit()?;
    info!(user_id, account_id = %account.id, name = %account.name, is_default = make_default, "account created");
    Ok(account)
}

pub fn update_account(
    conn: &mut Connection,
    user_id: &str,
    account_id: &str,
    patch: AccountPatch,
) -> Result<Account> {
    let unit = write_unit(conn)?;
    let account = get_account(&unit, user_id, account_id)?;
    let now = fmt_ts(Utc::now());

    if let Some(raw) = patch.name.as_deref() {
        let name = normalize_name(raw)?;
        if name != account.name {
            if name_taken(&unit, user_id, &name, Some(account_id))? {
                return Err(LedgerError::DuplicateName(name));
            }
            unit.execute(
                "UPDATE accounts SET name=?2, updated_at=?3 WHERE id=?1",
                params![account_id, name, now],
            )?;
        }
    }
    if let Some(ty) = patch.r#type {
        unit.execute(
            "UPDATE accounts SET type=?2, updated_at=?3 WHERE id=?1",
            params![account_id, ty, now],
        )?;
    }
    match patch.is_default {
        Some(true) if !account.is_default => {
            clear_default(&unit, user_id)?;
            mark_default(&unit, account_id)?;
        }
        Some(false) if account.is_default => promote_sibling(&unit, user_id, account_id)?,
        _ => {}
    }

    let updated = get_account(&unit, user_id, account_id)?;
    unit.commit()?;
    info!(user_id, account_id, "account updated");
    Ok(updated)
}

/// Makes `account_id` the user's default. Already-default accounts are left untouched.
pub fn set_default_account(conn: &mut Connection, user_id: &str, account_id: &str) -> Result<Account> {
    let unit = write_unit(conn)?;
    let account = get_account(&unit, user_id, account_id)?;
    if account.is_default {
        return Ok(account);
    }
    clear_default(&unit, user_id)?;
    mark_default(&unit, account_id)?;
    let updated = get_account(&unit, user_id, account_id)?;
    unit.commit()?;
    info!(user_id, account_id, "default account switched");
    Ok(updated)
}

pub fn delete_account(conn: &mut Connection, user_id: &str, account_id: &str) -> Result<()> {
    let unit = write_unit(conn)?;
    let account = get_account(&unit, user_id, account_id)?;
    if count_accounts(&unit, user_id)? <= 1 {
        warn!(user_id, account_id, "refusing to delete the only account");
        return Err(LedgerError::SoleAccount);
    }
    let history: i64 = unit.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id=?1",
        params![account_id],
        |r| r.get(0),
    )?;
    if history > 0 {
        warn!(user_id, account_id, history, "refusing to delete account with history");
        return Err(LedgerError::HasTransactions);
    }
    if account.is_default {
        promote_sibling(&unit, user_id, account_id)?;
    }
    unit.execute("DELETE FROM accounts WHERE id=?1", params![account_id])?;
    unit.commit()?;
    info!(user_id, account_id, name = %account.name, "account deleted");
    Ok(())
}

pub fn list_accounts(conn: &Connection, user_id: &str) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM accounts WHERE user_id=?1 ORDER BY is_default DESC, created_at, rowid",
        ACCOUNT_COLS
    ))?;
    let accounts = stmt
        .query_map(params![user_id], account_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(accounts)
}

pub fn get_account(conn: &Connection, user_id: &str, account_id: &str) -> Result<Account> {
    conn.query_row(
        &format!(
            "SELECT {} FROM accounts WHERE id=?1 AND user_id=?2",
            ACCOUNT_COLS
        ),
        params![account_id, user_id],
        account_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Account", account_id))
}

/// Looks an account up by id, falling back to its (case-insensitive) name.
pub fn resolve_account(conn: &Connection, user_id: &str, key: &str) -> Result<Account> {
    let key = key.trim();
    let hit = conn
        .query_row(
            &format!(
                "SELECT {} FROM accounts WHERE user_id=?1 AND (id=?2 OR name=?3)",
                ACCOUNT_COLS
            ),
            params![user_id, key, key.to_lowercase()],
            account_from_row,
        )
        .optional()?;
    hit.ok_or_else(|| LedgerError::not_found("Account", key))
}

pub fn default_account(conn: &Connection, user_id: &str) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            &format!(
                "SELECT {} FROM accounts WHERE user_id=?1 AND is_default=1",
                ACCOUNT_COLS
            ),
            params![user_id],
            account_from_row,
        )
        .optional()?;
    Ok(account)
}

/// Applies a completed transaction's effect to the account balance and returns
/// the new balance. Requires an open write unit.
pub fn apply_completed_transaction(
    unit: &rusqlite::Transaction<'_>,
    account_id: &str,
    ty: TransactionType,
    amount: Decimal,
) -> Result<Decimal> {
    let balance = unit
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| decimal_at(r, 0),
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("Account", account_id))?;

    let new_balance = match ty {
        TransactionType::Income => {
            let next = balance.checked_add(amount).filter(|next| *next <= MAX_BALANCE);
            let Some(next) = next else {
                return Err(LedgerError::validation(format!(
                    "balance cannot exceed {}",
                    MAX_BALANCE
                )));
            };
            next
        }
        TransactionType::Expense => {
            if balance < amount {
                warn!(account_id, %balance, %amount, "insufficient funds");
                return Err(LedgerError::InsufficientFunds {
                    balance,
                    requested: amount,
                });
            }
            balance - amount
        }
    };

    unit.execute(
        "UPDATE accounts SET balance=?2, updated_at=?3 WHERE id=?1",
        params![account_id, new_balance.to_string(), fmt_ts(Utc::now())],
    )?;
    debug!(account_id, %ty, %amount, %balance, %new_balance, "ledger delta applied");
    Ok(new_balance)
}

/// Recomputes each account's balance from its completed history and reports
/// mismatches, negative balances, and default-flag violations.
pub fn verify_ledger(conn: &Connection, user_id: &str) -> Result<Vec<LedgerIssue>> {
    let accounts = list_accounts(conn, user_id)?;
    let mut issues = Vec::new();

    let defaults = accounts.iter().filter(|a| a.is_default).count();
    if !accounts.is_empty() && defaults != 1 {
        issues.push(LedgerIssue::DefaultCount { count: defaults });
    }

    let mut stmt = conn.prepare(
        "SELECT type, amount FROM transactions WHERE account_id=?1 AND status=?2",
    )?;
    for account in &accounts {
        let rows = stmt.query_map(params![account.id, TransactionStatus::Completed], |r| {
            Ok((r.get::<_, TransactionType>(0)?, decimal_at(r, 1)?))
        })?;
        let mut expected = account.opening_balance;
        for row in rows {
            let (ty, amount) = row?;
            match ty {
                TransactionType::Income => expected += amount,
                TransactionType::Expense => expected -= amount,
            }
        }
        if expected != account.balance {
            issues.push(LedgerIssue::BalanceDrift {
                account: account.name.clone(),
                stored: account.balance,
                expected,
            });
        }
        if account.balance < Decimal::ZERO {
            issues.push(LedgerIssue::NegativeBalance {
                account: account.name.clone(),
                balance: account.balance,
            });
        }
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn setup() -> (Connection, String) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let user = crate::users::ensure_user(&conn, "ada@example.com").unwrap();
        (conn, user.id)
    }

    fn new(name: &str) -> NewAccount {
        NewAccount {
            name: name.into(),
            r#type: AccountType::Current,
            is_default: false,
            opening_balance: Decimal::ZERO,
        }
    }

    #[test]
    fn first_account_is_forced_default() {
        let (mut conn, user) = setup();
        let a = create_account(&mut conn, &user, new("Main")).unwrap();
        assert!(a.is_default);
        assert_eq!(a.name, "main");
        let b = create_account(&mut conn, &user, new("Spare")).unwrap();
        assert!(!b.is_default);
    }

    #[test]
    fn names_are_unique_case_insensitively() {
        let (mut conn, user) = setup();
        create_account(&mut conn, &user, new("Main")).unwrap();
        let err = create_account(&mut conn, &user, new("  MAIN ")).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateName(_)));
    }

    #[test]
    fn opening_balance_is_validated() {
        let (mut conn, user) = setup();
        let mut bad = new("Main");
        bad.opening_balance = dec!(-1);
        assert!(matches!(
            create_account(&mut conn, &user, bad).unwrap_err(),
            LedgerError::Validation(_)
        ));
        let mut huge = new("Main");
        huge.opening_balance = MAX_BALANCE + dec!(0.01);
        assert!(create_account(&mut conn, &user, huge).is_err());
        assert!(list_accounts(&conn, &user).unwrap().is_empty());
    }

    #[test]
    fn resolve_accepts_id_or_name() {
        let (mut conn, user) = setup();
        let a = create_account(&mut conn, &user, new("Main")).unwrap();
        assert_eq!(resolve_account(&conn, &user, "MAIN").unwrap().id, a.id);
        assert_eq!(resolve_account(&conn, &user, &a.id).unwrap().id, a.id);
        assert!(matches!(
            resolve_account(&conn, &user, "nope").unwrap_err(),
            LedgerError::NotFound { .. }
        ));
    }
}
