// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, TransactionBehavior};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Fundfolio", "fundfolio"));

pub const DB_FILE: &str = "fundfolio.sqlite";

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join(DB_FILE))
}

/// Opens (creating if needed) the database at `path` and brings the schema up.
pub fn open_at(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(busy_timeout)?;
    // WAL is unavailable for in-memory databases; the pragma answers with the mode in use.
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
    tracing::debug!(path = %path.display(), journal_mode = %mode, "opened database");
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('CURRENT','SAVINGS')),
        balance TEXT NOT NULL,
        opening_balance TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(user_id, name),
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_one_default
        ON accounts(user_id) WHERE is_default = 1;

    CREATE TABLE IF NOT EXISTS transactions(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        account_id TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('INCOME','EXPENSE')),
        amount TEXT NOT NULL,
        description TEXT,
        date TEXT NOT NULL,
        category TEXT NOT NULL DEFAULT 'OTHER',
        status TEXT NOT NULL DEFAULT 'PENDING'
            CHECK(status IN ('PENDING','COMPLETED','FAILED')),
        is_recurring INTEGER NOT NULL DEFAULT 0,
        recurring_interval TEXT,
        next_recurring_date TEXT,
        last_processed TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK((is_recurring = 1) = (recurring_interval IS NOT NULL)),
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
    CREATE INDEX IF NOT EXISTS idx_transactions_user_type_status
        ON transactions(user_id, type, status);

    CREATE TABLE IF NOT EXISTS budgets(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE,
        amount TEXT NOT NULL,
        last_alert_sent TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS stocks(
        id TEXT PRIMARY KEY,
        symbol TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        exchange TEXT NOT NULL,
        sector TEXT NOT NULL DEFAULT 'OTHER',
        current_price TEXT NOT NULL,
        previous_close TEXT NOT NULL,
        market_cap INTEGER,
        website_url TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        price_last_updated TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS holdings(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        stock_id TEXT NOT NULL,
        shares_owned TEXT NOT NULL,
        purchase_price TEXT NOT NULL,
        purchase_date TEXT NOT NULL,
        total_invested TEXT NOT NULL,
        target_allocation_percentage TEXT,
        notes TEXT,
        investment_thesis TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(stock_id) REFERENCES stocks(id) ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_holdings_one_active
        ON holdings(user_id, stock_id) WHERE is_active = 1;

    CREATE TABLE IF NOT EXISTS portfolio_summaries(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE,
        total_invested TEXT NOT NULL,
        current_portfolio_value TEXT NOT NULL,
        total_gain_loss TEXT NOT NULL,
        total_gain_loss_percentage TEXT NOT NULL,
        day_change_value TEXT NOT NULL,
        day_change_percentage TEXT NOT NULL,
        number_of_holdings INTEGER NOT NULL,
        largest_holding_percentage TEXT NOT NULL,
        sector_allocation TEXT NOT NULL DEFAULT '{}',
        last_calculated TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS wishlist(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        stock_id TEXT NOT NULL,
        target_buy_price TEXT NOT NULL,
        price_when_added TEXT,
        planned_investment_amount TEXT,
        email_alerts_enabled INTEGER NOT NULL DEFAULT 1,
        priority INTEGER NOT NULL DEFAULT 5 CHECK(priority BETWEEN 1 AND 10),
        notes TEXT,
        watch_reason TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
        FOREIGN KEY(stock_id) REFERENCES stocks(id) ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_wishlist_one_active
        ON wishlist(user_id, stock_id) WHERE is_active = 1;

    CREATE TABLE IF NOT EXISTS price_alerts(
        id TEXT PRIMARY KEY,
        wishlist_item_id TEXT NOT NULL,
        alert_type TEXT NOT NULL,
        target_price TEXT NOT NULL,
        actual_price TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'ACTIVE',
        email_sent INTEGER NOT NULL DEFAULT 0,
        email_sent_at TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY(wishlist_item_id) REFERENCES wishlist(id) ON DELETE CASCADE
    );
    "#,
    )
}

/// Starts a write unit. `BEGIN IMMEDIATE` takes the database write lock up front,
/// so every balance read inside the unit sees the latest committed value and no
/// other writer can interleave until commit or drop.
pub fn write_unit(conn: &mut Connection) -> rusqlite::Result<rusqlite::Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// RFC 3339 with fixed microseconds so that text order equals time order.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str_exact(raw.trim()).map_err(|e| conversion_error(idx, e))
}

pub fn opt_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Decimal::from_str_exact(s.trim()).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub fn opt_ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(idx, e))
    })
    .transpose()
}

pub fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(idx, e))
}
