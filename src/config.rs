// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings. Process-level knobs come from global CLI flags, which fall
//! back to environment variables through clap; user preferences live in the
//! `settings` table.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::LedgerError;
use crate::money;

pub const DEFAULT_USER: &str = "me@localhost";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_ALERT_THRESHOLD: Decimal = dec!(80);

pub const ALERT_THRESHOLD_KEY: &str = "alert_threshold";

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub user_email: String,
    pub log_level: String,
    pub finnhub_api_key: Option<String>,
    pub busy_timeout: Duration,
}

impl Settings {
    pub fn from_matches(m: &ArgMatches) -> Result<Self> {
        let db_path = match m.get_one::<String>("db") {
            Some(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
            _ => crate::db::db_path()?,
        };
        let user_email = m
            .get_one::<String>("user")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        let log_level = m
            .get_one::<String>("log-level")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let finnhub_api_key = m
            .get_one::<String>("finnhub-key")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let busy_ms = m
            .get_one::<u64>("busy-timeout-ms")
            .copied()
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
        Ok(Self {
            db_path,
            user_email,
            log_level,
            finnhub_api_key,
            busy_timeout: Duration::from_millis(busy_ms),
        })
    }
}

pub fn get_setting(conn: &Connection, key: &str) -> crate::errors::Result<Option<String>> {
    let v = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> crate::errors::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Utilization percentage at which a budget alert becomes due.
pub fn alert_threshold(conn: &Connection) -> crate::errors::Result<Decimal> {
    match get_setting(conn, ALERT_THRESHOLD_KEY)? {
        Some(raw) => money::decode(&raw, ALERT_THRESHOLD_KEY),
        None => Ok(DEFAULT_ALERT_THRESHOLD),
    }
}

pub fn set_alert_threshold(conn: &Connection, value: Decimal) -> crate::errors::Result<()> {
    if value <= Decimal::ZERO || value > money::HUNDRED {
        return Err(LedgerError::validation(
            "alert threshold must be within (0, 100]",
        ));
    }
    set_setting(conn, ALERT_THRESHOLD_KEY, &value.normalize().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn threshold_defaults_to_eighty() {
        let conn = conn();
        assert_eq!(alert_threshold(&conn).unwrap(), dec!(80));
    }

    #[test]
    fn threshold_round_trips_and_is_bounded() {
        let conn = conn();
        set_alert_threshold(&conn, dec!(75.5)).unwrap();
        assert_eq!(alert_threshold(&conn).unwrap(), dec!(75.5));
        assert!(set_alert_threshold(&conn, dec!(0)).is_err());
        assert!(set_alert_threshold(&conn, dec!(101)).is_err());
        assert_eq!(alert_threshold(&conn).unwrap(), dec!(75.5));
    }

    #[test]
    fn settings_resolve_from_flags() {
        let m = crate::cli::build_cli().get_matches_from([
            "fundfolio",
            "--db",
            "/tmp/x.sqlite",
            "--user",
            "ada@example.com",
            "--busy-timeout-ms",
            "250",
            "doctor",
        ]);
        let s = Settings::from_matches(&m).unwrap();
        assert_eq!(s.db_path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(s.user_email, "ada@example.com");
        assert_eq!(s.busy_timeout, Duration::from_millis(250));
    }
}
