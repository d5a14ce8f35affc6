// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{LedgerIssue, verify_ledger};
use crate::models::User;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    let issues = verify_ledger(conn, &user.id)?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
        return Ok(());
    }
    let rows = issues
        .iter()
        .map(|issue| match issue {
            LedgerIssue::BalanceDrift {
                account,
                stored,
                expected,
            } => vec![
                "balance_drift".into(),
                format!("{}: stored {} expected {}", account, fmt_money(stored), fmt_money(expected)),
            ],
            LedgerIssue::NegativeBalance { account, balance } => vec![
                "negative_balance".into(),
                format!("{}: {}", account, fmt_money(balance)),
            ],
            LedgerIssue::DefaultCount { count } => vec![
                "default_count".into(),
                format!("{} default accounts", count),
            ],
        })
        .collect();
    println!("{}", pretty_table(&["Issue", "Detail"], rows));
    Ok(())
}
