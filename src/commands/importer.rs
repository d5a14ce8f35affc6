// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::transactions::{ImportReport, RawRow, import_transactions};
use crate::utils::{maybe_print_json, pretty_table, required};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use rusqlite::Connection;
use std::path::Path;

pub fn handle(conn: &mut Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => {
            let path = required(sub, "path")?.trim();
            let report = import_csv(conn, &user.id, Path::new(path))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
                print_report(&report);
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Reads a headered CSV (`date,type,amount,category,account,description,status,recurring_interval`).
/// Only `date`, `type` and `amount` are mandatory; unknown columns are ignored.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<RawRow>().enumerate() {
        rows.push(rec.with_context(|| format!("Malformed CSV record {}", i + 1))?);
    }
    Ok(rows)
}

pub fn import_csv(conn: &mut Connection, user_id: &str, path: &Path) -> Result<ImportReport> {
    let rows = read_rows(path)?;
    Ok(import_transactions(conn, user_id, rows))
}

fn print_report(report: &ImportReport) {
    println!(
        "Imported {} transaction(s), {} row(s) rejected",
        report.created_count(),
        report.error_count()
    );
    if !report.errors.is_empty() {
        let rows = report
            .errors
            .iter()
            .map(|e| vec![e.row.to_string(), e.reason.clone()])
            .collect();
        println!("{}", pretty_table(&["Row", "Reason"], rows));
    }
}
