// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::{
    RecurringInterval, Transaction, TransactionCategory, TransactionStatus, TransactionType, User,
};
use crate::transactions::{
    NewTransaction, TransactionFilter, TransactionPatch, delete_transaction,
    list_transactions, post_transaction, process_recurring, set_transaction_status,
    update_transaction,
};
use crate::utils::{
    fmt_money, maybe_print_json, parse_datetime, parse_decimal, parse_month, parsed,
    pretty_table, required,
};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("status", sub)) => {
            let status: TransactionStatus = required(sub, "status")?.parse()?;
            let tx = set_transaction_status(conn, &user.id, required(sub, "id")?, status)?;
            println!("Transaction {} is {}", tx.id, tx.status);
        }
        Some(("update", sub)) => update(conn, user, sub)?,
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            delete_transaction(conn, &user.id, id)?;
            println!("Deleted transaction {}", id);
        }
        Some(("process-recurring", sub)) => {
            let created = process_recurring(conn, &user.id, Utc::now())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &created)? {
                println!("Created {} recurring occurrence(s)", created.len());
                if !created.is_empty() {
                    println!("{}", table(&created));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let r#type: TransactionType = required(sub, "type")?.parse()?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let date = match sub.get_one::<String>("date") {
        Some(raw) => parse_datetime(raw)?,
        None => Utc::now(),
    };
    let mut new = NewTransaction::new(r#type, amount, date);
    if let Some(key) = sub.get_one::<String>("account") {
        new.account = Some(ledger::resolve_account(conn, &user.id, key)?.id);
    }
    new.category = parsed::<TransactionCategory>(sub, "category")?.unwrap_or_default();
    new.status = parsed::<TransactionStatus>(sub, "status")?.unwrap_or(TransactionStatus::Pending);
    new.description = sub.get_one::<String>("description").cloned();
    if let Some(interval) = parsed::<RecurringInterval>(sub, "recurring")? {
        new.is_recurring = true;
        new.recurring_interval = Some(interval);
    }

    let tx = post_transaction(conn, &user.id, new)?;
    println!(
        "Recorded {} {} on {} ({}) id {}",
        tx.r#type,
        fmt_money(&tx.amount),
        tx.date.date_naive(),
        tx.status,
        tx.id
    );
    Ok(())
}

fn update(conn: &mut Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let mut patch = TransactionPatch {
        r#type: parsed::<TransactionType>(sub, "type")?,
        amount: sub.get_one::<String>("amount").map(|s| parse_decimal(s)).transpose()?,
        description: sub.get_one::<String>("description").cloned(),
        date: sub.get_one::<String>("date").map(|s| parse_datetime(s)).transpose()?,
        category: parsed::<TransactionCategory>(sub, "category")?,
        ..TransactionPatch::default()
    };
    if let Some(key) = sub.get_one::<String>("account") {
        patch.account = Some(ledger::resolve_account(conn, &user.id, key)?.id);
    }
    if let Some(interval) = parsed::<RecurringInterval>(sub, "recurring")? {
        patch.is_recurring = Some(true);
        patch.recurring_interval = Some(interval);
    } else if sub.get_flag("no-recurring") {
        patch.is_recurring = Some(false);
    }
    let tx = update_transaction(conn, &user.id, required(sub, "id")?, patch)?;
    println!("Updated transaction {}", tx.id);
    Ok(())
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, &user.id, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!("{}", table(&data));
    }
    Ok(())
}

/// Builds the list filter from `tx list` arguments and runs it.
pub fn query_rows(conn: &Connection, user_id: &str, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let account_id = match sub.get_one::<String>("account") {
        Some(key) => Some(ledger::resolve_account(conn, user_id, key)?.id),
        None => None,
    };
    let filter = TransactionFilter {
        account_id,
        r#type: parsed::<TransactionType>(sub, "type")?,
        status: parsed::<TransactionStatus>(sub, "status")?,
        month: sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?,
        limit: sub.get_one::<usize>("limit").copied(),
    };
    Ok(list_transactions(conn, user_id, &filter)?)
}

fn table(data: &[Transaction]) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|t| {
            vec![
                t.date.date_naive().to_string(),
                t.r#type.to_string(),
                fmt_money(&t.amount),
                t.category.to_string(),
                t.status.to_string(),
                t.recurring_interval
                    .map(|i| i.to_string())
                    .unwrap_or_default(),
                t.description.clone().unwrap_or_default(),
                t.id.clone(),
            ]
        })
        .collect();
    pretty_table(
        &["Date", "Type", "Amount", "Category", "Status", "Repeats", "Description", "Id"],
        rows,
    )
}
