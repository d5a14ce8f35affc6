// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, AccountPatch, NewAccount};
use crate::models::{Account, AccountType, User};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, parsed, pretty_table, required};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("update", sub)) => {
            let account = ledger::resolve_account(conn, &user.id, required(sub, "key")?)?;
            let patch = AccountPatch {
                name: sub.get_one::<String>("name").cloned(),
                r#type: parsed::<AccountType>(sub, "type")?,
                is_default: sub.get_one::<bool>("default").copied(),
            };
            let updated = ledger::update_account(conn, &user.id, &account.id, patch)?;
            println!("Updated account '{}'", updated.name);
        }
        Some(("default", sub)) => {
            let account = ledger::resolve_account(conn, &user.id, required(sub, "key")?)?;
            let updated = ledger::set_default_account(conn, &user.id, &account.id)?;
            println!("'{}' is now the default account", updated.name);
        }
        Some(("rm", sub)) => {
            let account = ledger::resolve_account(conn, &user.id, required(sub, "key")?)?;
            ledger::delete_account(conn, &user.id, &account.id)?;
            println!("Removed account '{}'", account.name);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let new = NewAccount {
        name: required(sub, "name")?.to_string(),
        r#type: parsed::<AccountType>(sub, "type")?.unwrap_or(AccountType::Current),
        is_default: sub.get_flag("default"),
        opening_balance: parse_decimal(required(sub, "opening-balance")?)?,
    };
    let account = ledger::create_account(conn, &user.id, new)?;
    println!(
        "Added account '{}' ({}, balance {}){}",
        account.name,
        account.r#type,
        fmt_money(&account.balance),
        if account.is_default { " [default]" } else { "" }
    );
    Ok(())
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let data = ledger::list_accounts(conn, &user.id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!(
            "{}",
            pretty_table(&["Name", "Type", "Balance", "Default", "Id"], rows(&data))
        );
    }
    Ok(())
}

fn rows(data: &[Account]) -> Vec<Vec<String>> {
    data.iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.r#type.to_string(),
                fmt_money(&a.balance),
                if a.is_default { "*".into() } else { String::new() },
                a.id.clone(),
            ]
        })
        .collect()
}
