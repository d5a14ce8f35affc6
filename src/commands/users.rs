// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::User;
use crate::users::list_users;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            println!("{} ({}) since {}", user.email, user.id, user.created_at.to_rfc3339());
        }
        Some(("list", sub)) => {
            let data = list_users(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .iter()
                    .map(|u| vec![u.email.clone(), u.id.clone(), u.created_at.to_rfc3339()])
                    .collect();
                println!("{}", pretty_table(&["Email", "Id", "Created"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
