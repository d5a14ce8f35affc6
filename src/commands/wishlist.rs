// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::portfolio::feed;
use crate::config::Settings;
use crate::models::{PriceAlert, User};
use crate::utils::{fmt_pct, maybe_print_json, parse_decimal, pretty_table, required};
use crate::wishlist::{
    NewWishlistItem, WishlistView, add_to_wishlist, check_price_alerts, list_price_alerts,
    list_wishlist, remove_from_wishlist, resolve_item,
};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(
    conn: &mut Connection,
    user: &User,
    settings: &Settings,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewWishlistItem {
                symbol: required(sub, "symbol")?.to_string(),
                target_buy_price: parse_decimal(required(sub, "target")?)?,
                planned_investment_amount: sub
                    .get_one::<String>("planned")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
                email_alerts_enabled: !sub.get_flag("no-alerts"),
                priority: sub.get_one::<i32>("priority").copied(),
                notes: sub.get_one::<String>("notes").cloned(),
                watch_reason: sub.get_one::<String>("reason").cloned(),
            };
            let view = add_to_wishlist(conn, &user.id, new, &feed(settings)?)?;
            println!(
                "Watching {} at {} (target {})",
                view.symbol, view.current_price, view.item.target_buy_price
            );
        }
        Some(("list", sub)) => {
            let data = list_wishlist(conn, &user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                println!(
                    "{}",
                    pretty_table(
                        &["Symbol", "Priority", "Target", "Price", "To target %", "Since added %", "Alert"],
                        rows(&data),
                    )
                );
            }
        }
        Some(("rm", sub)) => {
            let view = resolve_item(conn, &user.id, required(sub, "key")?)?;
            remove_from_wishlist(conn, &user.id, &view.item.id)?;
            println!("Stopped watching {}", view.symbol);
        }
        Some(("check", sub)) => {
            let raised = check_price_alerts(conn, &user.id, Utc::now())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &raised)? {
                println!("{} new price alert(s)", raised.len());
                if !raised.is_empty() {
                    println!("{}", alert_table(&raised));
                }
            }
        }
        Some(("alerts", sub)) => {
            let data = list_price_alerts(conn, &user.id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                println!("{}", alert_table(&data));
            }
        }
        _ => {}
    }
    Ok(())
}

fn rows(data: &[WishlistView]) -> Vec<Vec<String>> {
    data.iter()
        .map(|v| {
            vec![
                v.symbol.clone(),
                v.item.priority.to_string(),
                v.item.target_buy_price.to_string(),
                v.current_price.to_string(),
                fmt_pct(&v.distance_to_target_percentage),
                fmt_pct(&v.price_change_percentage_since_added),
                if v.should_trigger_alert { "yes".into() } else { String::new() },
            ]
        })
        .collect()
}

fn alert_table(data: &[PriceAlert]) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|a| {
            vec![
                a.created_at.to_rfc3339(),
                a.alert_type.to_string(),
                a.target_price.to_string(),
                a.actual_price.to_string(),
                a.status.to_string(),
            ]
        })
        .collect();
    pretty_table(&["When", "Type", "Target", "Actual", "Status"], rows)
}
