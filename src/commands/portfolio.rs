// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::models::{HoldingValuation, PortfolioSummary, User};
use crate::portfolio::{
    FinnhubFeed, HoldingMeta, Lot, add_or_merge_holding, get_portfolio_summary, list_holdings,
    refresh_portfolio_summary, refresh_prices, remove_holding, resolve_holding,
    update_holding_meta,
};
use crate::utils::{
    fmt_money, fmt_pct, maybe_print_json, parse_date, parse_decimal, pretty_table, required,
};
use anyhow::{Result, anyhow};
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(
    conn: &mut Connection,
    user: &User,
    settings: &Settings,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, user, settings, sub)?,
        Some(("list", sub)) => list(conn, user, sub)?,
        Some(("remove", sub)) => {
            let holding = resolve_holding(conn, &user.id, required(sub, "key")?)?;
            remove_holding(conn, &user.id, &holding.id)?;
            refresh_portfolio_summary(conn, &user.id, Utc::now())?;
            println!("Removed holding {}", holding.id);
        }
        Some(("note", sub)) => {
            let holding = resolve_holding(conn, &user.id, required(sub, "key")?)?;
            let meta = HoldingMeta {
                notes: sub.get_one::<String>("notes").cloned(),
                investment_thesis: sub.get_one::<String>("thesis").cloned(),
                target_allocation_percentage: sub
                    .get_one::<String>("target")
                    .map(|s| parse_decimal(s))
                    .transpose()?,
            };
            update_holding_meta(conn, &user.id, &holding.id, meta)?;
            println!("Updated holding {}", holding.id);
        }
        Some(("summary", sub)) => summary(conn, user, sub)?,
        Some(("refresh-prices", sub)) => {
            let feed = feed(settings)?;
            let outcome = refresh_prices(conn, &feed)?;
            refresh_portfolio_summary(conn, &user.id, Utc::now())?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &outcome)? {
                println!("Refreshed {} symbol(s)", outcome.updated.len());
                if !outcome.failed.is_empty() {
                    let rows = outcome
                        .failed
                        .iter()
                        .map(|f| vec![f.symbol.clone(), f.reason.clone()])
                        .collect();
                    println!("{}", pretty_table(&["Symbol", "Error"], rows));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn feed(settings: &Settings) -> Result<FinnhubFeed> {
    let key = settings
        .finnhub_api_key
        .as_deref()
        .ok_or_else(|| anyhow!("No Finnhub key: pass --finnhub-key or set FINNHUB_API_KEY"))?;
    Ok(FinnhubFeed::new(key)?)
}

fn add(conn: &mut Connection, user: &User, settings: &Settings, sub: &clap::ArgMatches) -> Result<()> {
    let today = Utc::now().date_naive();
    let lot = Lot {
        shares: parse_decimal(required(sub, "shares")?)?,
        price: parse_decimal(required(sub, "price")?)?,
        date: match sub.get_one::<String>("date") {
            Some(raw) => parse_date(raw.trim())?,
            None => today,
        },
        notes: sub.get_one::<String>("notes").cloned(),
        thesis: sub.get_one::<String>("thesis").cloned(),
    };
    let feed = feed(settings)?;
    let valued = add_or_merge_holding(conn, &user.id, required(sub, "symbol")?, lot, &feed, today)?;
    refresh_portfolio_summary(conn, &user.id, Utc::now())?;
    println!(
        "{}: {} shares at avg {} (invested {}, now worth {})",
        valued.symbol,
        valued.holding.shares_owned,
        valued.holding.purchase_price,
        fmt_money(&valued.holding.total_invested),
        fmt_money(&valued.current_value)
    );
    Ok(())
}

fn list(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let data = list_holdings(conn, &user.id)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        println!(
            "{}",
            pretty_table(
                &["Symbol", "Shares", "Avg Cost", "Price", "Value", "P/L", "P/L %", "Day"],
                rows(&data),
            )
        );
    }
    Ok(())
}

fn rows(data: &[HoldingValuation]) -> Vec<Vec<String>> {
    data.iter()
        .map(|v| {
            vec![
                v.symbol.clone(),
                v.holding.shares_owned.normalize().to_string(),
                v.holding.purchase_price.to_string(),
                v.current_price.to_string(),
                fmt_money(&v.current_value),
                fmt_money(&v.unrealized_gain_loss),
                fmt_pct(&v.unrealized_gain_loss_percentage),
                fmt_money(&v.day_change_value),
            ]
        })
        .collect()
}

fn summary(conn: &mut Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let summary = if sub.get_flag("refresh") {
        Some(refresh_portfolio_summary(conn, &user.id, Utc::now())?)
    } else {
        get_portfolio_summary(conn, &user.id)?
    };
    let Some(summary) = summary else {
        println!("No summary yet; run `portfolio summary --refresh`");
        return Ok(());
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &summary)? {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(s: &PortfolioSummary) {
    let f = &s.figures;
    let rows = vec![
        vec!["Invested".into(), fmt_money(&f.total_invested)],
        vec!["Value".into(), fmt_money(&f.current_portfolio_value)],
        vec!["Gain/Loss".into(), fmt_money(&f.total_gain_loss)],
        vec!["Gain/Loss %".into(), fmt_pct(&f.total_gain_loss_percentage)],
        vec!["Day change".into(), fmt_money(&f.day_change_value)],
        vec!["Day change %".into(), fmt_pct(&f.day_change_percentage)],
        vec!["Holdings".into(), f.number_of_holdings.to_string()],
        vec!["Largest %".into(), fmt_pct(&f.largest_holding_percentage)],
        vec!["As of".into(), s.last_calculated.to_rfc3339()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], rows));
    if !f.sector_allocation.is_empty() {
        let rows = f
            .sector_allocation
            .iter()
            .map(|(sector, pct)| vec![sector.to_string(), fmt_pct(pct)])
            .collect();
        println!("{}", pretty_table(&["Sector", "%"], rows));
    }
}
