// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::budget::{UtilizationReport, record_alert_sent, set_budget, utilization_report};
use crate::config::alert_threshold;
use crate::models::User;
use crate::utils::{fmt_money, fmt_pct, maybe_print_json, parse_datetime, parse_decimal, pretty_table, required};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, user: &User, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let amount = parse_decimal(required(sub, "amount")?)?;
            let budget = set_budget(conn, &user.id, amount)?;
            println!("Monthly budget set to {}", fmt_money(&budget.amount));
        }
        Some(("show", sub)) => show(conn, user, sub)?,
        Some(("alert-sent", _)) => {
            let budget = record_alert_sent(conn, &user.id, Utc::now())?;
            if let Some(at) = budget.last_alert_sent {
                println!("Budget alert marked as sent at {}", at.to_rfc3339());
            }
        }
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection, user: &User, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = match sub.get_one::<String>("as-of") {
        Some(raw) => parse_datetime(raw)?,
        None => Utc::now(),
    };
    let threshold = alert_threshold(conn)?;
    let report = utilization_report(conn, &user.id, as_of, threshold)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        println!("{}", table(&report));
        if report.should_alert {
            println!(
                "⚠ {}% of the monthly budget used (threshold {}%)",
                report.utilization_percentage, report.alert_threshold
            );
        }
    }
    Ok(())
}

fn table(r: &UtilizationReport) -> comfy_table::Table {
    let rows = vec![
        vec!["Budget".into(), fmt_money(&r.budget_amount)],
        vec!["Spent this month".into(), fmt_money(&r.current_month_expenses)],
        vec!["Remaining".into(), fmt_money(&r.remaining_budget)],
        vec!["Used %".into(), fmt_pct(&r.utilization_percentage)],
        vec![
            "Day".into(),
            format!("{} of {}", r.days_elapsed, r.days_in_month),
        ],
        vec!["Avg daily".into(), fmt_money(&r.average_daily_spending)],
        vec!["Projected".into(), fmt_money(&r.projected_monthly_spending)],
        vec!["Projected %".into(), fmt_pct(&r.projected_utilization)],
    ];
    pretty_table(&["Metric", "Value"], rows)
}
