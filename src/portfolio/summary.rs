// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cached portfolio roll-up. The stored row is recomputed wholesale from the
//! active holdings on every refresh and is never updated incrementally.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::holdings::list_holdings;
use crate::db::{decimal_at, fmt_ts, new_id, ts_at, write_unit};
use crate::errors::{LedgerError, Result};
use crate::models::{HoldingValuation, PortfolioSummary, Sector, SummaryFigures};
use crate::money::{percentage_of, round_money, round_ratio};

/// Deterministic aggregate over a snapshot of valued holdings.
pub fn compute_summary(holdings: &[HoldingValuation]) -> SummaryFigures {
    if holdings.is_empty() {
        return SummaryFigures::default();
    }

    let total_invested: Decimal = holdings.iter().map(|h| h.holding.total_invested).sum();
    let current_value: Decimal = holdings.iter().map(|h| h.current_value).sum();
    let day_change: Decimal = holdings.iter().map(|h| h.day_change_value).sum();

    let total_gain_loss = current_value - total_invested;
    let previous_value = current_value - day_change;

    let mut by_sector: BTreeMap<Sector, Decimal> = BTreeMap::new();
    for h in holdings {
        *by_sector.entry(h.sector).or_default() += h.current_value;
    }
    let sector_allocation = by_sector
        .into_iter()
        .map(|(sector, value)| (sector, round_money(percentage_of(value, current_value))))
        .collect();

    let largest_holding_percentage = holdings
        .iter()
        .map(|h| percentage_of(h.current_value, current_value))
        .max()
        .map(round_money)
        .unwrap_or_default();

    SummaryFigures {
        total_invested: round_money(total_invested),
        current_portfolio_value: round_money(current_value),
        total_gain_loss: round_money(total_gain_loss),
        total_gain_loss_percentage: round_ratio(percentage_of(total_gain_loss, total_invested)),
        day_change_value: round_money(day_change),
        day_change_percentage: round_ratio(percentage_of(day_change, previous_value)),
        number_of_holdings: holdings.len() as i64,
        largest_holding_percentage,
        sector_allocation,
    }
}

fn summary_from_row(r: &Row<'_>) -> rusqlite::Result<PortfolioSummary> {
    let allocation: String = r.get(10)?;
    let sector_allocation = serde_json::from_str(&allocation).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(PortfolioSummary {
        id: r.get(0)?,
        user_id: r.get(1)?,
        figures: SummaryFigures {
            total_invested: decimal_at(r, 2)?,
            current_portfolio_value: decimal_at(r, 3)?,
            total_gain_loss: decimal_at(r, 4)?,
            total_gain_loss_percentage: decimal_at(r, 5)?,
            day_change_value: decimal_at(r, 6)?,
            day_change_percentage: decimal_at(r, 7)?,
            number_of_holdings: r.get(8)?,
            largest_holding_percentage: decimal_at(r, 9)?,
            sector_allocation,
        },
        last_calculated: ts_at(r, 11)?,
    })
}

/// Reads the cached summary without recomputing it.
pub fn get_portfolio_summary(conn: &Connection, user_id: &str) -> Result<Option<PortfolioSummary>> {
    let summary = conn
        .query_row(
            "SELECT id, user_id, total_invested, current_portfolio_value, total_gain_loss,
                    total_gain_loss_percentage, day_change_value, day_change_percentage,
                    number_of_holdings, largest_holding_percentage, sector_allocation,
                    last_calculated
             FROM portfolio_summaries WHERE user_id=?1",
            params![user_id],
            summary_from_row,
        )
        .optional()?;
    Ok(summary)
}

/// Recomputes the user's summary from the current active holdings and replaces
/// the cached row.
pub fn refresh_portfolio_summary(
    conn: &mut Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<PortfolioSummary> {
    let holdings = list_holdings(conn, user_id)?;
    let figures = compute_summary(&holdings);
    debug!(user_id, holdings = figures.number_of_holdings, value = %figures.current_portfolio_value, "summary computed");

    let allocation = serde_json::to_string(&figures.sector_allocation)?;
    let unit = write_unit(conn)?;
    unit.execute(
        "INSERT INTO portfolio_summaries(id, user_id, total_invested, current_portfolio_value,
                total_gain_loss, total_gain_loss_percentage, day_change_value,
                day_change_percentage, number_of_holdings, largest_holding_percentage,
                sector_allocation, last_calculated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(user_id) DO UPDATE SET
            total_invested=excluded.total_invested,
            current_portfolio_value=excluded.current_portfolio_value,
            total_gain_loss=excluded.total_gain_loss,
            total_gain_loss_percentage=excluded.total_gain_loss_percentage,
            day_change_value=excluded.day_change_value,
            day_change_percentage=excluded.day_change_percentage,
            number_of_holdings=excluded.number_of_holdings,
            largest_holding_percentage=excluded.largest_holding_percentage,
            sector_allocation=excluded.sector_allocation,
            last_calculated=excluded.last_calculated",
        params![
            new_id(),
            user_id,
            figures.total_invested.to_string(),
            figures.current_portfolio_value.to_string(),
            figures.total_gain_loss.to_string(),
            figures.total_gain_loss_percentage.to_string(),
            figures.day_change_value.to_string(),
            figures.day_change_percentage.to_string(),
            figures.number_of_holdings,
            figures.largest_holding_percentage.to_string(),
            allocation,
            fmt_ts(now),
        ],
    )?;
    let summary = get_portfolio_summary(&unit, user_id)?
        .ok_or_else(|| LedgerError::not_found("PortfolioSummary", user_id))?;
    unit.commit()?;
    info!(user_id, value = %summary.figures.current_portfolio_value, "portfolio summary refreshed");
    Ok(summary)
}
