// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::feed::{PriceLookup, Quote, normalize_symbol};
use super::merge::{HoldingState, Lot, merge_holding, validate_lot};
use crate::db::{date_at, decimal_at, fmt_ts, new_id, opt_decimal_at, ts_at, write_unit};
use crate::errors::{LedgerError, Result};
use crate::models::{Holding, HoldingValuation, Stock};
use crate::money::{HUNDRED, ensure_money_scale};

pub(crate) const STOCK_COLS: &str = "s.id, s.symbol, s.name, s.exchange, s.sector, s.current_price, \
     s.previous_close, s.market_cap, s.website_url, s.is_active, s.price_last_updated";
const HOLDING_COLS: &str = "h.id, h.user_id, h.stock_id, h.shares_owned, h.purchase_price, \
     h.purchase_date, h.total_invested, h.target_allocation_percentage, h.notes, \
     h.investment_thesis, h.is_active, h.created_at, h.updated_at";
const HOLDING_WIDTH: usize = 13;

#[derive(Debug, Clone, Default)]
pub struct HoldingMeta {
    pub notes: Option<String>,
    pub investment_thesis: Option<String>,
    pub target_allocation_percentage: Option<Decimal>,
}

#[derive(Debug, Default, Serialize)]
pub struct PriceRefresh {
    pub updated: Vec<String>,
    pub failed: Vec<PriceFailure>,
}

#[derive(Debug, Serialize)]
pub struct PriceFailure {
    pub symbol: String,
    pub reason: String,
}

pub(crate) fn stock_from_row(r: &Row<'_>, base: usize) -> rusqlite::Result<Stock> {
    Ok(Stock {
        id: r.get(base)?,
        symbol: r.get(base + 1)?,
        name: r.get(base + 2)?,
        exchange: r.get(base + 3)?,
        sector: r.get(base + 4)?,
        current_price: decimal_at(r, base + 5)?,
        previous_close: decimal_at(r, base + 6)?,
        market_cap: r.get(base + 7)?,
        website_url: r.get(base + 8)?,
        is_active: r.get(base + 9)?,
        price_last_updated: ts_at(r, base + 10)?,
    })
}

fn holding_from_row(r: &Row<'_>) -> rusqlite::Result<Holding> {
    Ok(Holding {
        id: r.get(0)?,
        user_id: r.get(1)?,
        stock_id: r.get(2)?,
        shares_owned: decimal_at(r, 3)?,
        purchase_price: decimal_at(r, 4)?,
        purchase_date: date_at(r, 5)?,
        total_invested: decimal_at(r, 6)?,
        target_allocation_percentage: opt_decimal_at(r, 7)?,
        notes: r.get(8)?,
        investment_thesis: r.get(9)?,
        is_active: r.get(10)?,
        created_at: ts_at(r, 11)?,
        updated_at: ts_at(r, 12)?,
    })
}

fn valuation_from_row(r: &Row<'_>) -> rusqlite::Result<HoldingValuation> {
    let holding = holding_from_row(r)?;
    let stock = stock_from_row(r, HOLDING_WIDTH)?;
    HoldingValuation::new(holding, &stock).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub fn get_stock(conn: &Connection, symbol: &str) -> Result<Option<Stock>> {
    let stock = conn
        .query_row(
            &format!("SELECT {} FROM stocks s WHERE s.symbol=?1", STOCK_COLS),
            params![symbol],
            |r| stock_from_row(r, 0),
        )
        .optional()?;
    Ok(stock)
}

/// Writes the latest quote for `symbol`, creating the stock row on first sight.
/// The active flag of an existing row is left alone.
pub fn upsert_stock(conn: &Connection, symbol: &str, quote: &Quote) -> Result<Stock> {
    conn.execute(
        "INSERT INTO stocks(id, symbol, name, exchange, sector, current_price, previous_close,
                            market_cap, website_url, is_active, price_last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)
         ON CONFLICT(symbol) DO UPDATE SET
            name=excluded.name, exchange=excluded.exchange, sector=excluded.sector,
            current_price=excluded.current_price, previous_close=excluded.previous_close,
            market_cap=excluded.market_cap, website_url=excluded.website_url,
            price_last_updated=excluded.price_last_updated",
        params![
            new_id(),
            symbol,
            quote.name,
            quote.exchange,
            quote.sector,
            quote.current_price.to_string(),
            quote.previous_close.to_string(),
            quote.market_cap,
            quote.website_url,
            fmt_ts(Utc::now()),
        ],
    )?;
    get_stock(conn, symbol)?.ok_or_else(|| LedgerError::not_found("Stock", symbol))
}

fn active_holding(conn: &Connection, user_id: &str, stock_id: &str) -> Result<Option<Holding>> {
    let holding = conn
        .query_row(
            &format!(
                "SELECT {} FROM holdings h WHERE h.user_id=?1 AND h.stock_id=?2 AND h.is_active=1",
                HOLDING_COLS
            ),
            params![user_id, stock_id],
            holding_from_row,
        )
        .optional()?;
    Ok(holding)
}

pub fn get_holding(conn: &Connection, user_id: &str, holding_id: &str) -> Result<Holding> {
    conn.query_row(
        &format!(
            "SELECT {} FROM holdings h WHERE h.id=?1 AND h.user_id=?2",
            HOLDING_COLS
        ),
        params![holding_id, user_id],
        holding_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Holding", holding_id))
}

/// Finds an active holding by id or by ticker symbol.
pub fn resolve_holding(conn: &Connection, user_id: &str, key: &str) -> Result<Holding> {
    let key = key.trim();
    conn.query_row(
        &format!(
            "SELECT {} FROM holdings h JOIN stocks s ON s.id=h.stock_id
             WHERE h.user_id=?1 AND h.is_active=1 AND (h.id=?2 OR s.symbol=?3)",
            HOLDING_COLS
        ),
        params![user_id, key, key.to_uppercase()],
        holding_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Holding", key))
}

/// Records a purchase lot: fetches a quote, upserts the stock, then merges the
/// lot into the user's active position (or opens one) in a single write unit.
pub fn add_or_merge_holding(
    conn: &mut Connection,
    user_id: &str,
    symbol: &str,
    lot: Lot,
    feed: &dyn PriceLookup,
    today: NaiveDate,
) -> Result<HoldingValuation> {
    let symbol = normalize_symbol(symbol)?;
    validate_lot(&lot, today)?;
    let quote = feed.lookup(&symbol)?;

    let unit = write_unit(conn)?;
    let stock = upsert_stock(&unit, &symbol, &quote)?;
    if !stock.is_active {
        warn!(user_id, %symbol, "purchase of inactive stock rejected");
        return Err(LedgerError::InactiveStock(symbol));
    }

    let existing = active_holding(&unit, user_id, &stock.id)?;
    let state = merge_holding(existing.as_ref().map(HoldingState::from).as_ref(), &lot)?;
    let now = fmt_ts(Utc::now());
    let holding_id = match &existing {
        Some(h) => {
            unit.execute(
                "UPDATE holdings SET shares_owned=?2, purchase_price=?3, purchase_date=?4,
                        total_invested=?5, notes=?6, investment_thesis=?7, updated_at=?8
                 WHERE id=?1",
                params![
                    h.id,
                    state.shares_owned.to_string(),
                    state.purchase_price.to_string(),
                    state.purchase_date.to_string(),
                    state.total_invested.to_string(),
                    state.notes,
                    state.investment_thesis,
                    now,
                ],
            )?;
            h.id.clone()
        }
        None => {
            let id = new_id();
            unit.execute(
                "INSERT INTO holdings(id, user_id, stock_id, shares_owned, purchase_price,
                        purchase_date, total_invested, notes, investment_thesis, is_active,
                        created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?10)",
                params![
                    id,
                    user_id,
                    stock.id,
                    state.shares_owned.to_string(),
                    state.purchase_price.to_string(),
                    state.purchase_date.to_string(),
                    state.total_invested.to_string(),
                    state.notes,
                    state.investment_thesis,
                    now,
                ],
            )?;
            id
        }
    };
    let holding = get_holding(&unit, user_id, &holding_id)?;
    unit.commit()?;
    info!(
        user_id,
        %symbol,
        merged = existing.is_some(),
        shares = %holding.shares_owned,
        avg_price = %holding.purchase_price,
        "holding recorded"
    );
    HoldingValuation::new(holding, &stock)
}

/// Soft-deletes an active holding.
pub fn remove_holding(conn: &mut Connection, user_id: &str, holding_id: &str) -> Result<()> {
    let unit = write_unit(conn)?;
    let changed = unit.execute(
        "UPDATE holdings SET is_active=0, updated_at=?3 WHERE id=?1 AND user_id=?2 AND is_active=1",
        params![holding_id, user_id, fmt_ts(Utc::now())],
    )?;
    if changed == 0 {
        return Err(LedgerError::not_found("Holding", holding_id));
    }
    unit.commit()?;
    info!(user_id, holding_id, "holding removed");
    Ok(())
}

pub fn update_holding_meta(
    conn: &mut Connection,
    user_id: &str,
    holding_id: &str,
    meta: HoldingMeta,
) -> Result<Holding> {
    if let Some(target) = meta.target_allocation_percentage {
        if target < Decimal::ZERO || target > HUNDRED {
            return Err(LedgerError::validation(
                "target allocation must be between 0 and 100",
            ));
        }
        ensure_money_scale(target, "target allocation")?;
    }

    let unit = write_unit(conn)?;
    let mut holding = get_holding(&unit, user_id, holding_id)?;
    if let Some(notes) = meta.notes {
        holding.notes = Some(notes.trim().to_string()).filter(|s| !s.is_empty());
    }
    if let Some(thesis) = meta.investment_thesis {
        holding.investment_thesis = Some(thesis.trim().to_string()).filter(|s| !s.is_empty());
    }
    if meta.target_allocation_percentage.is_some() {
        holding.target_allocation_percentage = meta.target_allocation_percentage;
    }
    holding.updated_at = Utc::now();
    unit.execute(
        "UPDATE holdings SET notes=?2, investment_thesis=?3, target_allocation_percentage=?4,
                updated_at=?5
         WHERE id=?1",
        params![
            holding.id,
            holding.notes,
            holding.investment_thesis,
            holding.target_allocation_percentage.map(|d| d.to_string()),
            fmt_ts(holding.updated_at),
        ],
    )?;
    unit.commit()?;
    info!(user_id, holding_id, "holding details updated");
    Ok(holding)
}

/// Active holdings joined with their stock, largest position first.
pub fn list_holdings(conn: &Connection, user_id: &str) -> Result<Vec<HoldingValuation>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, {} FROM holdings h JOIN stocks s ON s.id=h.stock_id
         WHERE h.user_id=?1 AND h.is_active=1
         ORDER BY s.symbol",
        HOLDING_COLS, STOCK_COLS
    ))?;
    let mut rows = stmt
        .query_map(params![user_id], valuation_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.sort_by(|a, b| b.current_value.cmp(&a.current_value));
    Ok(rows)
}

/// Pulls fresh quotes for every active stock that someone holds or watches.
/// Symbols the feed cannot price keep their last stored quote.
pub fn refresh_prices(conn: &mut Connection, feed: &dyn PriceLookup) -> Result<PriceRefresh> {
    let symbols = {
        let mut stmt = conn.prepare(
            "SELECT s.symbol FROM stocks s
             WHERE s.is_active=1 AND (
                EXISTS(SELECT 1 FROM holdings h WHERE h.stock_id=s.id AND h.is_active=1)
                OR EXISTS(SELECT 1 FROM wishlist w WHERE w.stock_id=s.id AND w.is_active=1))
             ORDER BY s.symbol",
        )?;
        let rows = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let mut outcome = PriceRefresh::default();
    for symbol in symbols {
        match feed.lookup(&symbol) {
            Ok(quote) => {
                let unit = write_unit(conn)?;
                upsert_stock(&unit, &symbol, &quote)?;
                unit.commit()?;
                outcome.updated.push(symbol);
            }
            Err(err) => {
                warn!(%symbol, error = %err, "price refresh failed");
                outcome.failed.push(PriceFailure {
                    symbol,
                    reason: err.to_string(),
                });
            }
        }
    }
    info!(
        updated = outcome.updated.len(),
        failed = outcome.failed.len(),
        "prices refreshed"
    );
    Ok(outcome)
}
