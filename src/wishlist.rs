// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Watched stocks and the price alerts they raise.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::db::{decimal_at, fmt_ts, new_id, opt_decimal_at, opt_ts_at, ts_at, write_unit};
use crate::errors::{LedgerError, Result};
use crate::models::{AlertStatus, AlertType, PriceAlert, WishlistItem};
use crate::money::{
    MAX_BALANCE, MAX_QUANTITY, ensure_at_most, ensure_money_scale, ensure_positive,
    ensure_price_scale,
};
use crate::portfolio::feed::{PriceLookup, normalize_symbol};
use crate::portfolio::holdings::{STOCK_COLS, stock_from_row, upsert_stock};

pub const DEFAULT_PRIORITY: i32 = 5;
const MAX_WATCH_REASON_LEN: usize = 200;
/// An item raises at most one alert per window.
pub const ALERT_WINDOW_HOURS: i64 = 24;

const ITEM_COLS: &str = "w.id, w.user_id, w.stock_id, w.target_buy_price, w.price_when_added, \
     w.planned_investment_amount, w.email_alerts_enabled, w.priority, w.notes, w.watch_reason, \
     w.is_active, w.created_at";
const ITEM_WIDTH: usize = 12;

#[derive(Debug, Clone)]
pub struct NewWishlistItem {
    pub symbol: String,
    pub target_buy_price: Decimal,
    pub planned_investment_amount: Option<Decimal>,
    pub email_alerts_enabled: bool,
    pub priority: Option<i32>,
    pub notes: Option<String>,
    pub watch_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    #[serde(flatten)]
    pub item: WishlistItem,
    pub symbol: String,
    pub current_price: Decimal,
    pub price_change_since_added: Decimal,
    pub price_change_percentage_since_added: Decimal,
    pub distance_to_target: Decimal,
    pub distance_to_target_percentage: Decimal,
    pub should_trigger_alert: bool,
}

fn item_from_row(r: &Row<'_>) -> rusqlite::Result<WishlistItem> {
    Ok(WishlistItem {
        id: r.get(0)?,
        user_id: r.get(1)?,
        stock_id: r.get(2)?,
        target_buy_price: decimal_at(r, 3)?,
        price_when_added: opt_decimal_at(r, 4)?,
        planned_investment_amount: opt_decimal_at(r, 5)?,
        email_alerts_enabled: r.get(6)?,
        priority: r.get(7)?,
        notes: r.get(8)?,
        watch_reason: r.get(9)?,
        is_active: r.get(10)?,
        created_at: ts_at(r, 11)?,
    })
}

fn view_from_row(r: &Row<'_>) -> rusqlite::Result<WishlistView> {
    let item = item_from_row(r)?;
    let stock = stock_from_row(r, ITEM_WIDTH)?;
    Ok(WishlistView {
        symbol: stock.symbol.clone(),
        current_price: stock.current_price,
        price_change_since_added: item.price_change_since_added(&stock),
        price_change_percentage_since_added: item.price_change_percentage_since_added(&stock),
        distance_to_target: item.distance_to_target(&stock),
        distance_to_target_percentage: item.distance_to_target_percentage(&stock),
        should_trigger_alert: item.should_trigger_alert(&stock),
        item,
    })
}

fn alert_from_row(r: &Row<'_>) -> rusqlite::Result<PriceAlert> {
    Ok(PriceAlert {
        id: r.get(0)?,
        wishlist_item_id: r.get(1)?,
        alert_type: r.get(2)?,
        target_price: decimal_at(r, 3)?,
        actual_price: decimal_at(r, 4)?,
        status: r.get(5)?,
        email_sent: r.get(6)?,
        email_sent_at: opt_ts_at(r, 7)?,
        created_at: ts_at(r, 8)?,
    })
}

fn validate(new: &NewWishlistItem) -> Result<(i32, Option<Decimal>)> {
    ensure_positive(new.target_buy_price, "target buy price")?;
    ensure_at_most(new.target_buy_price, MAX_QUANTITY, "target buy price")?;
    ensure_price_scale(new.target_buy_price, "target buy price")?;
    let planned = match new.planned_investment_amount {
        Some(p) => {
            ensure_positive(p, "planned investment amount")?;
            ensure_at_most(p, MAX_BALANCE, "planned investment amount")?;
            Some(ensure_money_scale(p, "planned investment amount")?)
        }
        None => None,
    };
    let priority = new.priority.unwrap_or(DEFAULT_PRIORITY);
    if !(1..=10).contains(&priority) {
        return Err(LedgerError::validation("priority must be between 1 and 10"));
    }
    if let Some(reason) = &new.watch_reason {
        if reason.chars().count() > MAX_WATCH_REASON_LEN {
            return Err(LedgerError::validation(format!(
                "watch reason cannot exceed {} characters",
                MAX_WATCH_REASON_LEN
            )));
        }
    }
    Ok((priority, planned))
}

pub fn add_to_wishlist(
    conn: &mut Connection,
    user_id: &str,
    new: NewWishlistItem,
    feed: &dyn PriceLookup,
) -> Result<WishlistView> {
    let symbol = normalize_symbol(&new.symbol)?;
    let (priority, planned) = validate(&new)?;
    let quote = feed.lookup(&symbol)?;

    let unit = write_unit(conn)?;
    let stock = upsert_stock(&unit, &symbol, &quote)?;
    if !stock.is_active {
        return Err(LedgerError::InactiveStock(symbol));
    }
    let duplicate: Option<String> = unit
        .query_row(
            "SELECT id FROM wishlist WHERE user_id=?1 AND stock_id=?2 AND is_active=1",
            params![user_id, stock.id],
            |r| r.get(0),
        )
        .optional()?;
    if duplicate.is_some() {
        warn!(user_id, %symbol, "duplicate wishlist entry rejected");
        return Err(LedgerError::DuplicateEntry(format!(
            "Active wishlist entry for {}",
            symbol
        )));
    }
    let id = new_id();
    unit.execute(
        "INSERT INTO wishlist(id, user_id, stock_id, target_buy_price, price_when_added,
                planned_investment_amount, email_alerts_enabled, priority, notes, watch_reason,
                is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11)",
        params![
            id,
            user_id,
            stock.id,
            new.target_buy_price.to_string(),
            stock.current_price.to_string(),
            planned.map(|d| d.to_string()),
            new.email_alerts_enabled,
            priority,
            new.notes.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            new.watch_reason.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            fmt_ts(Utc::now()),
        ],
    )?;
    let view = get_view(&unit, user_id, &id)?;
    unit.commit()?;
    info!(user_id, %symbol, target = %view.item.target_buy_price, "wishlist entry added");
    Ok(view)
}

fn get_view(conn: &Connection, user_id: &str, item_id: &str) -> Result<WishlistView> {
    conn.query_row(
        &format!(
            "SELECT {}, {} FROM wishlist w JOIN stocks s ON s.id=w.stock_id
             WHERE w.id=?1 AND w.user_id=?2",
            ITEM_COLS, STOCK_COLS
        ),
        params![item_id, user_id],
        view_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Wishlist item", item_id))
}

/// Finds an active entry by id or ticker symbol.
pub fn resolve_item(conn: &Connection, user_id: &str, key: &str) -> Result<WishlistView> {
    let key = key.trim();
    conn.query_row(
        &format!(
            "SELECT {}, {} FROM wishlist w JOIN stocks s ON s.id=w.stock_id
             WHERE w.user_id=?1 AND w.is_active=1 AND (w.id=?2 OR s.symbol=?3)",
            ITEM_COLS, STOCK_COLS
        ),
        params![user_id, key, key.to_uppercase()],
        view_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("Wishlist item", key))
}

pub fn remove_from_wishlist(conn: &mut Connection, user_id: &str, item_id: &str) -> Result<()> {
    let unit = write_unit(conn)?;
    let changed = unit.execute(
        "UPDATE wishlist SET is_active=0 WHERE id=?1 AND user_id=?2 AND is_active=1",
        params![item_id, user_id],
    )?;
    if changed == 0 {
        return Err(LedgerError::not_found("Wishlist item", item_id));
    }
    unit.commit()?;
    info!(user_id, item_id, "wishlist entry removed");
    Ok(())
}

/// Active entries, highest priority first.
pub fn list_wishlist(conn: &Connection, user_id: &str) -> Result<Vec<WishlistView>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, {} FROM wishlist w JOIN stocks s ON s.id=w.stock_id
         WHERE w.user_id=?1 AND w.is_active=1
         ORDER BY w.priority DESC, w.created_at, w.rowid",
        ITEM_COLS, STOCK_COLS
    ))?;
    let rows = stmt
        .query_map(params![user_id], view_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Records a TRIGGERED alert for every entry whose stock trades at or below
/// its target, unless that entry already alerted within the window.
pub fn check_price_alerts(
    conn: &mut Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<PriceAlert>> {
    let due: Vec<WishlistView> = list_wishlist(conn, user_id)?
        .into_iter()
        .filter(|v| v.should_trigger_alert)
        .collect();
    let since = fmt_ts(now - Duration::hours(ALERT_WINDOW_HOURS));

    let unit = write_unit(conn)?;
    let mut raised = Vec::new();
    for view in due {
        let recent: Option<String> = unit
            .query_row(
                "SELECT id FROM price_alerts WHERE wishlist_item_id=?1 AND created_at>=?2 LIMIT 1",
                params![view.item.id, since],
                |r| r.get(0),
            )
            .optional()?;
        if recent.is_some() {
            debug!(user_id, symbol = %view.symbol, "alert suppressed inside window");
            continue;
        }
        let alert = PriceAlert {
            id: new_id(),
            wishlist_item_id: view.item.id.clone(),
            alert_type: AlertType::PriceBelow,
            target_price: view.item.target_buy_price,
            actual_price: view.current_price,
            status: AlertStatus::Triggered,
            email_sent: false,
            email_sent_at: None,
            created_at: now,
        };
        unit.execute(
            "INSERT INTO price_alerts(id, wishlist_item_id, alert_type, target_price, actual_price,
                    status, email_sent, email_sent_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)",
            params![
                alert.id,
                alert.wishlist_item_id,
                alert.alert_type,
                alert.target_price.to_string(),
                alert.actual_price.to_string(),
                alert.status,
                alert.email_sent,
                fmt_ts(alert.created_at),
            ],
        )?;
        info!(user_id, symbol = %view.symbol, price = %alert.actual_price, "price alert triggered");
        raised.push(alert);
    }
    unit.commit()?;
    Ok(raised)
}

pub fn list_price_alerts(conn: &Connection, user_id: &str) -> Result<Vec<PriceAlert>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.wishlist_item_id, a.alert_type, a.target_price, a.actual_price, a.status,
                a.email_sent, a.email_sent_at, a.created_at
         FROM price_alerts a JOIN wishlist w ON w.id=a.wishlist_item_id
         WHERE w.user_id=?1
         ORDER BY a.created_at DESC",
    )?;
    let rows = stmt
        .query_map(params![user_id], alert_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
