// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dollar-cost-average merge of a purchase lot into a position.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{LedgerError, Result};
use crate::models::Holding;
use crate::money::{MAX_QUANTITY, ensure_at_most, ensure_price_scale, round_money, round_price};

#[derive(Debug, Clone)]
pub struct Lot {
    pub shares: Decimal,
    pub price: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    /// Replaces the stored thesis when non-blank.
    pub thesis: Option<String>,
}

/// The mutable part of a holding that a merge produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingState {
    pub shares_owned: Decimal,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    pub total_invested: Decimal,
    pub notes: Option<String>,
    pub investment_thesis: Option<String>,
}

impl From<&Holding> for HoldingState {
    fn from(h: &Holding) -> Self {
        Self {
            shares_owned: h.shares_owned,
            purchase_price: h.purchase_price,
            purchase_date: h.purchase_date,
            total_invested: h.total_invested,
            notes: h.notes.clone(),
            investment_thesis: h.investment_thesis.clone(),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn overflow(what: &str) -> LedgerError {
    LedgerError::validation(format!("{} is too large to record", what))
}

/// Folds a lot into an existing position, or opens one. Fails when the merged
/// share count or cost no longer fits the holding columns.
pub fn merge_holding(existing: Option<&HoldingState>, lot: &Lot) -> Result<HoldingState> {
    let Some(current) = existing else {
        let price = round_price(lot.price);
        let cost = lot.shares.checked_mul(price).ok_or_else(|| overflow("total invested"))?;
        return Ok(HoldingState {
            shares_owned: lot.shares,
            purchase_price: price,
            purchase_date: lot.date,
            total_invested: round_money(cost),
            notes: non_blank(lot.notes.as_deref()),
            investment_thesis: non_blank(lot.thesis.as_deref()),
        });
    };

    let added_cost = lot.shares.checked_mul(lot.price).ok_or_else(|| overflow("lot cost"))?;
    let shares = current
        .shares_owned
        .checked_add(lot.shares)
        .ok_or_else(|| overflow("shares owned"))?;
    ensure_at_most(shares, MAX_QUANTITY, "shares owned")?;
    let average = if shares.is_zero() {
        lot.price
    } else {
        current
            .total_invested
            .checked_add(added_cost)
            .and_then(|cost| cost.checked_div(shares))
            .ok_or_else(|| overflow("total invested"))?
    };
    let price = round_price(average);
    let total = shares.checked_mul(price).ok_or_else(|| overflow("total invested"))?;

    let notes = match (non_blank(current.notes.as_deref()), non_blank(lot.notes.as_deref())) {
        (Some(old), Some(new)) => Some(format!("{}\n{}", old, new)),
        (old, new) => new.or(old),
    };

    Ok(HoldingState {
        shares_owned: shares,
        purchase_price: price,
        purchase_date: current.purchase_date.min(lot.date),
        total_invested: round_money(total),
        notes,
        investment_thesis: non_blank(lot.thesis.as_deref())
            .or_else(|| current.investment_thesis.clone()),
    })
}

/// Rejects lots that cannot be recorded. Stock activity is checked by the caller.
pub fn validate_lot(lot: &Lot, today: NaiveDate) -> Result<()> {
    if lot.shares <= Decimal::ZERO {
        return Err(LedgerError::validation("shares must be greater than zero"));
    }
    if lot.price <= Decimal::ZERO {
        return Err(LedgerError::validation(
            "purchase price must be greater than zero",
        ));
    }
    ensure_at_most(lot.shares, MAX_QUANTITY, "shares")?;
    ensure_at_most(lot.price, MAX_QUANTITY, "purchase price")?;
    ensure_price_scale(lot.shares, "shares")?;
    ensure_price_scale(lot.price, "purchase price")?;
    if lot.date > today {
        return Err(LedgerError::validation(format!(
            "purchase date {} is in the future",
            lot.date
        )));
    }
    Ok(())
}
