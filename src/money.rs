// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed-point helpers. Money is kept at two decimal places, share counts and
//! per-share prices at four, matching the column precision of the store.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::errors::{LedgerError, Result};

pub const MONEY_SCALE: u32 = 2;
pub const PRICE_SCALE: u32 = 4;
/// Scale for gain/day-change percentages; allocation shares use [`MONEY_SCALE`].
pub const RATIO_SCALE: u32 = 4;

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Largest balance an account column can hold (15 digits, 2 decimals).
pub const MAX_BALANCE: Decimal = dec!(999999999999999.99);

/// Largest share count or per-share price a holding column can hold (15 digits, 4 decimals).
pub const MAX_QUANTITY: Decimal = dec!(99999999999.9999);

fn round(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}

pub fn round_money(value: Decimal) -> Decimal {
    round(value, MONEY_SCALE)
}

pub fn round_price(value: Decimal) -> Decimal {
    round(value, PRICE_SCALE)
}

pub fn round_ratio(value: Decimal) -> Decimal {
    round(value, RATIO_SCALE)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * HUNDRED
}

/// Rejects amounts that cannot be stored at money precision without loss.
pub fn ensure_money_scale(value: Decimal, field: &str) -> Result<Decimal> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::validation(format!(
            "{} must have at most {} decimal places",
            field, MONEY_SCALE
        )));
    }
    let mut exact = value;
    exact.rescale(MONEY_SCALE);
    Ok(exact)
}

pub fn ensure_at_most(value: Decimal, max: Decimal, field: &str) -> Result<Decimal> {
    if value > max {
        return Err(LedgerError::validation(format!(
            "{} cannot exceed {}",
            field, max
        )));
    }
    Ok(value)
}

/// Rejects share counts and prices finer than four decimal places.
pub fn ensure_price_scale(value: Decimal, field: &str) -> Result<Decimal> {
    if value.normalize().scale() > PRICE_SCALE {
        return Err(LedgerError::validation(format!(
            "{} cannot have more than {} decimal places",
            field, PRICE_SCALE
        )));
    }
    Ok(value)
}

pub fn ensure_positive(value: Decimal, field: &str) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(value)
}

/// Parses a decimal column written by this crate.
pub fn decode(raw: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str_exact(raw.trim())
        .map_err(|err| LedgerError::Corrupt(format!("invalid {} '{}': {}", what, raw, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_balance_matches_column_limit() {
        assert_eq!(MAX_BALANCE.scale(), MONEY_SCALE);
        assert!(MAX_BALANCE + dec!(0.01) > MAX_BALANCE);
    }

    #[test]
    fn rounding_is_bankers() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.34));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
        assert_eq!(round_price(dec!(109.99995)), dec!(110.0000));
    }

    #[test]
    fn percentage_guards_non_positive_whole() {
        assert_eq!(percentage_of(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage_of(dec!(5), dec!(-10)), Decimal::ZERO);
        assert_eq!(percentage_of(dec!(850), dec!(1000)), dec!(85));
    }

    #[test]
    fn money_scale_rejects_sub_cent_amounts() {
        assert!(ensure_money_scale(dec!(10.005), "amount").is_err());
        assert_eq!(ensure_money_scale(dec!(10.50), "amount").unwrap(), dec!(10.50));
        assert_eq!(ensure_money_scale(dec!(10.5000), "amount").unwrap(), dec!(10.50));
        assert_eq!(ensure_money_scale(dec!(7), "amount").unwrap().to_string(), "7.00");
    }

    #[test]
    fn quantities_are_bounded_in_size_and_scale() {
        assert!(ensure_at_most(MAX_QUANTITY, MAX_QUANTITY, "shares").is_ok());
        assert!(ensure_at_most(MAX_QUANTITY + dec!(0.0001), MAX_QUANTITY, "shares").is_err());
        assert!(ensure_price_scale(dec!(12.3456), "price").is_ok());
        assert!(ensure_price_scale(dec!(12.34560), "price").is_ok());
        assert!(ensure_price_scale(dec!(12.34567), "price").is_err());
    }

    #[test]
    fn decode_flags_garbage() {
        assert!(matches!(decode("abc", "balance"), Err(LedgerError::Corrupt(_))));
        assert_eq!(decode(" 12.30 ", "balance").unwrap(), dec!(12.30));
    }
}
