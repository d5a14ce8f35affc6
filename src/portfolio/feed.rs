// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Quote source used by the merge engine and price refresh.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{LedgerError, Result};
use crate::models::Sector;
use crate::money::{MAX_QUANTITY, round_price};
use crate::utils::http_client;

pub const FINNHUB_BASE: &str = "https://finnhub.io/api/v1";

static SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9.:\-]{1,50}$").expect("symbol pattern compiles"));

/// Instrument metadata and prices as reported by a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub name: String,
    pub exchange: String,
    pub sector: Sector,
    pub current_price: Decimal,
    pub previous_close: Decimal,
    pub market_cap: Option<i64>,
    pub website_url: Option<String>,
}

pub trait PriceLookup {
    /// Fails with [`LedgerError::PriceFeed`] when no usable quote is available.
    fn lookup(&self, symbol: &str) -> Result<Quote>;
}

pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(LedgerError::validation("symbol is required"));
    }
    if !SYMBOL_RE.is_match(&symbol) {
        return Err(LedgerError::validation(format!(
            "'{}' is not a valid ticker symbol",
            raw.trim()
        )));
    }
    Ok(symbol)
}

/// Maps a Finnhub industry label onto the sector codes used for allocation.
pub fn map_sector(industry: &str) -> Sector {
    match industry.trim() {
        "Technology" | "Information Technology" | "Software" | "Semiconductors" => {
            Sector::Technology
        }
        "Financial Services" | "Banks" | "Banking" | "Insurance" | "Capital Markets" => {
            Sector::Financials
        }
        "Healthcare" | "Health Care" | "Biotechnology" | "Pharmaceuticals" => Sector::Healthcare,
        "Industrials" | "Aerospace & Defense" | "Machinery" | "Transportation" => {
            Sector::Industrials
        }
        "Consumer Cyclical" | "Consumer Defensive" | "Consumer Staples" | "Retail" => {
            Sector::Consumer
        }
        "Energy" | "Oil & Gas" => Sector::Energy,
        _ => Sector::Other,
    }
}

#[allow(non_snake_case)]
#[derive(Debug, Deserialize)]
struct Profile {
    name: Option<String>,
    exchange: Option<String>,
    finnhubIndustry: Option<String>,
    marketCapitalization: Option<serde_json::Number>,
    weburl: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    c: Option<serde_json::Number>,
    pc: Option<serde_json::Number>,
    error: Option<String>,
}

fn number_to_decimal(n: &serde_json::Number, field: &str, symbol: &str) -> Result<Decimal> {
    let value = n
        .to_string()
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&n.to_string()))
        .map(round_price)
        .map_err(|_| LedgerError::PriceFeed(format!("{}: unreadable {} '{}'", symbol, field, n)))?;
    if value.abs() > MAX_QUANTITY {
        return Err(LedgerError::PriceFeed(format!(
            "{}: {} {} is out of range",
            symbol, field, value
        )));
    }
    Ok(value)
}

/// Turns the two Finnhub payloads into a [`Quote`]. A reported error or a
/// missing or non-positive current price is a feed failure.
fn quote_from_response(symbol: &str, profile: Profile, quote: RawQuote) -> Result<Quote> {
    if let Some(err) = profile.error.or(quote.error) {
        return Err(LedgerError::PriceFeed(format!("{}: {}", symbol, err)));
    }

    let current_price = match &quote.c {
        Some(n) => number_to_decimal(n, "current price", symbol)?,
        None => Decimal::ZERO,
    };
    if current_price <= Decimal::ZERO {
        return Err(LedgerError::PriceFeed(format!(
            "{}: no current price reported",
            symbol
        )));
    }
    let previous_close = match &quote.pc {
        Some(n) => number_to_decimal(n, "previous close", symbol)?,
        None => Decimal::ZERO,
    };
    let market_cap = profile
        .marketCapitalization
        .as_ref()
        .and_then(|n| n.as_f64())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as i64);

    Ok(Quote {
        name: profile.name.filter(|s| !s.is_empty()).unwrap_or_else(|| symbol.to_string()),
        exchange: profile.exchange.unwrap_or_default(),
        sector: map_sector(profile.finnhubIndustry.as_deref().unwrap_or("")),
        current_price,
        previous_close,
        market_cap,
        website_url: profile.weburl.filter(|s| !s.is_empty()),
    })
}

/// Blocking adapter for the Finnhub `profile2` and `quote` endpoints.
pub struct FinnhubFeed {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl FinnhubFeed {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LedgerError::PriceFeed(
                "FINNHUB_API_KEY not configured".to_string(),
            ));
        }
        let client = http_client().map_err(|e| LedgerError::PriceFeed(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    fn get<T: serde::de::DeserializeOwned>(&self, path: &str, symbol: &str) -> Result<T> {
        let url = format!("{}{}", FINNHUB_BASE, path);
        let feed_err = |e: reqwest::Error| LedgerError::PriceFeed(format!("{} {}: {}", path, symbol, e));
        let resp = self
            .client
            .get(url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .map_err(feed_err)?
            .error_for_status()
            .map_err(feed_err)?;
        resp.json::<T>().map_err(feed_err)
    }
}

impl PriceLookup for FinnhubFeed {
    fn lookup(&self, symbol: &str) -> Result<Quote> {
        let profile: Profile = self.get("/stock/profile2", symbol)?;
        let quote: RawQuote = self.get("/quote", symbol)?;
        let quote = quote_from_response(symbol, profile, quote)?;
        debug!(symbol, price = %quote.current_price, sector = %quote.sector, "quote fetched");
        Ok(quote)
    }
}
