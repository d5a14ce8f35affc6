// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use fundfolio::errors::{self, LedgerError};
use fundfolio::models::Sector;
use fundfolio::portfolio::{PriceLookup, Quote};
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::HashMap;

/// In-memory quote source; symbols without a quote fail like a dead feed.
#[derive(Default)]
pub struct FakeFeed {
    pub quotes: RefCell<HashMap<String, Quote>>,
}

impl FakeFeed {
    pub fn with(self, symbol: &str, sector: Sector, price: Decimal, previous: Decimal) -> Self {
        self.set(symbol, sector, price, previous);
        self
    }

    pub fn set(&self, symbol: &str, sector: Sector, price: Decimal, previous: Decimal) {
        self.quotes.borrow_mut().insert(
            symbol.to_string(),
            Quote {
                name: format!("{} Inc", symbol),
                exchange: "NASDAQ".into(),
                sector,
                current_price: price,
                previous_close: previous,
                market_cap: Some(1_000_000),
                website_url: None,
            },
        );
    }
}

impl PriceLookup for FakeFeed {
    fn lookup(&self, symbol: &str) -> errors::Result<Quote> {
        self.quotes
            .borrow()
            .get(symbol)
            .cloned()
            .ok_or_else(|| LedgerError::PriceFeed(format!("{}: unavailable", symbol)))
    }
}

