// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod feed;
pub mod holdings;
pub mod merge;
pub mod summary;

pub use feed::{FinnhubFeed, PriceLookup, Quote, map_sector, normalize_symbol};
pub use holdings::{
    HoldingMeta, PriceRefresh, add_or_merge_holding, list_holdings, refresh_prices,
    remove_holding, resolve_holding, update_holding_meta,
};
pub use merge::{HoldingState, Lot, merge_holding, validate_lot};
pub use summary::{compute_summary, get_portfolio_summary, refresh_portfolio_summary};
