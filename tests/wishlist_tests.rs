// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{Duration, Utc};
use fundfolio::errors::LedgerError;
use fundfolio::models::{AlertStatus, AlertType, Sector};
use fundfolio::portfolio::refresh_prices;
use fundfolio::wishlist::{
    NewWishlistItem, add_to_wishlist, check_price_alerts, list_price_alerts, list_wishlist,
    remove_from_wishlist, resolve_item,
};
use fundfolio::{db, users};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod common;
use common::FakeFeed;

fn setup() -> (Connection, String) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let user = users::ensure_user(&conn, "ada@example.com").unwrap();
    (conn, user.id)
}

fn watch(symbol: &str, target: Decimal) -> NewWishlistItem {
    NewWishlistItem {
        symbol: symbol.into(),
        target_buy_price: target,
        planned_investment_amount: Some(dec!(1000)),
        email_alerts_enabled: true,
        priority: None,
        notes: None,
        watch_reason: Some("  pullback  ".into()),
    }
}

#[test]
fn entries_record_the_price_when_added() {
    let (mut conn, user) = setup();
    let feed = FakeFeed::default().with("ACME", Sector::Technology, dec!(120), dec!(118));

    let view = add_to_wishlist(&mut conn, &user, watch("acme", dec!(100)), &feed).unwrap();
    assert_eq!(view.symbol, "ACME");
    assert_eq!(view.item.price_when_added, Some(dec!(120)));
    assert_eq!(view.item.priority, 5);
    assert_eq!(view.item.watch_reason.as_deref(), Some("pullback"));
    assert_eq!(view.item.planned_investment_amount.map(|d| d.to_string()), Some("1000.00".into()));
    assert_eq!(view.distance_to_target, dec!(-20));
    assert!(!view.should_trigger_alert);
}

#[test]
fn one_active_entry_per_stock() {
    let (mut conn, user) = setup();
    let feed = FakeFeed::default().with("ACME", Sector::Technology, dec!(120), dec!(118));
    let first = add_to_wishlist(&mut conn, &user, watch("ACME", dec!(100)), &feed).unwrap();
    let err = add_to_wishlist(&mut conn, &user, watch("ACME", dec!(90)), &feed).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateEntry(_)));

    remove_from_wishlist(&mut conn, &user, &first.item.id).unwrap();
    assert!(list_wishlist(&conn, &user).unwrap().is_empty());
    // re-watching after removal is allowed
    add_to_wishlist(&mut conn, &user, watch("ACME", dec!(90)), &feed).unwrap();
    assert_eq!(resolve_item(&conn, &user, "acme").unwrap().item.target_buy_price, dec!(90));
}

#[test]
fn priority_is_bounded() {
    let (mut conn, user) = setup();
    let feed = FakeFeed::default().with("ACME", Sector::Technology, dec!(120), dec!(118));
    let mut item = watch("ACME", dec!(100));
    item.priority = Some(11);
    assert!(matches!(
        add_to_wishlist(&mut conn, &user, item, &feed),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn prices_and_plans_must_fit_their_columns() {
    let (mut conn, user) = setup();
    let feed = FakeFeed::default().with("ACME", Sector::Technology, dec!(120), dec!(118));
    let mut fine_grained = watch("ACME", dec!(99.12345));
    fine_grained.planned_investment_amount = None;
    let mut huge_plan = watch("ACME", dec!(100));
    huge_plan.planned_investment_amount = Some(Decimal::MAX);
    for item in [fine_grained, watch("ACME", dec!(100000000000)), huge_plan] {
        assert!(matches!(
            add_to_wishlist(&mut conn, &user, item, &feed),
            Err(LedgerError::Validation(_))
        ));
    }
    assert!(list_wishlist(&conn, &user).unwrap().is_empty());
}

#[test]
fn alerts_fire_once_per_window_when_price_drops() {
    let (mut conn, user) = setup();
    let feed = FakeFeed::default()
        .with("ACME", Sector::Technology, dec!(120), dec!(118))
        .with("QUIET", Sector::Healthcare, dec!(50), dec!(50));
    add_to_wishlist(&mut conn, &user, watch("ACME", dec!(100)), &feed).unwrap();
    let mut quiet = watch("QUIET", dec!(60));
    quiet.email_alerts_enabled = false;
    add_to_wishlist(&mut conn, &user, quiet, &feed).unwrap();

    let now = Utc::now();
    assert!(check_price_alerts(&mut conn, &user, now).unwrap().is_empty());

    feed.set("ACME", Sector::Technology, dec!(99.50), dec!(120));
    refresh_prices(&mut conn, &feed).unwrap();

    let raised = check_price_alerts(&mut conn, &user, now).unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].alert_type, AlertType::PriceBelow);
    assert_eq!(raised[0].status, AlertStatus::Triggered);
    assert_eq!(raised[0].actual_price, dec!(99.50));
    assert_eq!(raised[0].target_price, dec!(100));
    assert!(!raised[0].email_sent);

    assert!(check_price_alerts(&mut conn, &user, now + Duration::hours(1)).unwrap().is_empty());
    assert_eq!(check_price_alerts(&mut conn, &user, now + Duration::hours(25)).unwrap().len(), 1);
    assert_eq!(list_price_alerts(&conn, &user).unwrap().len(), 2);
}
