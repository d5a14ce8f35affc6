// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use fundfolio::errors::{ErrorCategory, LedgerError};
use fundfolio::ledger::{self, AccountPatch, NewAccount};
use fundfolio::models::{AccountType, TransactionStatus, TransactionType};
use fundfolio::transactions::{NewTransaction, post_transaction, set_transaction_status};
use fundfolio::{db, users};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn setup() -> (Connection, String) {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let user = users::ensure_user(&conn, "ada@example.com").unwrap();
    (conn, user.id)
}

fn account(conn: &mut Connection, user: &str, name: &str, opening: Decimal) -> String {
    ledger::create_account(
        conn,
        user,
        NewAccount {
            name: name.into(),
            r#type: AccountType::Current,
            is_default: false,
            opening_balance: opening,
        },
    )
    .unwrap()
    .id
}

fn completed(ty: TransactionType, amount: Decimal, account: &str) -> NewTransaction {
    let mut new = NewTransaction::new(ty, amount, Utc::now());
    new.account = Some(account.to_string());
    new.status = TransactionStatus::Completed;
    new
}

fn balance(conn: &Connection, user: &str, id: &str) -> Decimal {
    ledger::get_account(conn, user, id).unwrap().balance
}

fn defaults(conn: &Connection, user: &str) -> usize {
    ledger::list_accounts(conn, user)
        .unwrap()
        .iter()
        .filter(|a| a.is_default)
        .count()
}

#[test]
fn overdraft_is_rejected_and_balance_kept() {
    let (mut conn, user) = setup();
    let acc = account(&mut conn, &user, "Checking", Decimal::ZERO);

    post_transaction(&mut conn, &user, completed(TransactionType::Income, dec!(500), &acc)).unwrap();
    assert_eq!(balance(&conn, &user, &acc), dec!(500.00));

    let err = post_transaction(&mut conn, &user, completed(TransactionType::Expense, dec!(600), &acc))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(err.category(), ErrorCategory::Invariant);
    assert_eq!(balance(&conn, &user, &acc), dec!(500.00));

    // the rejected row was rolled back together with the balance change
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn balance_equals_opening_plus_completed_history() {
    let (mut conn, user) = setup();
    let acc = account(&mut conn, &user, "Checking", dec!(100.50));

    post_transaction(&mut conn, &user, completed(TransactionType::Income, dec!(1200.25), &acc)).unwrap();
    post_transaction(&mut conn, &user, completed(TransactionType::Expense, dec!(300.75), &acc)).unwrap();

    let mut pending = NewTransaction::new(TransactionType::Expense, dec!(50), Utc::now());
    pending.account = Some(acc.clone());
    let pending = post_transaction(&mut conn, &user, pending).unwrap();
    assert_eq!(balance(&conn, &user, &acc), dec!(1000.00));

    set_transaction_status(&mut conn, &user, &pending.id, TransactionStatus::Failed).unwrap();
    assert_eq!(balance(&conn, &user, &acc), dec!(1000.00));

    assert!(ledger::verify_ledger(&conn, &user).unwrap().is_empty());
}

#[test]
fn exactly_one_default_through_the_lifecycle() {
    let (mut conn, user) = setup();
    let first = account(&mut conn, &user, "First", Decimal::ZERO);
    let second = account(&mut conn, &user, "Second", Decimal::ZERO);
    let third = account(&mut conn, &user, "Third", Decimal::ZERO);
    assert!(ledger::get_account(&conn, &user, &first).unwrap().is_default);
    assert_eq!(defaults(&conn, &user), 1);

    ledger::set_default_account(&mut conn, &user, &third).unwrap();
    assert_eq!(defaults(&conn, &user), 1);
    assert!(ledger::get_account(&conn, &user, &third).unwrap().is_default);

    // unsetting hands the flag to the oldest other account
    ledger::update_account(
        &mut conn,
        &user,
        &third,
        AccountPatch {
            is_default: Some(false),
            ..AccountPatch::default()
        },
    )
    .unwrap();
    assert!(ledger::get_account(&conn, &user, &first).unwrap().is_default);

    ledger::delete_account(&mut conn, &user, &first).unwrap();
    assert_eq!(defaults(&conn, &user), 1);
    assert!(ledger::get_account(&conn, &user, &second).unwrap().is_default);
}

#[test]
fn sole_default_cannot_be_unset() {
    let (mut conn, user) = setup();
    let only = account(&mut conn, &user, "Only", Decimal::ZERO);
    let err = ledger::update_account(
        &mut conn,
        &user,
        &only,
        AccountPatch {
            is_default: Some(false),
            ..AccountPatch::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::DefaultRequired));
    assert_eq!(defaults(&conn, &user), 1);
}

#[test]
fn deletion_rules() {
    let (mut conn, user) = setup();
    let main = account(&mut conn, &user, "Main", dec!(10));
    assert!(matches!(
        ledger::delete_account(&mut conn, &user, &main).unwrap_err(),
        LedgerError::SoleAccount
    ));

    let spare = account(&mut conn, &user, "Spare", Decimal::ZERO);
    post_transaction(&mut conn, &user, completed(TransactionType::Expense, dec!(5), &main)).unwrap();
    assert!(matches!(
        ledger::delete_account(&mut conn, &user, &main).unwrap_err(),
        LedgerError::HasTransactions
    ));

    ledger::delete_account(&mut conn, &user, &spare).unwrap();
    assert_eq!(ledger::list_accounts(&conn, &user).unwrap().len(), 1);
}

#[test]
fn account_limit_is_enforced() {
    let (mut conn, user) = setup();
    for i in 0..ledger::MAX_ACCOUNTS_PER_USER {
        account(&mut conn, &user, &format!("acct{}", i), Decimal::ZERO);
    }
    let err = ledger::create_account(
        &mut conn,
        &user,
        NewAccount {
            name: "one too many".into(),
            r#type: AccountType::Savings,
            is_default: false,
            opening_balance: Decimal::ZERO,
        },
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::MaxAccountsExceeded(10)));
}

#[test]
fn users_are_isolated() {
    let (mut conn, ada) = setup();
    let bob = users::ensure_user(&conn, "bob@example.com").unwrap().id;
    let acc = account(&mut conn, &ada, "Checking", Decimal::ZERO);

    assert!(ledger::get_account(&conn, &bob, &acc).is_err());
    assert!(ledger::list_accounts(&conn, &bob).unwrap().is_empty());
    // names only clash within one user
    account(&mut conn, &bob, "Checking", Decimal::ZERO);
}

#[test]
fn doctor_reports_tampered_balance() {
    let (mut conn, user) = setup();
    let acc = account(&mut conn, &user, "Checking", dec!(20));
    conn.execute("UPDATE accounts SET balance='25.00' WHERE id=?1", [&acc])
        .unwrap();
    let issues = ledger::verify_ledger(&conn, &user).unwrap();
    assert_eq!(
        issues,
        vec![ledger::LedgerIssue::BalanceDrift {
            account: "checking".into(),
            stored: dec!(25.00),
            expected: dec!(20.00),
        }]
    );
}
