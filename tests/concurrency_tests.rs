// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use fundfolio::ledger::{self, NewAccount};
use fundfolio::models::{AccountType, TransactionStatus, TransactionType};
use fundfolio::transactions::{NewTransaction, post_transaction, set_transaction_status};
use fundfolio::{db, users};
use rust_decimal_macros::dec;
use std::path::Path;
use std::thread;
use std::time::Duration;

const ROUNDS: usize = 40;

fn open(path: &Path) -> rusqlite::Connection {
    db::open_at(path, Duration::from_secs(10)).unwrap()
}

#[test]
fn concurrent_writers_conserve_the_balance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");

    let mut conn = open(&path);
    let user = users::ensure_user(&conn, "ada@example.com").unwrap().id;
    let account = ledger::create_account(
        &mut conn,
        &user,
        NewAccount {
            name: "Shared".into(),
            r#type: AccountType::Current,
            is_default: true,
            opening_balance: dec!(1000),
        },
    )
    .unwrap()
    .id;

    let writers: Vec<_> = [TransactionType::Income, TransactionType::Expense]
        .into_iter()
        .map(|ty| {
            let path = path.clone();
            let user = user.clone();
            thread::spawn(move || {
                let mut conn = open(&path);
                for _ in 0..ROUNDS {
                    let tx = post_transaction(
                        &mut conn,
                        &user,
                        NewTransaction::new(ty, dec!(10), Utc::now()),
                    )
                    .unwrap();
                    set_transaction_status(&mut conn, &user, &tx.id, TransactionStatus::Completed)
                        .unwrap();
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    let balance = ledger::get_account(&conn, &user, &account).unwrap().balance;
    assert_eq!(balance, dec!(1000));
    assert!(ledger::verify_ledger(&conn, &user).unwrap().is_empty());
}

#[test]
fn racing_completions_apply_the_delta_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");

    let mut conn = open(&path);
    let user = users::ensure_user(&conn, "ada@example.com").unwrap().id;
    let account = ledger::create_account(
        &mut conn,
        &user,
        NewAccount {
            name: "Shared".into(),
            r#type: AccountType::Current,
            is_default: true,
            opening_balance: dec!(100),
        },
    )
    .unwrap()
    .id;
    let tx = post_transaction(
        &mut conn,
        &user,
        NewTransaction::new(TransactionType::Expense, dec!(30), Utc::now()),
    )
    .unwrap();

    let racers: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let user = user.clone();
            let id = tx.id.clone();
            thread::spawn(move || {
                let mut conn = open(&path);
                set_transaction_status(&mut conn, &user, &id, TransactionStatus::Completed).unwrap();
            })
        })
        .collect();
    for r in racers {
        r.join().unwrap();
    }

    assert_eq!(ledger::get_account(&conn, &user, &account).unwrap().balance, dec!(70));
}
