// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fundfolio::ledger::{self, NewAccount};
use fundfolio::models::{AccountType, TransactionCategory, TransactionStatus, User};
use fundfolio::{cli, commands::importer, db, users};
use rusqlite::Connection;
use rust_decimal_macros::dec;
use std::io::Write;
use tempfile::NamedTempFile;

fn base_conn() -> (Connection, User) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    let user = users::ensure_user(&conn, "ada@example.com").unwrap();
    for (name, opening) in [("Checking", dec!(100)), ("Savings", dec!(0))] {
        ledger::create_account(
            &mut conn,
            &user.id,
            NewAccount {
                name: name.into(),
                r#type: AccountType::Current,
                is_default: false,
                opening_balance: opening,
            },
        )
        .unwrap();
    }
    (conn, user)
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", body).unwrap();
    file.flush().unwrap();
    file
}

fn count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn importer_trims_cli_path_argument() {
    let (mut conn, user) = base_conn();
    let file = csv_file("date,type,amount\n2025-02-03,EXPENSE,5.00\n");

    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["fundfolio", "import", "csv", &padded]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&mut conn, &user, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    assert_eq!(count(&conn), 1);
}

#[test]
fn bad_rows_are_reported_and_good_rows_kept() {
    let (mut conn, user) = base_conn();
    let file = csv_file(
        "date,type,amount,category,account,description,status,recurring_interval\n\
         2025-02-01,INCOME,1200.00,salary,savings,Payroll,COMPLETED,\n\
         2025-02-02,EXPENSE,-3,,,,,\n\
         not-a-date,EXPENSE,3,,,,,\n\
         2025-02-04,EXPENSE,40,groceries,,Market,COMPLETED,\n\
         2025-02-05,EXPENSE,500,,Checking,,COMPLETED,\n\
         2025-02-06,EXPENSE,9.99,entertainment,,Streaming,,MONTHLY\n\
         2025-02-07,TRANSFER,1,,,,,\n",
    );

    let report = importer::import_csv(&mut conn, &user.id, file.path()).unwrap();
    assert_eq!(report.created_count(), 3);
    assert_eq!(report.error_count(), 4);
    let failed: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
    assert_eq!(failed, vec![2, 3, 5, 7]);
    assert!(report.errors[2].reason.contains("Insufficient funds"));

    let payroll = &report.created[0];
    assert_eq!(payroll.category, TransactionCategory::Salary);
    assert_eq!(payroll.status, TransactionStatus::Completed);
    let streaming = &report.created[2];
    assert!(streaming.is_recurring);
    assert_eq!(streaming.status, TransactionStatus::Pending);

    let checking = ledger::resolve_account(&conn, &user.id, "checking").unwrap();
    let savings = ledger::resolve_account(&conn, &user.id, "savings").unwrap();
    assert_eq!(checking.balance, dec!(60.00));
    assert_eq!(savings.balance, dec!(1200.00));
    assert_eq!(count(&conn), 3);
    assert!(ledger::verify_ledger(&conn, &user.id).unwrap().is_empty());
}

#[test]
fn oversized_row_is_reported_and_siblings_still_import() {
    let (mut conn, user) = base_conn();
    let file = csv_file(
        "date,type,amount,category,account,description,status,recurring_interval\n\
         2025-03-01,INCOME,50.00,,checking,,COMPLETED,\n\
         2025-03-02,INCOME,79228162514264337593543950335,,checking,,COMPLETED,\n\
         2025-03-03,EXPENSE,20.00,,checking,,COMPLETED,\n",
    );

    let report = importer::import_csv(&mut conn, &user.id, file.path()).unwrap();
    assert_eq!(report.created_count(), 2);
    assert_eq!(report.error_count(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert!(report.errors[0].reason.contains("amount"));

    let checking = ledger::resolve_account(&conn, &user.id, "checking").unwrap();
    assert_eq!(checking.balance, dec!(130.00));
    assert!(ledger::verify_ledger(&conn, &user.id).unwrap().is_empty());
}

#[test]
fn missing_file_is_an_error() {
    let (mut conn, user) = base_conn();
    let err = importer::import_csv(&mut conn, &user.id, std::path::Path::new("/nonexistent/x.csv"))
        .unwrap_err();
    assert!(err.to_string().starts_with("Open CSV"));
}
