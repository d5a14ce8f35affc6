// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::{fmt_ts, new_id, ts_at};
use crate::errors::{LedgerError, Result};
use crate::models::User;

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        email: r.get(1)?,
        created_at: ts_at(r, 2)?,
    })
}

pub fn find_user(conn: &Connection, email: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, email, created_at FROM users WHERE email=?1",
            params![email.trim()],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

/// Returns the user with this email, creating the row on first use.
pub fn ensure_user(conn: &Connection, email: &str) -> Result<User> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(LedgerError::validation(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    conn.execute(
        "INSERT INTO users(id, email, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(email) DO NOTHING",
        params![new_id(), email, fmt_ts(Utc::now())],
    )?;
    find_user(conn, &email)?.ok_or_else(|| LedgerError::not_found("User", email))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, email, created_at FROM users ORDER BY email")?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_user_is_idempotent_and_case_insensitive() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let a = ensure_user(&conn, "Ada@Example.com").unwrap();
        let b = ensure_user(&conn, "ada@example.com ").unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(list_users(&conn).unwrap().len(), 1);
        assert!(ensure_user(&conn, "nobody").is_err());
    }
}
