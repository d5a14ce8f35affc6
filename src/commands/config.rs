// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{
    ALERT_THRESHOLD_KEY, Settings, alert_threshold, get_setting, set_alert_threshold,
};
use crate::utils::{parse_decimal, pretty_table, required};
use anyhow::{Result, bail};
use rusqlite::Connection;

pub fn handle(conn: &Connection, settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = required(sub, "key")?;
            match get_setting(conn, key)? {
                Some(v) => println!("{}", v),
                None if key == ALERT_THRESHOLD_KEY => println!("{}", alert_threshold(conn)?),
                None => println!("(unset)"),
            }
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            match key {
                ALERT_THRESHOLD_KEY => set_alert_threshold(conn, parse_decimal(value)?)?,
                _ => bail!("Unknown setting '{}'; known: {}", key, ALERT_THRESHOLD_KEY),
            }
            println!("{} = {}", key, value);
        }
        Some(("show", _)) => {
            let rows = vec![
                vec!["database".into(), settings.db_path.display().to_string()],
                vec!["user".into(), settings.user_email.clone()],
                vec!["log level".into(), settings.log_level.clone()],
                vec![
                    "busy timeout".into(),
                    format!("{} ms", settings.busy_timeout.as_millis()),
                ],
                vec![
                    "finnhub key".into(),
                    if settings.finnhub_api_key.is_some() { "set" } else { "unset" }.into(),
                ],
                vec![ALERT_THRESHOLD_KEY.into(), alert_threshold(conn)?.to_string()],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
