// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

const UA: &str = concat!(
    "fundfolio/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/fundfolio)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts a plain date (taken as midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let d = parse_date(s)?;
    Ok(d.and_time(NaiveTime::MIN).and_utc())
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Value of an argument clap already marked required.
pub fn required<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("missing argument '{}'", id))
}

/// Parses an optional argument with `FromStr`.
pub fn parsed<T>(m: &clap::ArgMatches, id: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    m.get_one::<String>(id)
        .map(|s| s.parse::<T>().with_context(|| format!("Invalid --{} '{}'", id, s)))
        .transpose()
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d)
}

pub fn fmt_pct(d: &Decimal) -> String {
    format!("{:.2}%", d)
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let last_day = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => return Err(anyhow!("Invalid month number {}", month)),
    };
    Ok(last_day)
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line.
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_keep_two_places_and_a_sign() {
        use rust_decimal_macros::dec;
        assert_eq!(fmt_pct(&dec!(85)), "85.00%");
        assert_eq!(fmt_pct(&dec!(33.3333)), "33.33%");
        assert_eq!(fmt_pct(&dec!(-2.5)), "-2.50%");
    }

    #[test]
    fn february_follows_leap_years() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2025, 2).unwrap(), 28);
        assert_eq!(days_in_month(2100, 2).unwrap(), 28);
        assert!(days_in_month(2025, 13).is_err());
    }

    #[test]
    fn datetime_accepts_plain_dates() {
        let ts = parse_datetime("2025-08-10").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-08-10T00:00:00+00:00");
        let ts = parse_datetime("2025-08-10T12:30:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-08-10T10:30:00+00:00");
        assert!(parse_datetime("10/08/2025").is_err());
    }

    #[test]
    fn month_parses_to_first_day() {
        assert_eq!(
            parse_month("2025-08").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
        );
        assert!(parse_month("2025-8x").is_err());
    }
}
