// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::config::{DEFAULT_LOG_LEVEL, DEFAULT_USER};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as a JSON array"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id).num_args(1).help(help)
}

fn key(help: &'static str) -> Arg {
    Arg::new("key").required(true).help(help)
}

pub fn build_cli() -> Command {
    Command::new("fundfolio")
        .about("Personal ledger, budget tracker and portfolio valuation")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env("FUNDFOLIO_DB")
                .help("Path to the SQLite database"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("FUNDFOLIO_USER")
                .default_value(DEFAULT_USER)
                .help("Email of the user to act as"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .env("FUNDFOLIO_LOG")
                .default_value(DEFAULT_LOG_LEVEL)
                .help("Log filter, e.g. info or fundfolio=debug"),
        )
        .arg(
            Arg::new("busy-timeout-ms")
                .long("busy-timeout-ms")
                .global(true)
                .env("FUNDFOLIO_BUSY_TIMEOUT_MS")
                .value_parser(value_parser!(u64))
                .help("How long a writer waits for the database lock [default: 5000]"),
        )
        .arg(
            Arg::new("finnhub-key")
                .long("finnhub-key")
                .global(true)
                .env("FINNHUB_API_KEY")
                .hide_env_values(true)
                .help("Finnhub API token for quotes"),
        )
        .subcommand(Command::new("init").about("Create the database and the current user"))
        .subcommand(
            Command::new("user")
                .about("Users")
                .subcommand(Command::new("show"))
                .subcommand(json_args(Command::new("list"))),
        )
        .subcommand(
            Command::new("account")
                .about("Accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            opt("type", "CURRENT or SAVINGS")
                                .default_value("CURRENT"),
                        )
                        .arg(opt("opening-balance", "Starting balance").default_value("0"))
                        .arg(
                            Arg::new("default")
                                .long("default")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(
                    Command::new("update")
                        .arg(key("Account id or name"))
                        .arg(opt("name", "New name"))
                        .arg(opt("type", "CURRENT or SAVINGS"))
                        .arg(
                            opt("default", "true or false")
                                .value_parser(value_parser!(bool)),
                        ),
                )
                .subcommand(Command::new("default").arg(key("Account id or name")))
                .subcommand(Command::new("rm").arg(key("Account id or name"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(opt("type", "INCOME or EXPENSE").required(true))
                        .arg(
                            opt("amount", "Positive amount")
                                .required(true)
                                .allow_hyphen_values(true),
                        )
                        .arg(opt("date", "YYYY-MM-DD or RFC 3339; defaults to now"))
                        .arg(opt("account", "Account id or name; defaults to the default account"))
                        .arg(opt("category", "Category").default_value("OTHER"))
                        .arg(opt("description", "Free text"))
                        .arg(opt("status", "PENDING, COMPLETED or FAILED").default_value("PENDING"))
                        .arg(opt("recurring", "DAILY, WEEKLY, MONTHLY or YEARLY")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(opt("month", "YYYY-MM"))
                        .arg(opt("account", "Account id or name"))
                        .arg(opt("type", "INCOME or EXPENSE"))
                        .arg(opt("status", "PENDING, COMPLETED or FAILED"))
                        .arg(opt("limit", "Maximum rows").value_parser(value_parser!(usize))),
                ))
                .subcommand(
                    Command::new("status")
                        .arg(Arg::new("id").required(true))
                        .arg(Arg::new("status").required(true)),
                )
                .subcommand(
                    Command::new("update")
                        .arg(Arg::new("id").required(true))
                        .arg(opt("type", "INCOME or EXPENSE"))
                        .arg(opt("amount", "Positive amount").allow_hyphen_values(true))
                        .arg(opt("date", "YYYY-MM-DD or RFC 3339"))
                        .arg(opt("account", "Account id or name"))
                        .arg(opt("category", "Category"))
                        .arg(opt("description", "Free text; empty clears it"))
                        .arg(opt("recurring", "DAILY, WEEKLY, MONTHLY or YEARLY"))
                        .arg(
                            Arg::new("no-recurring")
                                .long("no-recurring")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("recurring"),
                        ),
                )
                .subcommand(Command::new("rm").arg(Arg::new("id").required(true)))
                .subcommand(json_args(
                    Command::new("process-recurring")
                        .about("Create the due occurrences of recurring transactions"),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Bulk import")
                .subcommand(json_args(
                    Command::new("csv")
                        .about("Import transactions from a CSV file with a header row")
                        .long_about(
                            "Import transactions from a CSV file with the header \
                             date,type,amount,category,account,description,status,recurring_interval. \
                             Rows with a blank status are imported as PENDING and do not change \
                             the account balance until completed; use status COMPLETED to apply them.",
                        )
                        .arg(Arg::new("path").required(true)),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budget")
                .subcommand(
                    Command::new("set").arg(
                        Arg::new("amount")
                            .required(true)
                            .allow_hyphen_values(true),
                    ),
                )
                .subcommand(json_args(
                    Command::new("show").arg(opt("as-of", "Evaluate as of this date")),
                ))
                .subcommand(Command::new("alert-sent").about("Mark the budget alert as delivered")),
        )
        .subcommand(
            Command::new("portfolio")
                .about("Holdings and valuation")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("symbol").required(true))
                        .arg(opt("shares", "Number of shares").required(true))
                        .arg(opt("price", "Price per share").required(true))
                        .arg(opt("date", "Purchase date; defaults to today"))
                        .arg(opt("notes", "Appended to the holding notes"))
                        .arg(opt("thesis", "Replaces the investment thesis")),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("remove").arg(key("Holding id or symbol")))
                .subcommand(
                    Command::new("note")
                        .arg(key("Holding id or symbol"))
                        .arg(opt("notes", "Replace notes"))
                        .arg(opt("thesis", "Replace investment thesis"))
                        .arg(opt("target", "Target allocation percentage")),
                )
                .subcommand(json_args(
                    Command::new("summary").arg(
                        Arg::new("refresh")
                            .long("refresh")
                            .action(ArgAction::SetTrue)
                            .help("Recompute before printing"),
                    ),
                ))
                .subcommand(json_args(Command::new("refresh-prices"))),
        )
        .subcommand(
            Command::new("wishlist")
                .about("Watched stocks and price alerts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("symbol").required(true))
                        .arg(opt("target", "Target buy price").required(true))
                        .arg(opt("planned", "Planned investment amount"))
                        .arg(
                            opt("priority", "1 to 10")
                                .value_parser(value_parser!(i32)),
                        )
                        .arg(opt("notes", "Free text"))
                        .arg(opt("reason", "Why you are watching it"))
                        .arg(
                            Arg::new("no-alerts")
                                .long("no-alerts")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(json_args(Command::new("list")))
                .subcommand(Command::new("rm").arg(key("Wishlist id or symbol")))
                .subcommand(json_args(Command::new("check")))
                .subcommand(json_args(Command::new("alerts"))),
        )
        .subcommand(
            Command::new("config")
                .about("Stored preferences")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(json_args(
            Command::new("doctor").about("Check balances against completed transactions"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_flags_reach_subcommands() {
        let m = build_cli().get_matches_from([
            "fundfolio",
            "tx",
            "list",
            "--user",
            "ada@example.com",
            "--limit",
            "3",
        ]);
        assert_eq!(m.get_one::<String>("user").unwrap(), "ada@example.com");
        let (_, tx) = m.subcommand().unwrap();
        let (_, list) = tx.subcommand().unwrap();
        assert_eq!(list.get_one::<usize>("limit"), Some(&3));
    }

    #[test]
    fn import_help_explains_blank_status() {
        let mut cmd = build_cli();
        let csv = cmd
            .find_subcommand_mut("import")
            .and_then(|import| import.find_subcommand_mut("csv"))
            .unwrap();
        let help = csv.render_long_help().to_string();
        assert!(help.contains("PENDING"));
        assert!(help.contains("COMPLETED"));
    }
}
