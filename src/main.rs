// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use fundfolio::config::Settings;
use fundfolio::{cli, commands, db, users};

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    let settings = Settings::from_matches(&matches)?;
    init_tracing(&settings.log_level);

    let mut conn = db::open_at(&settings.db_path, settings.busy_timeout)?;
    let user = users::ensure_user(&conn, &settings.user_email)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!(
                "Database initialized at {} for {}",
                settings.db_path.display(),
                user.email
            );
        }
        Some(("user", sub)) => commands::users::handle(&conn, &user, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&mut conn, &user, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, &user, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, &user, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&mut conn, &user, sub)?,
        Some(("portfolio", sub)) => commands::portfolio::handle(&mut conn, &user, &settings, sub)?,
        Some(("wishlist", sub)) => commands::wishlist::handle(&mut conn, &user, &settings, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, &settings, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&conn, &user, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
