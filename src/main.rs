mod config;
mod error;
mod inventory;
mod models;
mod remote;
mod report;


use crate::config::settings::{ProbeRendering, Settings, validate_host};
use crate::remote::PowerShellRemote;
use crate::report::formatter::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Arg, ArgGroup, Command};
use dotenvy::dotenv;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("Logon Inventory")
        .version(env!("CARGO_PKG_VERSION"))
        .about("List who is logged on to a Windows host and whether the console is locked")
        .arg(
            Arg::new("host")
                .help("Target host, short name or fully-qualified domain name")
                .value_parser(validate_host)
                .index(1),
        )
        .arg(
            Arg::new("computer-name")
                .long("computer-name")
                .short('c')
                .value_name("HOST")
                .help("Target host, as a named argument")
                .value_parser(validate_host),
        )
        .group(
            ArgGroup::new("target")
                .args(["host", "computer-name"])
                .required(true),
        )
        .arg(
            Arg::new("env-file")
                .long("env-file")
                .value_name("PATH")
                .help("Read LOGON_INVENTORY_* settings from this file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON instead of a table")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict-probe")
                .long("strict-probe")
                .help("Show 'unknown' instead of 'not locked' when the lock probe cannot run")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Help and version requests succeed; every other parse failure is a usage error.
fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn init_logging() {
    // Check if debug logging is enabled via .env
    let debug_enabled = env::var("DEBUG_LOGS_ENABLED")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    if debug_enabled {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open("logon_inventory.log");

        match log_file {
            Ok(file) => {
                env_logger::Builder::from_env(
                    env_logger::Env::default().default_filter_or("logon_inventory=debug"),
                )
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();

                log::info!("=== DEBUG LOGGING ENABLED ===");
                log::info!("Writing logs to logon_inventory.log");
                return;
            }
            Err(e) => eprintln!("Cannot open logon_inventory.log, logging to stderr: {}", e),
        }
    }

    // Warnings still reach stderr so partial enrichment is visible
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("logon_inventory=warn"),
    )
    .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            let code = usage_exit_code(&e);
            let _ = e.print();
            std::process::exit(code);
        }
    };

    dotenv().ok();
    init_logging();

    let host = matches
        .get_one::<String>("host")
        .or_else(|| matches.get_one::<String>("computer-name"))
        .cloned()
        .unwrap_or_default();

    let mut settings = match matches.get_one::<PathBuf>("env-file") {
        Some(path) => Settings::from_path(path),
        None => Settings::from_env(),
    }
    .context("Invalid configuration")?;
    if matches.get_flag("strict-probe") {
        settings.probe_rendering = ProbeRendering::Strict;
    }
    let format = if matches.get_flag("json") {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    log::info!("Inventorying logons on {}", host);
    let remote = PowerShellRemote::new(&settings);

    let mut sessions = match inventory::inventory_host(&remote, &host, &settings).await {
        Ok(sessions) => sessions,
        Err(e) => {
            log::debug!("Inventory of {} failed: {:?}", host, e);
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    formatter::sort_sessions(&mut sessions);
    let output = formatter::render(&sessions, format).context("Failed to render report")?;
    print!("{}", output);
    Ok(())
}
