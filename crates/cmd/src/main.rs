// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use cmd::commands::{ScanArgs, scan_command};
use logscan::{S3Source, StoreConfig};

/// Pull S3 logs from a bucket path recursively and parse the contents of
/// the logs based on a simple regex filter.
///
/// Credentials and region come from the usual AWS environment
/// (AWS_ACCESS_KEY_ID, AWS_PROFILE, AWS_REGION, AWS_ENDPOINT_URL, ...).
/// Set WAFLOG_LOG=info or WAFLOG_LOG=debug for diagnostics on stderr.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "waflog")]
struct Cli {
    #[command(flatten)]
    scan: ScanArgs,
}

fn main() {
    if let Err(err) = main_result() {
        diagnostics::error!("Run failed: {reason}", reason: format!("{err:#}"));
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    diagnostics::init_diagnostics();

    let started = Local::now();
    let cli = Cli::parse();

    let open_bucket = |bucket: &str| {
        S3Source::new(bucket, &StoreConfig::from_env())
            .with_context(|| format!("Failed to open bucket {bucket}"))
    };

    scan_command(&cli.scan, &started, open_bucket, |line| println!("{line}"))?;
    Ok(())
}
