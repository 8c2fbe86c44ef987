// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Scan command - pull logs under a bucket prefix and filter them
//!
//! Example:
//!   waflog my-waf-logs AWSLogs/123/WAFLogs/ --regex-filter BLOCK

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::Args;
use logscan::{ObjectSource, RunConfig, RunSummary, run_and_report};

use crate::common::resolve_output_dir;

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// The name of the S3 bucket containing WAF logs
    pub bucket_name: String,

    /// The S3 prefix where WAF logs are stored
    pub s3_prefix: String,

    /// Regex filter to apply on log entries
    #[arg(long)]
    pub regex_filter: String,

    /// Local directory to store downloaded logs [default: tmp/<YYYYmmdd-HHMM>]
    #[arg(long)]
    pub local_dir: Option<PathBuf>,
}

impl ScanArgs {
    /// Build the run configuration, compiling the regex
    pub fn run_config(&self, started: &DateTime<Local>) -> Result<RunConfig> {
        let output_dir = resolve_output_dir(self.local_dir.clone(), started);
        RunConfig::new(&self.s3_prefix, &self.regex_filter, output_dir)
            .with_context(|| format!("Invalid arguments for {}/{}", self.bucket_name, self.s3_prefix))
    }
}

/// Scan the bucket named in `args`, sending console lines to `emit`
///
/// The regex is compiled before `open_source` is called, so bad arguments
/// fail without touching the store. The report table and the run summary
/// are the last two lines emitted.
pub fn scan_command<S, O, F>(
    args: &ScanArgs,
    started: &DateTime<Local>,
    open_source: O,
    mut emit: F,
) -> Result<RunSummary>
where
    S: ObjectSource,
    O: FnOnce(&str) -> Result<S>,
    F: FnMut(String),
{
    let config = args.run_config(started)?;
    let source = open_source(&args.bucket_name)?;

    diagnostics::debug!(
        "Scanning {bucket} with filter {filter}",
        bucket: source.bucket(),
        filter: args.regex_filter.as_str()
    );

    let summary = run_and_report(&source, &config, &mut emit).with_context(|| {
        format!(
            "Scan of {}/{} failed",
            source.bucket(),
            args.s3_prefix
        )
    })?;

    emit(summary.to_string());
    Ok(summary)
}
