// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The list → download → decompress → filter → report run

use crate::error::{ObjectFailure, ScanError};
use crate::fetch::{fetch_object, local_path};
use crate::filter::{MATCH_FILE_NAME, MatchLog, scan_file};
use crate::lister::ObjectLister;
use crate::report::{Report, render_report};
use crate::store::{ObjectEntry, ObjectSource};

use regex::Regex;
use std::fmt;
use std::path::PathBuf;

/// Everything one run needs besides the object source
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub prefix: String,
    pub filter: Regex,
    pub output_dir: PathBuf,
    /// Shared by the match writer and the reporter
    pub match_file_name: String,
}

impl RunConfig {
    /// Compile `regex_filter`; an invalid pattern ends the run before any I/O
    pub fn new(
        prefix: &str,
        regex_filter: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ScanError> {
        Ok(Self {
            prefix: prefix.to_string(),
            filter: Regex::new(regex_filter)?,
            output_dir: output_dir.into(),
            match_file_name: MATCH_FILE_NAME.to_string(),
        })
    }

    #[must_use]
    pub fn with_match_file_name(mut self, name: &str) -> Self {
        self.match_file_name = name.to_string();
        self
    }

    #[must_use]
    pub fn match_file(&self) -> PathBuf {
        self.output_dir.join(&self.match_file_name)
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub listed: usize,
    pub skipped: usize,
    pub processed: usize,
    pub failed: usize,
    pub matches: usize,
    pub match_file: PathBuf,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} objects listed, {} skipped, {} processed, {} failed, {} matches in {}",
            self.listed,
            self.skipped,
            self.processed,
            self.failed,
            self.matches,
            self.match_file.display()
        )
    }
}

/// Sequential scan of one bucket prefix
///
/// Console lines go to `emit` in the order they happen; structured
/// diagnostics go through the `diagnostics` crate.
pub struct Scanner<'a, F: FnMut(String)> {
    source: &'a dyn ObjectSource,
    config: &'a RunConfig,
    emit: F,
}

impl<'a, F: FnMut(String)> Scanner<'a, F> {
    pub fn new(source: &'a dyn ObjectSource, config: &'a RunConfig, emit: F) -> Self {
        Self {
            source,
            config,
            emit,
        }
    }

    /// Process every listed object
    ///
    /// Per-object failures are reported and counted. Listing failures and
    /// failures to set up the output directory end the run.
    pub fn run(&mut self) -> Result<RunSummary, ScanError> {
        let config = self.config;
        let output_dir = &config.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|source| ScanError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let mut log = MatchLog::open(&config.match_file())?;
        let mut summary = RunSummary {
            match_file: log.path().to_path_buf(),
            ..RunSummary::default()
        };

        diagnostics::info!(
            "Scanning {bucket}/{prefix} into {dir}",
            bucket: self.source.bucket(),
            prefix: config.prefix.as_str(),
            dir: output_dir.display().to_string()
        );

        let mut lister = ObjectLister::new(self.source, &config.prefix);
        for entry in lister.by_ref() {
            let entry = entry.map_err(ScanError::Listing)?;
            summary.listed += 1;

            if entry.is_directory_marker() {
                summary.skipped += 1;
                continue;
            }

            match self.process(&entry, &mut log) {
                Ok(count) => {
                    summary.processed += 1;
                    summary.matches += count;
                }
                Err(failure) => {
                    summary.failed += 1;
                    (self.emit)(failure.to_string());
                    diagnostics::warn!(
                        "Failed to process {key}: {reason}",
                        key: entry.key.as_str(),
                        reason: failure.source.to_string()
                    );
                }
            }
        }

        diagnostics::info!(
            "Scan complete: {listed} listed in {pages} pages, {failed} failed, {written} lines appended to {match_file}",
            listed: summary.listed,
            pages: lister.pages(),
            failed: summary.failed,
            written: log.written(),
            match_file: summary.match_file.display().to_string()
        );
        Ok(summary)
    }

    /// Download, unpack and scan one object
    fn process(&mut self, entry: &ObjectEntry, log: &mut MatchLog) -> Result<usize, ObjectFailure> {
        let destination = local_path(&self.config.output_dir, &entry.key, &self.config.prefix)
            .map_err(|source| ObjectFailure {
                path: PathBuf::from(&entry.key),
                source,
            })?;

        let fetched = fetch_object(self.source, &entry.key, &destination, &mut self.emit)
            .map_err(|source| ObjectFailure {
                path: destination.clone(),
                source,
            })?;

        diagnostics::debug!(
            "Fetched {key} to {path} ({bytes} bytes, decompressed: {decompressed})",
            key: entry.key.as_str(),
            path: fetched.path.display().to_string(),
            bytes: fetched.bytes_downloaded,
            decompressed: fetched.decompressed
        );
        if fetched.bytes_downloaded != entry.size {
            diagnostics::warn!(
                "{key} was {listed} bytes when listed (modified {modified}) but {bytes} bytes were downloaded",
                key: entry.key.as_str(),
                listed: entry.size,
                modified: entry.last_modified.as_str(),
                bytes: fetched.bytes_downloaded
            );
        }

        scan_file(&fetched.path, &self.config.filter, log, &mut self.emit).map_err(|source| {
            ObjectFailure {
                path: fetched.path.clone(),
                source,
            }
        })
    }

    /// Render the match file of this run
    pub fn report(&self) -> Result<Report, ScanError> {
        render_report(&self.config.match_file())
    }
}

/// Run the scan and print the report, returning the summary
pub fn run_and_report<F>(
    source: &dyn ObjectSource,
    config: &RunConfig,
    mut emit: F,
) -> Result<RunSummary, ScanError>
where
    F: FnMut(String),
{
    let mut scanner = Scanner::new(source, config, &mut emit);
    let summary = scanner.run()?;
    let report = scanner.report()?;
    emit(report.table);
    Ok(summary)
}
