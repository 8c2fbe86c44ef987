// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Ad-hoc triage of WAF logs kept in an object store
//!
//! One sequential pass over a bucket prefix:
//!
//! - **Listing**: [`ObjectLister`] pages through the keys under the prefix
//! - **Fetching**: [`fetch_object`] mirrors each object under the output
//!   directory and replaces `.gz` files with their decompressed content
//! - **Filtering**: [`scan_file`] tests every raw line against a regex and
//!   appends the extracted fields of matching JSON records to the match file
//! - **Reporting**: [`render_report`] reads the match file back as a table
//!
//! [`Scanner`] ties the stages together. The store is reached through the
//! [`ObjectSource`] trait: [`S3Source`] for real buckets, [`MemorySource`]
//! for tests.
//!
//! # Usage
//!
//! ```no_run
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use logscan::{RunConfig, S3Source, StoreConfig, run_and_report};
//!
//! let source = S3Source::new("logs", &StoreConfig::from_env())?;
//! let config = RunConfig::new("waf/2024/", "BLOCK", "tmp/run")?;
//! let summary = run_and_report(&source, &config, |line| println!("{line}"))?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

mod error;
pub mod fetch;
pub mod filter;
pub mod lister;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod store;

pub use error::{ObjectError, ObjectFailure, ScanError, ShortMatchLine, TransferError};
pub use fetch::{FetchedFile, fetch_object, local_path, relative_path};
pub use filter::{MATCH_FILE_NAME, MatchLog, scan_file};
pub use lister::ObjectLister;
pub use pipeline::{RunConfig, RunSummary, Scanner, run_and_report};
pub use record::{LogRecord, MISSING, MatchRecord, ReportRow};
pub use report::{Report, render_report};
pub use store::{ListingPage, MemorySource, ObjectEntry, ObjectSource, S3Source, StoreConfig};

/// Result type for run-level operations
pub type Result<T> = std::result::Result<T, ScanError>;
