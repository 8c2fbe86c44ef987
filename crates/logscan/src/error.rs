// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for log scanning
//!
//! Two tiers: [`ObjectError`] is scoped to one listed object and never ends
//! the run, [`ScanError`] ends the run.

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the object store
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Object store request failed: {0}")]
    Request(String),

    #[error("Object store returned HTTP {code} for {key}")]
    Status { key: String, code: u16 },

    #[error("I/O error while transferring: {0}")]
    Io(#[from] std::io::Error),
}

impl From<s3::error::S3Error> for TransferError {
    fn from(e: s3::error::S3Error) -> Self {
        TransferError::Request(e.to_string())
    }
}

/// Failure processing a single object; reported and skipped
#[derive(Error, Debug)]
pub enum ObjectError {
    #[error("Download failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Failed to decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON on line {line} of {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Object key {key} does not map to a path under the output directory")]
    UnsafeKey { key: String },
}

impl ObjectError {
    /// True for errors caused by record content rather than transport or disk
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, ObjectError::Decode { .. })
    }
}

/// A failed object, tied to the local path the failure relates to
#[derive(Error, Debug)]
#[error("Error processing file {}: {source}", path.display())]
pub struct ObjectFailure {
    pub path: PathBuf,
    #[source]
    pub source: ObjectError,
}

/// A match line with fewer fields than the line format has
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected 7 fields, found {fields}")]
pub struct ShortMatchLine {
    pub fields: usize,
}

/// Failure that ends the run
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid regex filter: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("Object store configuration error: {0}")]
    Store(String),

    #[error("Listing failed: {0}")]
    Listing(TransferError),

    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Match file not found: {}", path.display())]
    MatchFileMissing { path: PathBuf },

    #[error("Match file error {}: {source}", path.display())]
    MatchFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed line {line} in {}: expected 7 fields, found {fields}", path.display())]
    MalformedMatchLine {
        path: PathBuf,
        line: usize,
        fields: usize,
    },

    #[error("Failed to render report: {0}")]
    Render(#[from] arrow_schema::ArrowError),
}

impl From<s3::creds::error::CredentialsError> for ScanError {
    fn from(e: s3::creds::error::CredentialsError) -> Self {
        ScanError::Store(format!("credentials: {e}"))
    }
}
