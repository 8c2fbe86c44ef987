// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Object store access
//!
//! The pipeline only talks to the store through [`ObjectSource`], so the S3
//! client and the in-memory bucket used by tests are interchangeable.

mod memory;
mod s3_source;

pub use memory::MemorySource;
pub use s3_source::{S3Source, StoreConfig};

use crate::error::TransferError;
use std::path::Path;

/// One object reported by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
}

impl ObjectEntry {
    /// Zero-content placeholder objects that some tools create for folders
    #[must_use]
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// One page of a listing; `continuation` is `None` on the last page
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub entries: Vec<ObjectEntry>,
    pub continuation: Option<String>,
}

/// Read access to one bucket
pub trait ObjectSource {
    /// Bucket this source reads from
    fn bucket(&self) -> &str;

    /// Fetch one page of keys under `prefix`, resuming from `continuation`
    fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListingPage, TransferError>;

    /// Copy the object's bytes to `destination`, returning the byte count
    fn download(&self, key: &str, destination: &Path) -> Result<u64, TransferError>;
}

impl<T: ObjectSource + ?Sized> ObjectSource for &T {
    fn bucket(&self) -> &str {
        (**self).bucket()
    }

    fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListingPage, TransferError> {
        (**self).list_page(prefix, continuation)
    }

    fn download(&self, key: &str, destination: &Path) -> Result<u64, TransferError> {
        (**self).download(key, destination)
    }
}
