// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{ListingPage, ObjectEntry, ObjectSource};
use crate::error::TransferError;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-memory bucket
///
/// Lists keys in lexical order like S3 does, pages with a continuation token
/// equal to the last key returned, and records every download request.
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    objects: BTreeMap<String, Vec<u8>>,
    page_size: usize,
    failing: BTreeSet<String>,
    fail_listing: bool,
    downloads: RefCell<Vec<String>>,
    list_calls: RefCell<usize>,
}

impl MemorySource {
    #[must_use]
    pub fn new(bucket: &str) -> Self {
        Self {
            name: bucket.to_string(),
            objects: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            failing: BTreeSet::new(),
            fail_listing: false,
            downloads: RefCell::new(Vec::new()),
            list_calls: RefCell::new(0),
        }
    }

    #[must_use]
    pub fn with_object(mut self, key: &str, content: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.to_string(), content.into());
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Downloads of `key` fail with a 500 response
    #[must_use]
    pub fn with_failing_download(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    /// Every listing call fails, as with bad credentials
    #[must_use]
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Keys passed to [`ObjectSource::download`], in call order
    #[must_use]
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.borrow().clone()
    }

    #[must_use]
    pub fn list_calls(&self) -> usize {
        *self.list_calls.borrow()
    }
}

impl ObjectSource for MemorySource {
    fn bucket(&self) -> &str {
        &self.name
    }

    fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListingPage, TransferError> {
        *self.list_calls.borrow_mut() += 1;

        if self.fail_listing {
            return Err(TransferError::Request(format!(
                "access denied listing {}/{prefix}",
                self.name
            )));
        }

        let mut matching = self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| continuation.as_deref().is_none_or(|after| key.as_str() > after));

        let entries: Vec<ObjectEntry> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, data)| ObjectEntry {
                key: key.clone(),
                size: data.len() as u64,
                last_modified: "2024-01-01T00:00:00.000Z".to_string(),
            })
            .collect();

        let continuation = match (matching.next(), entries.last()) {
            (Some(_), Some(last)) => Some(last.key.clone()),
            _ => None,
        };

        Ok(ListingPage {
            entries,
            continuation,
        })
    }

    fn download(&self, key: &str, destination: &Path) -> Result<u64, TransferError> {
        self.downloads.borrow_mut().push(key.to_string());

        if self.failing.contains(key) {
            return Err(TransferError::Status {
                key: key.to_string(),
                code: 500,
            });
        }

        let data = self
            .objects
            .get(key)
            .ok_or_else(|| TransferError::Status {
                key: key.to_string(),
                code: 404,
            })?;
        std::fs::write(destination, data)?;
        Ok(data.len() as u64)
    }
}
