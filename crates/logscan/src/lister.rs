// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Paginated listing as a lazy iterator

use crate::error::TransferError;
use crate::store::{ObjectEntry, ObjectSource};

use std::collections::VecDeque;

/// Iterator over every object under a prefix
///
/// Pages are fetched on demand. After an error or the last page the
/// iterator is exhausted; it cannot be restarted.
pub struct ObjectLister<'a> {
    source: &'a dyn ObjectSource,
    prefix: String,
    buffered: VecDeque<ObjectEntry>,
    continuation: Option<String>,
    pages: usize,
    done: bool,
}

impl<'a> ObjectLister<'a> {
    #[must_use]
    pub fn new(source: &'a dyn ObjectSource, prefix: &str) -> Self {
        Self {
            source,
            prefix: prefix.to_string(),
            buffered: VecDeque::new(),
            continuation: None,
            pages: 0,
            done: false,
        }
    }

    /// Number of listing pages fetched so far
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pages
    }

    fn fetch_page(&mut self) -> Result<(), TransferError> {
        let page = self
            .source
            .list_page(&self.prefix, self.continuation.take())?;
        self.pages += 1;

        diagnostics::debug!(
            "Listed page {page_number} of {bucket}/{prefix}: {count} objects",
            page_number: self.pages,
            bucket: self.source.bucket(),
            prefix: self.prefix.as_str(),
            count: page.entries.len()
        );

        self.buffered.extend(page.entries);
        self.continuation = page.continuation;
        if self.continuation.is_none() {
            self.done = true;
        }
        Ok(())
    }
}

impl Iterator for ObjectLister<'_> {
    type Item = Result<ObjectEntry, TransferError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffered.pop_front() {
                return Some(Ok(entry));
            }
            if self.done {
                return None;
            }
            // Empty pages with a continuation token are legal; keep going
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
