// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use super::{ListingPage, ObjectEntry, ObjectSource};
use crate::error::{ScanError, TransferError};

use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use std::path::Path;

const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for an S3 or S3-compatible store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub region: String,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...)
    pub endpoint: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
        }
    }
}

impl StoreConfig {
    /// Read `AWS_REGION`, `AWS_DEFAULT_REGION` and `AWS_ENDPOINT_URL` from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an explicit variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let region = non_empty("AWS_REGION")
            .or_else(|| non_empty("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            region,
            endpoint: non_empty("AWS_ENDPOINT_URL"),
        }
    }

    fn region(&self) -> Result<Region, ScanError> {
        match &self.endpoint {
            Some(endpoint) => Ok(Region::Custom {
                region: self.region.clone(),
                endpoint: endpoint.clone(),
            }),
            None => self
                .region
                .parse::<Region>()
                .map_err(|e| ScanError::Store(format!("invalid region {}: {e}", self.region))),
        }
    }
}

/// Blocking S3 client bound to one bucket
pub struct S3Source {
    name: String,
    bucket: Bucket,
}

impl S3Source {
    /// Connect to `bucket_name` using the default credential chain
    /// (environment, shared profile, instance metadata).
    pub fn new(bucket_name: &str, config: &StoreConfig) -> Result<Self, ScanError> {
        let creds = Credentials::new(None, None, None, None, None)?;
        Self::with_credentials(bucket_name, config, creds)
    }

    /// Connect to `bucket_name` with explicit credentials
    pub fn with_credentials(
        bucket_name: &str,
        config: &StoreConfig,
        creds: Credentials,
    ) -> Result<Self, ScanError> {
        let region = config.region()?;
        let mut bucket = Bucket::new(bucket_name, region, creds)
            .map_err(|e| ScanError::Store(format!("bucket {bucket_name}: {e}")))?;

        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        diagnostics::debug!(
            "Connected to bucket {bucket_name} in region {region}",
            bucket_name: bucket_name,
            region: config.region.as_str()
        );

        Ok(Self {
            name: bucket_name.to_string(),
            bucket,
        })
    }
}

fn check_status(key: &str, code: u16) -> Result<(), TransferError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(TransferError::Status {
            key: key.to_string(),
            code,
        })
    }
}

impl ObjectSource for S3Source {
    fn bucket(&self) -> &str {
        &self.name
    }

    fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListingPage, TransferError> {
        let (result, code) =
            self.bucket
                .list_page(prefix.to_string(), None, continuation, None, None)?;
        check_status(prefix, code)?;

        let entries = result
            .contents
            .into_iter()
            .map(|obj| ObjectEntry {
                key: obj.key,
                size: obj.size,
                last_modified: obj.last_modified,
            })
            .collect();

        // Some S3-compatible stores send a token on the last page as well
        let continuation = if result.is_truncated {
            result.next_continuation_token
        } else {
            None
        };

        Ok(ListingPage {
            entries,
            continuation,
        })
    }

    fn download(&self, key: &str, destination: &Path) -> Result<u64, TransferError> {
        let mut file = std::fs::File::create(destination)?;
        let written = self
            .bucket
            .get_object_to_writer(key, &mut file)
            .map_err(TransferError::from)
            .and_then(|code| check_status(key, code))
            .and_then(|()| file.metadata().map(|m| m.len()).map_err(TransferError::from));

        if written.is_err() {
            // Whatever landed on disk is an error document or a partial object
            drop(file);
            let _ = std::fs::remove_file(destination);
        }
        written
    }
}
