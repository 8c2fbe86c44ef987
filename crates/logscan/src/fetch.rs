// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Download objects into a mirrored local tree and unpack gzip files

use crate::error::ObjectError;
use crate::store::ObjectSource;

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

/// Suffix of objects that are decompressed after download
pub const GZIP_SUFFIX: &str = ".gz";

/// A downloaded object, ready for filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Plaintext file to scan (the decompressed file for `.gz` objects)
    pub path: PathBuf,
    pub bytes_downloaded: u64,
    pub decompressed: bool,
}

/// Path of `key` relative to `prefix`
///
/// Keys that continue the prefix at a `/` boundary keep the remainder.
/// A key equal to the prefix keeps its file name. Otherwise the prefix's
/// directory part is stripped, so a prefix that ends mid-name still mirrors
/// the partial component (`waf/20` + `waf/2024/a.log` gives `2024/a.log`).
///
/// Returns `None` if the result would leave the output root.
#[must_use]
pub fn relative_path(key: &str, prefix: &str) -> Option<PathBuf> {
    let trimmed = prefix.trim_end_matches('/');

    let relative = if trimmed.is_empty() {
        key
    } else if key == trimmed || key == prefix {
        key.rsplit('/').next().unwrap_or(key)
    } else if let Some(rest) = key
        .strip_prefix(trimmed)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        rest
    } else {
        match prefix.rfind('/') {
            Some(pos) => key.strip_prefix(&prefix[..=pos]).unwrap_or(key),
            None => key,
        }
    };

    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let path = PathBuf::from(relative);
    let contained = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    contained.then_some(path)
}

/// Local destination for `key` under `output_root`
pub fn local_path(output_root: &Path, key: &str, prefix: &str) -> Result<PathBuf, ObjectError> {
    relative_path(key, prefix)
        .map(|rel| output_root.join(rel))
        .ok_or_else(|| ObjectError::UnsafeKey {
            key: key.to_string(),
        })
}

/// Decompressed sibling of a `.gz` path, or `None` for other files
#[must_use]
pub fn decompressed_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(GZIP_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(stem))
}

/// Replace a gzip file with its decompressed content
///
/// On failure the partial output is removed and the compressed file is
/// left in place for inspection.
pub fn decompress_in_place(compressed: &Path, target: &Path) -> Result<(), ObjectError> {
    let unpack = || -> std::io::Result<()> {
        let mut decoder = MultiGzDecoder::new(BufReader::new(File::open(compressed)?));
        let mut out = BufWriter::new(File::create(target)?);
        std::io::copy(&mut decoder, &mut out)?;
        out.flush()
    };

    if let Err(source) = unpack() {
        let _ = std::fs::remove_file(target);
        return Err(ObjectError::Decompress {
            path: compressed.to_path_buf(),
            source,
        });
    }

    std::fs::remove_file(compressed).map_err(|source| ObjectError::Write {
        path: compressed.to_path_buf(),
        source,
    })
}

/// Download `key` to `destination` and unpack it if it is gzip
///
/// `emit` receives the console progress lines.
pub fn fetch_object<F>(
    source: &dyn ObjectSource,
    key: &str,
    destination: &Path,
    emit: &mut F,
) -> Result<FetchedFile, ObjectError>
where
    F: FnMut(String),
{
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ObjectError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let bytes_downloaded = source.download(key, destination)?;
    emit(format!("Downloaded: {} to {}", key, destination.display()));

    let Some(target) = decompressed_path(destination) else {
        return Ok(FetchedFile {
            path: destination.to_path_buf(),
            bytes_downloaded,
            decompressed: false,
        });
    };

    decompress_in_place(destination, &target)?;
    emit(format!("Decompressed: {}", target.display()));

    Ok(FetchedFile {
        path: target,
        bytes_downloaded,
        decompressed: true,
    })
}
