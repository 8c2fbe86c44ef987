// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Line filtering, field extraction, and the append-only match file

use crate::error::{ObjectError, ScanError};
use crate::record::{LogRecord, MatchRecord};

use regex::Regex;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Name of the match file inside the output directory
///
/// The reporter reads the file the filter writes; both take the name from
/// the run configuration, which defaults to this constant.
pub const MATCH_FILE_NAME: &str = "matched_logs.log";

/// Append-only sink for serialized matches
pub struct MatchLog {
    path: PathBuf,
    file: File,
    written: usize,
}

impl MatchLog {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ScanError::MatchFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            written: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended through this handle
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append one record as a line
    ///
    /// Each line is flushed so an interrupted run leaves complete lines.
    pub fn append(&mut self, record: &MatchRecord) -> Result<(), ObjectError> {
        let mut line = record.to_line();
        line.push('\n');
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|source| ObjectError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.written += 1;
        Ok(())
    }
}

/// Line reader with text-mode line endings
///
/// `\n`, `\r\n` and a lone `\r` all end a line, and every ending comes
/// back as `\n`. A final line without an ending is returned as is.
struct LineReader<R> {
    inner: R,
    after_cr: bool,
}

impl<R: BufRead> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            after_cr: false,
        }
    }

    /// Read the next line into `buf`; `Ok(false)` at end of file
    fn next_line(&mut self, buf: &mut String) -> std::io::Result<bool> {
        buf.clear();
        let mut bytes = Vec::new();
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                break;
            }
            // The `\n` of a `\r\n` split across reads
            if std::mem::take(&mut self.after_cr) && available[0] == b'\n' {
                self.inner.consume(1);
                continue;
            }
            match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(end) => {
                    bytes.extend_from_slice(&available[..end]);
                    self.after_cr = available[end] == b'\r';
                    self.inner.consume(end + 1);
                    bytes.push(b'\n');
                    break;
                }
                None => {
                    let len = available.len();
                    bytes.extend_from_slice(available);
                    self.inner.consume(len);
                }
            }
        }

        if bytes.is_empty() {
            return Ok(false);
        }
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        buf.push_str(text);
        Ok(true)
    }
}

/// Scan `path` for lines matching `filter` and append each match to `log`
///
/// The regex sees the raw line, newline included. Only matching lines are
/// parsed as JSON; a line that fails to parse ends the scan of this file
/// with [`ObjectError::Decode`], keeping the matches already appended.
/// Returns the number of matches.
pub fn scan_file<F>(
    path: &Path,
    filter: &Regex,
    log: &mut MatchLog,
    emit: &mut F,
) -> Result<usize, ObjectError>
where
    F: FnMut(String),
{
    emit(format!("Processing {} for regex matches...", path.display()));

    let file = File::open(path).map_err(|source| ObjectError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = LineReader::new(BufReader::new(file));

    let mut line = String::new();
    let mut line_number = 0;
    let mut match_count = 0;

    while reader.next_line(&mut line).map_err(|source| ObjectError::Read {
        path: path.to_path_buf(),
        source,
    })? {
        line_number += 1;
        if !filter.is_match(&line) {
            continue;
        }
        match_count += 1;

        let record = LogRecord::parse(&line).map_err(|source| ObjectError::Decode {
            path: path.to_path_buf(),
            line: line_number,
            source,
        })?;
        let matched = MatchRecord::from_log(path, record);

        emit(format!("MATCH {}: {}", match_count, matched.to_line()));
        log.append(&matched)?;
    }

    emit(format!(
        "Found {} matches in {}.",
        match_count,
        path.display()
    ));
    diagnostics::info!(
        "Scanned {path} ({lines} lines, {matches} matches)",
        path: path.display().to_string(),
        lines: line_number,
        matches: match_count
    );

    Ok(match_count)
}
