// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! WAF log records and the match-file line format
//!
//! A match line is seven comma-joined fields:
//!
//! ```text
//! local_file_path,timestamp,action,clientIp,httpMethod,country,uri
//! ```
//!
//! Commas inside values are not escaped. Readers split by position and
//! ignore anything past the seventh field.

use crate::error::ShortMatchLine;

use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Rendered in place of an absent field
pub const MISSING: &str = "N/A";

/// Field separator of match lines
pub const SEPARATOR: char = ',';

/// Number of fields in a match line
pub const MATCH_FIELDS: usize = 7;

/// The part of a WAF log event the scanner extracts
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub http_request: Option<HttpRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default)]
    pub client_ip: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl LogRecord {
    /// Parse one log line
    ///
    /// Goes through [`Value`] so that a repeated key keeps its last value.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(line)?;
        serde_json::from_value(value)
    }

    /// Timestamp as text: strings verbatim, other JSON values as JSON
    #[must_use]
    pub fn timestamp_text(&self) -> Option<String> {
        self.timestamp.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// A log record that matched the filter, tied to the file it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub source: PathBuf,
    pub timestamp: Option<String>,
    pub action: Option<String>,
    pub client_ip: Option<String>,
    pub http_method: Option<String>,
    pub country: Option<String>,
    pub uri: Option<String>,
}

impl MatchRecord {
    #[must_use]
    pub fn from_log(source: &Path, record: LogRecord) -> Self {
        let timestamp = record.timestamp_text();
        let http = record.http_request.unwrap_or_default();
        Self {
            source: source.to_path_buf(),
            timestamp,
            action: record.action,
            client_ip: http.client_ip,
            http_method: http.http_method,
            country: http.country,
            uri: http.uri,
        }
    }

    /// Serialize as a match-file line, without the trailing newline
    #[must_use]
    pub fn to_line(&self) -> String {
        let source = self.source.display().to_string();
        let fields = [
            Some(source.as_str()),
            self.timestamp.as_deref(),
            self.action.as_deref(),
            self.client_ip.as_deref(),
            self.http_method.as_deref(),
            self.country.as_deref(),
            self.uri.as_deref(),
        ];

        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(SEPARATOR);
            }
            line.push_str(field.unwrap_or(MISSING));
        }
        line
    }
}

/// One row of the report table, read back from a match line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub file_name: String,
    pub timestamp: String,
    pub action: String,
    pub client_ip: String,
    pub http_method: String,
    pub country: String,
    pub uri: String,
}

impl ReportRow {
    /// Split a match line by position
    pub fn parse(line: &str) -> Result<Self, ShortMatchLine> {
        let fields: Vec<&str> = line.split(SEPARATOR).collect();
        if fields.len() < MATCH_FIELDS {
            return Err(ShortMatchLine {
                fields: fields.len(),
            });
        }
        Ok(Self {
            file_name: fields[0].to_string(),
            timestamp: fields[1].to_string(),
            action: fields[2].to_string(),
            client_ip: fields[3].to_string(),
            http_method: fields[4].to_string(),
            country: fields[5].to_string(),
            uri: fields[6].to_string(),
        })
    }
}
