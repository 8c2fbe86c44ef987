// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Summary table over the match file

use crate::error::ScanError;
use crate::record::ReportRow;

use arrow::util::pretty::pretty_format_batches;
use arrow_array::{ArrayRef, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Column headers of the report; country is written but not displayed
pub const REPORT_COLUMNS: [&str; 6] = [
    "File Name",
    "Timestamp",
    "Action",
    "Client IP",
    "HTTP Method",
    "URI",
];

/// Read every row of the match file at `path`
pub fn read_match_file(path: &Path) -> Result<Vec<ReportRow>, ScanError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::MatchFileMissing {
                path: path.to_path_buf(),
            }
        } else {
            ScanError::MatchFile {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut rows = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| ScanError::MatchFile {
            path: path.to_path_buf(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = ReportRow::parse(line).map_err(|short| ScanError::MalformedMatchLine {
            path: path.to_path_buf(),
            line: index + 1,
            fields: short.fields,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Arrange rows as a record batch with the report columns
pub fn rows_to_batch(rows: &[ReportRow]) -> Result<RecordBatch, ScanError> {
    let schema = Arc::new(Schema::new(
        REPORT_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    ));

    let column = |get: fn(&ReportRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(rows.iter().map(get)))
    };

    let columns = vec![
        column(|r| r.file_name.as_str()),
        column(|r| r.timestamp.as_str()),
        column(|r| r.action.as_str()),
        column(|r| r.client_ip.as_str()),
        column(|r| r.http_method.as_str()),
        column(|r| r.uri.as_str()),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// The rendered table and its row count
#[derive(Debug, Clone)]
pub struct Report {
    pub rows: usize,
    pub table: String,
}

/// Render the match file at `path` as a table
pub fn render_report(path: &Path) -> Result<Report, ScanError> {
    let rows = read_match_file(path)?;
    let batch = rows_to_batch(&rows)?;
    let table = pretty_format_batches(&[batch])?.to_string();

    diagnostics::debug!(
        "Rendered report from {path} with {count} rows",
        path: path.display().to_string(),
        count: rows.len()
    );

    Ok(Report {
        rows: rows.len(),
        table,
    })
}
