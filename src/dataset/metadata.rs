//! Metadata Loader
//!
//! Reads the delimited metadata file that describes each product image.
//! The first line is a header; the id and label columns are looked up by
//! name. Rows that fail to parse are skipped and counted rather than
//! aborting the load. Ids are unique: a repeated id would point a second
//! row at the same image file, so only its first row is kept.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::utils::error::{PrepError, Result};

/// Which columns of the metadata file hold the id and category label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataColumns {
    /// Header name of the numeric image id column
    pub id_column: String,
    /// Header name of the category column
    pub label_column: String,
    /// Field delimiter
    pub delimiter: char,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            label_column: "articleType".to_string(),
            delimiter: ',',
        }
    }
}

/// One parsed metadata row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Numeric image id; the image file is named after it
    pub id: u64,
    /// Category label as written in the file
    pub raw_label: String,
}

/// Row counts from a metadata load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Non-blank data rows seen
    pub rows_read: usize,
    /// Rows dropped as malformed
    pub rows_skipped: usize,
    /// Well-formed rows dropped because their id appeared earlier
    pub duplicate_ids: usize,
}

/// Load metadata records from a delimited text file
pub fn load_metadata(
    path: &Path,
    columns: &MetadataColumns,
) -> Result<(Vec<MetadataRecord>, LoadReport)> {
    if !path.is_file() {
        return Err(PrepError::MetadataNotFound(path.to_path_buf()));
    }

    info!("Loading metadata from: {:?}", path);
    let bytes = fs::read(path)?;
    // Product catalogues often carry stray non-UTF-8 bytes in free-text columns
    let content = String::from_utf8_lossy(&bytes);

    parse_metadata(&content, columns)
}

/// Parse metadata from in-memory text
pub fn parse_metadata(
    content: &str,
    columns: &MetadataColumns,
) -> Result<(Vec<MetadataRecord>, LoadReport)> {
    let mut lines = content.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break split_fields(line, columns.delimiter),
            None => {
                return Err(PrepError::Dataset(
                    "Metadata file has no header row".to_string(),
                ))
            }
        }
    };

    let id_idx = column_index(&header, &columns.id_column)?;
    let label_idx = column_index(&header, &columns.label_column)?;

    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut report = LoadReport::default();

    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        report.rows_read += 1;

        match parse_row(line, header.len(), id_idx, label_idx, columns.delimiter) {
            Some(record) if !seen_ids.insert(record.id) => {
                report.duplicate_ids += 1;
                debug!("Ignoring repeated id {} on row {}", record.id, line_no + 1);
            }
            Some(record) => records.push(record),
            None => {
                report.rows_skipped += 1;
                debug!("Skipping malformed metadata row {}", line_no + 1);
            }
        }
    }

    if report.rows_skipped > 0 {
        warn!(
            "Skipped {} of {} metadata rows as malformed",
            report.rows_skipped, report.rows_read
        );
    }
    if report.duplicate_ids > 0 {
        warn!(
            "Ignored {} metadata rows with an id seen earlier",
            report.duplicate_ids
        );
    }
    info!("Loaded {} metadata records", records.len());

    Ok((records, report))
}

fn column_index(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| PrepError::MissingColumn(name.to_string()))
}

fn parse_row(
    line: &str,
    expected_fields: usize,
    id_idx: usize,
    label_idx: usize,
    delimiter: char,
) -> Option<MetadataRecord> {
    let fields = split_fields(line, delimiter);
    if fields.len() != expected_fields {
        return None;
    }

    let id = fields[id_idx].trim().parse::<u64>().ok()?;
    let raw_label = fields[label_idx].trim();
    if raw_label.is_empty() {
        return None;
    }

    Some(MetadataRecord {
        id,
        raw_label: raw_label.to_string(),
    })
}

/// Split one line into fields, honouring double-quoted fields
///
/// A doubled quote inside a quoted field is a literal quote.
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            c => field.push(c),
        }
    }
    fields.push(field);

    fields
}
