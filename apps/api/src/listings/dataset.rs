//! MLS export loading: reads an uploaded CSV into a loosely-typed table.
//!
//! Column names are normalized (trimmed, lowercased) on load so every later
//! lookup can assume the canonical form. Cells stay as raw text; blank cells
//! behave like missing values and never match a status or parse as a price.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no header row")]
    MissingHeader,
}

/// One uploaded listing export. Read once per request and dropped after metrics extraction.
#[derive(Debug, Clone, Default)]
pub struct ListingDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ListingDataset {
    /// Builds a dataset from already-split headers and rows.
    /// Headers are normalized and short rows padded to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, String::new());
                }
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Parses raw CSV bytes. Row widths may vary; a leading UTF-8 BOM is ignored.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DatasetError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(DatasetError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Normalized column names in original order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at (`row`, `column`) unless it is blank.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Lowercases and trims a header so lookups are insensitive to export quirks.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}
