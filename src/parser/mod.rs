//! Typed CSV loaders for the three input tables, with encoding and delimiter
//! auto-detection.
//!
//! Input files come from different export tools and show up in UTF-8,
//! ISO-8859 and Windows-1252 with varying delimiters, so every loader runs
//! detection before handing the decoded content to the `csv` reader.
//!
//! Rows that fail to deserialize are skipped and reported per line; an input
//! table that ends up with zero usable rows is a hard error
//! ([`TableError::EmptyTable`]) because the pipeline must never build a
//! dataset that silently misses a whole dimension.

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{TableError, TableResult};
use crate::models::{CommodityRef, CountryRef, TradeRecord};

/// A parsed input table with detection metadata.
#[derive(Debug, Clone)]
pub struct LoadedTable<T> {
    /// Logical table name, used in error messages.
    pub name: String,
    /// Successfully parsed rows, in input order.
    pub rows: Vec<T>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Rows that failed to deserialize: (1-based line number, message).
    pub skipped: Vec<(usize, String)>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> TableResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        // Fallback: lossy UTF-8
        _ => Ok(String::from_utf8_lossy(bytes).to_string()),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes into typed rows after detecting encoding and delimiter.
///
/// `required_columns` are checked against the header row up front so a wrong
/// file produces one clear [`TableError::MissingColumn`] instead of a skipped
/// message per row.
pub fn parse_table<T: DeserializeOwned>(
    bytes: &[u8],
    name: &str,
    required_columns: &[&str],
) -> TableResult<LoadedTable<T>> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;

    if content.trim().is_empty() {
        return Err(TableError::EmptyTable(name.to_string()));
    }

    let delimiter = detect_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::ParseError(format!("{name}: cannot read header: {e}")))?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    for column in required_columns {
        if !headers.iter().any(|h| h == column) {
            return Err(TableError::MissingColumn {
                table: name.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut rows = Vec::new();
    let mut skipped = Vec::new();

    for (idx, result) in reader.deserialize::<T>().enumerate() {
        // +1 for 1-based, +1 for the header line
        let line = idx + 2;
        match result {
            Ok(row) => rows.push(row),
            Err(e) => skipped.push((line, e.to_string())),
        }
    }

    if rows.is_empty() {
        return Err(TableError::EmptyTable(name.to_string()));
    }

    Ok(LoadedTable {
        name: name.to_string(),
        rows,
        encoding,
        delimiter,
        skipped,
    })
}

fn read_file(path: &Path) -> TableResult<Vec<u8>> {
    std::fs::read(path).map_err(TableError::IoError)
}

/// Load the trade table from a file.
pub fn load_trade_table(path: &Path) -> TableResult<LoadedTable<TradeRecord>> {
    parse_trade_table(&read_file(path)?)
}

/// Parse the trade table from raw bytes.
pub fn parse_trade_table(bytes: &[u8]) -> TableResult<LoadedTable<TradeRecord>> {
    parse_table(
        bytes,
        "trade",
        &[
            "period",
            "flowCode",
            "reporterCode",
            "partnerCode",
            "cmdCode",
            "primaryValue",
        ],
    )
}

/// Load the country reference table from a file.
pub fn load_country_table(path: &Path) -> TableResult<LoadedTable<CountryRef>> {
    parse_country_table(&read_file(path)?)
}

/// Parse the country reference table from raw bytes. Auxiliary ISO columns
/// are ignored; `world_part` is optional and defaults to empty.
pub fn parse_country_table(bytes: &[u8]) -> TableResult<LoadedTable<CountryRef>> {
    parse_table(bytes, "countries", &["id", "text"])
}

/// Load the commodity reference table from a file.
pub fn load_commodity_table(path: &Path) -> TableResult<LoadedTable<CommodityRef>> {
    parse_commodity_table(&read_file(path)?)
}

/// Parse the commodity reference table from raw bytes.
pub fn parse_commodity_table(bytes: &[u8]) -> TableResult<LoadedTable<CommodityRef>> {
    parse_table(bytes, "commodities", &["id", "text"])
}
