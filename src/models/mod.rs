//! Domain models for the Tradeflow reconciliation pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`TradeRecord`] - raw bilateral trade row as found in the input table
//! - [`CountryRef`] - country reference entry (code, name, region)
//! - [`CommodityRef`] - commodity reference entry (code, name, sector)
//! - [`Flow`] - trade flow direction (export/import)
//! - [`ReconciledRecord`] - canonical row-level output of the pipeline

use serde::{Deserialize, Serialize};

/// Canonical region/sector bucket for anything that cannot be classified.
///
/// Every unresolved or sentinel-valued region and sector converges on this
/// single value so aggregate views can isolate unresolved mass instead of
/// guessing among near-synonymous "unknown" strings.
pub const UNCLASSIFIED: &str = "Unclassified";

// =============================================================================
// Flow Direction
// =============================================================================

/// Direction of a trade flow.
///
/// The raw tables carry single-letter codes; both Comtrade generations are
/// accepted (`X`/`M` and the older `E`/`I`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Export,
    Import,
}

impl Flow {
    /// Parse a flow from its source code. Returns `None` for anything outside
    /// the recognized two-value enumeration; callers must reject such records
    /// rather than invent a third flow category.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_uppercase();
        match normalized.as_str() {
            "X" | "E" | "EXPORT" => Some(Self::Export),
            "M" | "I" | "IMPORT" => Some(Self::Import),
            _ => None,
        }
    }

    /// Canonical single-letter source code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Export => "X",
            Self::Import => "M",
        }
    }

    /// Human-readable label used in the reconciled output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Import => "import",
        }
    }
}

// =============================================================================
// Raw Input Rows
// =============================================================================

/// A raw trade record as read from the trade input table.
///
/// One row per reporter/partner/commodity/flow/period combination. The flow
/// code is kept as a string here; it is validated during reconciliation so a
/// malformed code rejects the single record instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub period: i32,
    #[serde(rename = "flowCode")]
    pub flow_code: String,
    #[serde(rename = "reporterCode")]
    pub reporter_code: i64,
    #[serde(rename = "partnerCode")]
    pub partner_code: i64,
    #[serde(rename = "cmdCode")]
    pub commodity_code: i64,
    #[serde(rename = "primaryValue")]
    pub value: f64,
}

/// A country reference entry. Auxiliary ISO columns in the source table are
/// ignored by the deserializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRef {
    #[serde(rename = "id")]
    pub code: i64,
    #[serde(rename = "text")]
    pub name: String,
    #[serde(rename = "world_part", default)]
    pub region: String,
}

impl CountryRef {
    pub fn new(code: i64, name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            region: region.into(),
        }
    }
}

/// A commodity reference entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityRef {
    #[serde(rename = "id")]
    pub code: i64,
    #[serde(rename = "text")]
    pub name: String,
    #[serde(default)]
    pub sector: String,
}

impl CommodityRef {
    pub fn new(code: i64, name: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            sector: sector.into(),
        }
    }
}

// =============================================================================
// Reconciled Output Row
// =============================================================================

/// The canonical row-level output of the pipeline: the raw trade fields plus
/// resolved names, normalized classifications and derived values.
///
/// Field order here defines the column order of the reconciled CSV output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRecord {
    pub period: i32,
    /// Canonical source flow code (`X`/`M`).
    pub flow_code: String,
    /// Typed flow; serializes as the `export`/`import` label.
    #[serde(rename = "flowLabel")]
    pub flow: Flow,
    pub reporter_code: i64,
    pub partner_code: i64,
    /// Never empty: unresolved partners get a synthesized placeholder.
    pub partner_name: String,
    /// Drawn from the fixed region set plus [`UNCLASSIFIED`].
    pub region: String,
    pub commodity_code: i64,
    /// Never empty: unresolved commodities get a synthesized placeholder.
    pub commodity_name: String,
    pub sector: String,
    /// Original currency units.
    pub value: f64,
    /// `value / 1_000_000`.
    pub value_scaled: f64,
}
