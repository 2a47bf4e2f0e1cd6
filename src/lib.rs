//! # Tradeflow - bilateral trade reconciliation and aggregation
//!
//! Tradeflow joins raw bilateral trade records against country and commodity
//! reference tables, producing one canonical reconciled dataset per run plus
//! named analytical views over it (yearly trend, top commodities, sector
//! structure, partner balances, structural change).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV Tables │────▶│   Parser    │────▶│  Reconcile  │────▶│   Dataset   │
//! │ (ISO/UTF8)  │     │ (auto-enc)  │     │ (left join) │     │  (+ views)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tradeflow::{run_pipeline, PipelineOptions};
//!
//! let output = run_pipeline(
//!     Path::new("trade.csv"),
//!     Path::new("countries.csv"),
//!     Path::new("commodities.csv"),
//!     PipelineOptions::default(),
//! )?;
//! println!("{} reconciled records", output.dataset.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (TradeRecord, CountryRef, ReconciledRecord)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`reference`] - Reference resolution and fallback policy
//! - [`reconcile`] - Left-join reconciliation
//! - [`aggregate`] - Read-only dataset views
//! - [`validation`] - Output schema validation
//! - [`pipeline`] - Run orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Reference resolution
pub mod reference;

// Reconciliation
pub mod reconcile;

// Aggregation
pub mod aggregate;

// Validation
pub mod validation;

// Pipeline orchestration
pub mod pipeline;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    PipelineError, ReconcileError, ServerError, TableError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CommodityRef, CountryRef, Flow, ReconciledRecord, TradeRecord, UNCLASSIFIED,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, load_commodity_table, load_country_table,
    load_trade_table, parse_table, LoadedTable,
};

// =============================================================================
// Re-exports - Reference
// =============================================================================

pub use reference::{AliasTable, Resolver};

// =============================================================================
// Re-exports - Reconciliation
// =============================================================================

pub use reconcile::{reconcile, ReconcileOutput, ReconcileSummary};

// =============================================================================
// Re-exports - Aggregation
// =============================================================================

pub use aggregate::{
    CommodityTotalRow, Dataset, PartnerBalanceRow, SectorShareRow, StructuralChangeRow,
    YearlyTrendRow,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    is_valid, is_valid_reconciled_record, validate, validate_reconciled_batch,
    validate_reconciled_record,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    build_dataset, run_pipeline, write_reconciled, PipelineOptions, PipelineOutput, TableMetadata,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, SummaryResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
