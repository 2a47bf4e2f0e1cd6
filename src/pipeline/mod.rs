//! High-level pipeline orchestration: load the three input tables, reconcile,
//! validate, and hand back an immutable dataset handle plus a run report.
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌─────────┐
//! │ trade.csv │──▶│  Parser  │──▶│ Resolver  │──▶│ Reconcile │──▶│ Dataset │
//! │ countries │   │ (auto-   │   │ (two-tier │   │ (left     │   │ + views │
//! │ commodity │   │  detect) │   │  lookup)  │   │  join)    │   │         │
//! └───────────┘   └──────────┘   └───────────┘   └───────────┘   └─────────┘
//! ```
//!
//! The dataset is built wholesale per run and never patched incrementally;
//! every consumer receives the same immutable handle. Hard failures (an empty
//! input table, rejections beyond tolerance) abort the run before any view
//! can be served.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//! use tradeflow::pipeline::{run_pipeline, PipelineOptions};
//!
//! let output = run_pipeline(
//!     Path::new("trade.csv"),
//!     Path::new("countries.csv"),
//!     Path::new("commodities.csv"),
//!     PipelineOptions::default(),
//! )?;
//! println!("{} reconciled records", output.dataset.len());
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

use crate::aggregate::Dataset;
use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult, ReconcileError};
use crate::models::{CommodityRef, CountryRef, TradeRecord};
use crate::parser::{self, LoadedTable};
use crate::reconcile::{self, ReconcileSummary};
use crate::reference::{AliasTable, Resolver};
use crate::validation;

// =============================================================================
// Options
// =============================================================================

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum tolerated share of trade rows rejected for malformed flow
    /// codes before the whole run fails.
    pub reject_tolerance: f64,

    /// Skip output schema validation.
    pub skip_validation: bool,

    /// Partner-code overrides applied before any reference lookup.
    pub aliases: AliasTable,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            reject_tolerance: 0.1,
            skip_validation: false,
            aliases: AliasTable::default(),
        }
    }
}

// =============================================================================
// Run Report
// =============================================================================

/// Detection metadata for one loaded input table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub name: String,
    pub encoding: String,
    pub delimiter: char,
    pub row_count: usize,
    pub skipped_rows: usize,
}

impl TableMetadata {
    fn from_table<T>(table: &LoadedTable<T>) -> Self {
        Self {
            name: table.name.clone(),
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
            row_count: table.rows.len(),
            skipped_rows: table.skipped.len(),
        }
    }
}

/// Result of a complete pipeline run: the immutable dataset plus everything
/// a consumer needs to judge data quality.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// The canonical reconciled dataset.
    pub dataset: Dataset,
    /// Reconciliation counters (unresolved codes, rejected rows).
    pub summary: ReconcileSummary,
    /// Per-table parse metadata.
    pub tables: Vec<TableMetadata>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Run the full pipeline from the three input files.
pub fn run_pipeline(
    trade_path: &Path,
    countries_path: &Path,
    commodities_path: &Path,
    options: PipelineOptions,
) -> PipelineResult<PipelineOutput> {
    log_info(format!("Loading trade table: {}", trade_path.display()));
    let trade = parser::load_trade_table(trade_path)?;
    log_table(&trade);

    log_info(format!("Loading country table: {}", countries_path.display()));
    let countries = parser::load_country_table(countries_path)?;
    log_table(&countries);

    log_info(format!(
        "Loading commodity table: {}",
        commodities_path.display()
    ));
    let commodities = parser::load_commodity_table(commodities_path)?;
    log_table(&commodities);

    let tables = vec![
        TableMetadata::from_table(&trade),
        TableMetadata::from_table(&countries),
        TableMetadata::from_table(&commodities),
    ];

    let mut output = build_dataset(&trade.rows, &countries.rows, &commodities.rows, &options)?;
    output.tables = tables;
    Ok(output)
}

/// Build the dataset from already-parsed tables.
///
/// This is the in-memory core of [`run_pipeline`]; the bootstrap layer or a
/// test can call it directly with materialized rows.
pub fn build_dataset(
    trades: &[TradeRecord],
    countries: &[CountryRef],
    commodities: &[CommodityRef],
    options: &PipelineOptions,
) -> PipelineResult<PipelineOutput> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    let resolver = Resolver::new(countries, commodities, options.aliases.clone());
    log_info(format!(
        "Resolver ready: {} countries, {} commodities, {} aliases",
        resolver.country_count(),
        resolver.commodity_count(),
        options.aliases.len()
    ));

    log_info("Reconciling trade records...");
    let reconciled = reconcile::reconcile(trades, &resolver);
    let summary = reconciled.summary.clone();
    log_success(format!(
        "{} of {} records reconciled",
        summary.reconciled_rows, summary.input_rows
    ));

    if summary.unresolved_partners > 0 || summary.unresolved_commodities > 0 {
        log_warning(format!(
            "Unresolved references: {} partners, {} commodities (placeholders synthesized)",
            summary.unresolved_partners, summary.unresolved_commodities
        ));
    }

    check_rejections(&summary, options.reject_tolerance)?;

    if !options.skip_validation {
        log_info("Validating reconciled records against schema...");
        let values = reconciled
            .records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        validation::validate_reconciled_batch(&values)?;
        log_success("All reconciled records valid");
    }

    Ok(PipelineOutput {
        run_id,
        started_at,
        dataset: Dataset::new(reconciled.records),
        summary,
        tables: Vec::new(),
    })
}

/// Write the reconciled dataset as CSV; the presentation layer reads this as
/// its sole data source.
pub fn write_reconciled(dataset: &Dataset, path: &Path) -> PipelineResult<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| PipelineError::OutputError(e.to_string()))?;

    for record in dataset.records() {
        writer
            .serialize(record)
            .map_err(|e| PipelineError::OutputError(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| PipelineError::OutputError(e.to_string()))?;
    Ok(())
}

fn check_rejections(summary: &ReconcileSummary, tolerance: f64) -> PipelineResult<()> {
    if summary.input_rows > 0 && summary.reconciled_rows == 0 {
        return Err(ReconcileError::AllRejected(summary.input_rows).into());
    }

    let share = if summary.input_rows == 0 {
        0.0
    } else {
        summary.rejected_rows as f64 / summary.input_rows as f64
    };
    if share > tolerance {
        log_warning(format!(
            "Rejected flow codes: {:?}",
            summary.rejected_flow_samples
        ));
        return Err(ReconcileError::ExcessiveRejections {
            rejected: summary.rejected_rows,
            total: summary.input_rows,
            tolerance,
        }
        .into());
    }

    if summary.rejected_rows > 0 {
        log_warning(format!(
            "{} records rejected for malformed flow codes (samples: {:?})",
            summary.rejected_rows, summary.rejected_flow_samples
        ));
    }
    Ok(())
}

fn log_table<T>(table: &LoadedTable<T>) {
    log_success(format!(
        "{}: {} rows (encoding {}, delimiter '{}'{})",
        table.name,
        table.rows.len(),
        table.encoding,
        if table.delimiter == '\t' { "\\t".to_string() } else { table.delimiter.to_string() },
        if table.skipped.is_empty() {
            String::new()
        } else {
            format!(", {} rows skipped", table.skipped.len())
        }
    ));
}
