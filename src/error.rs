//! Error types for the Tradeflow reconciliation pipeline.
//!
//! This module defines a hierarchy of error types, one enum per concern:
//!
//! - [`TableError`] - input table reading/parsing errors
//! - [`ReconcileError`] - reconciliation-stage errors
//! - [`ValidationError`] - output schema validation errors
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Note the taxonomy split from the pipeline contract: a missing reference
//! entry is *not* an error (the fallback policy synthesizes a placeholder);
//! only malformed flow codes, unparseable rows and empty input tables are.

use thiserror::Error;

// =============================================================================
// Input Table Errors
// =============================================================================

/// Errors while reading or parsing one of the three input tables.
#[derive(Debug, Error)]
pub enum TableError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode bytes with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV structure (bad headers, unreadable rows).
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// A required table has no usable rows. Hard error: a dataset
    /// silently missing a whole dimension must never be produced.
    #[error("Input table '{0}' is empty")]
    EmptyTable(String),

    /// Header row is missing a required column.
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },
}

// =============================================================================
// Reconciliation Errors
// =============================================================================

/// Errors during the reconciliation stage.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Share of rejected records exceeded the configured tolerance.
    #[error("{rejected} of {total} trade records rejected (tolerance {tolerance})")]
    ExcessiveRejections {
        rejected: usize,
        total: usize,
        tolerance: f64,
    },

    /// No trade records survived reconciliation.
    #[error("All {0} trade records were rejected")]
    AllRejected(usize),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during reconciled-output schema validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed for one or more records.
    #[error("{count} reconciled records failed schema validation")]
    SchemaError { count: usize, samples: Vec<String> },

    /// The embedded schema itself could not be compiled.
    #[error("Invalid embedded schema: {0}")]
    InvalidSchema(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::run_pipeline`].
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input table error.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Reconciliation error.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Failed to write the reconciled output.
    #[error("Output error: {0}")]
    OutputError(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error during startup dataset construction.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
