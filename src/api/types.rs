//! REST API response types.
//!
//! Every view endpoint serializes its rows straight from the aggregation
//! layer; the types here only cover the run-level summary and the error
//! envelope.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::pipeline::{PipelineOutput, TableMetadata};
use crate::reconcile::ReconcileSummary;

/// Run-level summary returned by `GET /api/summary`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    /// Identifier of the pipeline run backing this server.
    pub run_id: Uuid,

    /// When the run started (UTC, RFC 3339).
    pub started_at: String,

    /// Number of reconciled records being served.
    pub record_count: usize,

    /// Reconciliation counters.
    pub summary: ReconcileSummary,

    /// Parse metadata for the three input tables.
    pub tables: Vec<TableMetadata>,
}

impl From<&PipelineOutput> for SummaryResponse {
    fn from(output: &PipelineOutput) -> Self {
        SummaryResponse {
            run_id: output.run_id,
            started_at: output.started_at.to_rfc3339(),
            record_count: output.dataset.len(),
            summary: output.summary.clone(),
            tables: output.tables.clone(),
        }
    }
}

/// Create an error response envelope.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Dataset;
    use chrono::Utc;

    #[test]
    fn test_summary_response_shape() {
        let output = PipelineOutput {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            dataset: Dataset::new(Vec::new()),
            summary: ReconcileSummary::default(),
            tables: Vec::new(),
        };

        let response = SummaryResponse::from(&output);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["recordCount"], 0);
        assert!(json["runId"].is_string());
        assert!(json["summary"]["inputRows"].is_number());
    }

    #[test]
    fn test_error_response_shape() {
        let err = error_response("unknown flow code");
        assert_eq!(err["status"], "error");
        assert_eq!(err["error"], "unknown flow code");
    }
}
