//! HTTP server exposing the reconciled dataset's views.
//!
//! The server is bootstrapped from one completed pipeline run and shares the
//! immutable dataset across all request handlers; no endpoint mutates state.
//!
//! # API Endpoints
//!
//! | Method | Path                         | Description                        |
//! |--------|------------------------------|------------------------------------|
//! | GET    | `/health`                    | Health check                       |
//! | GET    | `/api/summary`               | Run summary and data-quality stats |
//! | GET    | `/api/views/yearly`          | Yearly trend per flow              |
//! | GET    | `/api/views/commodities`     | Top commodities for one flow       |
//! | GET    | `/api/views/sectors`         | Sector structure with shares       |
//! | GET    | `/api/views/partners`        | Top partners pivot over a range    |
//! | GET    | `/api/views/partners/{name}` | Single-partner time series         |
//! | GET    | `/api/views/structure`       | Structural change between years    |
//! | GET    | `/api/logs`                  | SSE stream for pipeline logs       |

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, SummaryResponse};
use crate::models::Flow;
use crate::pipeline::PipelineOutput;

/// Default truncation for top-N views.
const DEFAULT_TOP: usize = 10;

type AppState = Arc<PipelineOutput>;
type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server over a completed pipeline run.
pub async fn start_server(
    port: u16,
    output: PipelineOutput,
) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state: AppState = Arc::new(output);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/summary", get(summary))
        .route("/api/views/yearly", get(yearly))
        .route("/api/views/commodities", get(commodities))
        .route("/api/views/sectors", get(sectors))
        .route("/api/views/partners", get(partners))
        .route("/api/views/partners/{name}", get(partner_series))
        .route("/api/views/structure", get(structure))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("Tradeflow server running on http://localhost:{}", port);
    println!("   GET /api/summary          - Run summary");
    println!("   GET /api/views/...        - Dataset views");
    println!("   GET /api/logs             - SSE log stream");
    println!("   GET /health               - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
struct CommodityQuery {
    flow: String,
    top: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct TopQuery {
    top: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    from: i32,
    to: i32,
    top: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct StructureQuery {
    base: i32,
    compare: i32,
    top: Option<usize>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tradeflow",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run summary: counters and per-table parse metadata.
async fn summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    Json(SummaryResponse::from(state.as_ref()))
}

/// Yearly totals per flow across the whole dataset.
async fn yearly(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "rows": state.dataset.yearly_trend() }))
}

/// Top commodities for one flow. `flow` accepts the same aliases as the
/// raw trade data (X/E for exports, M/I for imports).
async fn commodities(
    State(state): State<AppState>,
    Query(query): Query<CommodityQuery>,
) -> Result<Json<Value>, ApiError> {
    let flow = parse_flow(&query.flow)?;
    let rows = state
        .dataset
        .top_commodities(flow, query.top.unwrap_or(DEFAULT_TOP));
    Ok(Json(json!({ "flow": flow, "rows": rows })))
}

/// Sector structure with percentage shares of the grand total.
async fn sectors(State(state): State<AppState>, Query(query): Query<TopQuery>) -> Json<Value> {
    let rows = state.dataset.sector_structure(query.top.unwrap_or(DEFAULT_TOP));
    Json(json!({ "rows": rows }))
}

/// Top partners pivot over an inclusive year range.
async fn partners(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.from > query.to {
        return Err(bad_request(&format!(
            "Invalid year range: {} > {}",
            query.from, query.to
        )));
    }
    let rows = state
        .dataset
        .top_partners(query.from, query.to, query.top.unwrap_or(DEFAULT_TOP));
    Ok(Json(json!({ "from": query.from, "to": query.to, "rows": rows })))
}

/// Time series for one partner, matched by exact reconciled name.
async fn partner_series(
    State(state): State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Json<Value> {
    let rows = state.dataset.partner_series(&name);
    Json(json!({ "partner": name, "rows": rows }))
}

/// Structural change between two years.
async fn structure(
    State(state): State<AppState>,
    Query(query): Query<StructureQuery>,
) -> Json<Value> {
    let rows = state.dataset.structural_change(
        query.base,
        query.compare,
        query.top.unwrap_or(DEFAULT_TOP),
    );
    Json(json!({ "base": query.base, "compare": query.compare, "rows": rows }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_flow(code: &str) -> Result<Flow, ApiError> {
    Flow::from_code(code).ok_or_else(|| bad_request(&format!("Unknown flow code '{}'", code)))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flow_aliases() {
        assert_eq!(parse_flow("X").unwrap(), Flow::Export);
        assert_eq!(parse_flow("E").unwrap(), Flow::Export);
        assert_eq!(parse_flow("I").unwrap(), Flow::Import);
        assert!(parse_flow("Z").is_err());
    }

    #[test]
    fn test_bad_request_status() {
        let (status, body) = bad_request("nope");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["error"], "nope");
    }
}
