//! HTTP request handlers

use super::error::ApiError;
use super::state::AppState;
use crate::results::QueryRecord;
use crate::store::ExportFormat;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// Body of a query submission
#[derive(Debug, Deserialize)]
pub struct SubmitQuery {
    /// Query text
    #[serde(default, alias = "text")]
    pub query: String,
    /// Providers to ask; all configured providers when omitted
    #[serde(default)]
    pub providers: Option<Vec<String>>,
}

/// Response to a query submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub query_id: String,
    pub message: String,
    /// Server-sent events endpoint for this query
    pub events: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now(),
    }))
}

/// Configured providers
pub async fn providers(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "instance_name": state.instance_name(),
        "providers": state.orchestrator.providers(),
        "analysis_enabled": state.orchestrator.analysis_enabled(),
    }))
}

/// Submit a query
pub async fn submit_query(
    State(state): State<AppState>,
    body: Result<Json<SubmitQuery>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let query_id = match body.providers {
        Some(ref providers) => state.orchestrator.submit(&body.query, providers)?,
        None => state.orchestrator.submit_all(&body.query)?,
    };

    Ok(Json(SubmitResponse {
        events: format!("/api/events/{}", query_id),
        message: "Query submitted successfully".to_string(),
        query_id,
    }))
}

/// Current snapshot of a query
pub async fn results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueryRecord>, ApiError> {
    Ok(Json(state.orchestrator.get(&id)?))
}

/// Analysis attached to a query
pub async fn analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.orchestrator.get(&id)?;
    Ok(Json(serde_json::json!({
        "query_id": record.id,
        "query": record.query,
        "analysis": record.analysis.unwrap_or_default(),
    })))
}

/// Stored queries, most recent first
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<Vec<QueryRecord>> {
    let limit = params.limit.or_else(|| state.history_limit());
    Json(state.orchestrator.history(limit))
}

/// Download a query as JSON or CSV
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = params.format.as_deref().unwrap_or("json").parse()?;
    let body = state.orchestrator.export(&id, format)?;
    let disposition = format!(
        "attachment; filename=\"query_{}.{}\"",
        id,
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Live events of a query as server-sent events
pub async fn events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = state.orchestrator.subscribe(&id)?;
    let stream = subscription
        .into_stream()
        .map(|event| Event::default().event(event.name()).json_data(&event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Runtime statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let metrics = orchestrator.metrics();
    Json(serde_json::json!({
        "total_queries": metrics.total_queries(),
        "total_analyses": metrics.total_analyses(),
        "stored_queries": orchestrator.store().len(),
        "open_channels": orchestrator.bus().channel_count(),
        "providers": metrics.provider_stats(),
    }))
}
