use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use simulator::{CrashSeverity, DiskLedger, PerformanceRecord, DEFAULT_CAPACITY};

use crate::ApiResult;

pub struct AppState {
    pub ledger: Arc<DiskLedger>,
}

#[derive(Deserialize)]
pub struct CreateFileRequest {
    name: String,
    size: i64,
    parent_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CrashRequest {
    severity: String,
    // Part of the published request shape; the damage size is drawn from
    // the severity range instead, so this value is never consulted.
    #[allow(dead_code)]
    affected_blocks: i64,
}

#[derive(Deserialize)]
pub struct InitializeQuery {
    #[serde(default = "default_capacity")]
    size: i64,
}

fn default_capacity() -> i64 {
    DEFAULT_CAPACITY
}

pub async fn api_banner() -> ApiResult<Response> {
    Ok(Json(json!({
        "message": "File System Simulator API",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "disk": "/api/disk/*",
            "files": "/api/files/*",
            "performance": "/api/performance/*",
            "simulation": "/api/simulation/*"
        }
    }))
    .into_response())
}

pub async fn disk_stats(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(state.ledger.stats().await).into_response())
}

pub async fn initialize_disk(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InitializeQuery>,
) -> ApiResult<Response> {
    state.ledger.initialize(query.size).await;

    Ok(Json(json!({
        "message": "Disk initialized",
        "size": query.size,
    }))
    .into_response())
}

pub async fn reset_disk(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    state.ledger.reset().await;

    Ok(Json(json!({ "message": "Disk reset successfully" })).into_response())
}

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateFileRequest>,
) -> ApiResult<Response> {
    let record = state
        .ledger
        .create_file(&request.name, request.size, request.parent_id)
        .await?;

    Ok(Json(record).into_response())
}

pub async fn list_files(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(state.ledger.list_files().await).into_response())
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> ApiResult<Response> {
    state.ledger.delete_file(&file_id).await?;

    Ok(Json(json!({
        "message": "File deleted",
        "file_id": file_id,
    }))
    .into_response())
}

pub async fn performance_metrics(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(state.ledger.sample_metrics().await).into_response())
}

pub async fn performance_history(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    Ok(Json(state.ledger.history().await).into_response())
}

pub async fn record_performance(
    State(state): State<Arc<AppState>>,
    Json(record): Json<PerformanceRecord>,
) -> ApiResult<Response> {
    state.ledger.record_metrics(record).await;

    Ok(Json(json!({ "message": "Metrics recorded" })).into_response())
}

pub async fn simulate_crash(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CrashRequest>,
) -> ApiResult<Response> {
    let severity: CrashSeverity = request.severity.parse()?;
    let report = state.ledger.simulate_crash(severity).await;

    Ok(Json(json!({
        "severity": report.severity,
        "affected_blocks": report.affected_blocks,
        "total_bad_blocks": report.total_bad_blocks,
        "message": format!(
            "Simulated {} crash affecting {} blocks",
            report.severity, report.affected_blocks
        ),
    }))
    .into_response())
}

pub async fn run_recovery(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let report = state.ledger.run_recovery().await;

    Ok(Json(json!({
        "recovered_blocks": report.recovered_blocks,
        "lost_blocks": report.lost_blocks,
        "message": "Recovery completed successfully",
    }))
    .into_response())
}

pub async fn defragment_disk(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let report = state.ledger.defragment().await;

    Ok(Json(json!({
        "before_fragmentation": report.before_fragmentation,
        "after_fragmentation": report.after_fragmentation,
        "improvement": report.improvement,
        "message": "Defragmentation completed",
    }))
    .into_response())
}

pub async fn list_demos() -> ApiResult<Response> {
    Ok(Json(json!({ "demos": simulator::demo_catalog() })).into_response())
}

pub async fn run_demo(Path(demo_id): Path<String>) -> ApiResult<Response> {
    simulator::validate_demo(&demo_id)?;

    Ok(Json(json!({
        "demo_id": demo_id,
        "status": "started",
        "message": format!("Demo '{}' is now running", demo_id),
    }))
    .into_response())
}

pub async fn health_check() -> ApiResult<Response> {
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response())
}
