//! Admin oversight endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use pawlink_common::{AppError, AppResult};
use pawlink_core::PlatformStats;
use pawlink_db::{
    entities::{ngo_profile::NgoStatus, report::ReportStatus},
    repositories::{NgoFilter, ReportFilter},
};
use serde::{Deserialize, Serialize};

use super::ngo::NgoResponse;
use super::reports::{ReportResponse, StatusRequest};
use crate::{
    extractors::AuthActor,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Admin login request.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// Admin login response.
#[derive(Debug, Serialize)]
pub struct AdminSessionResponse {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// NGO listing query.
#[derive(Debug, Default, Deserialize)]
pub struct ListNgosQuery {
    pub status: Option<String>,
    pub capability: Option<String>,
    pub search: Option<String>,
}

/// Report listing query.
#[derive(Debug, Default, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: u64,
}

const MAX_LIMIT: u64 = 500;

fn parse_ngo_status(value: &str) -> AppResult<NgoStatus> {
    NgoStatus::parse(value)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown NGO status: {value}")))
}

fn parse_report_status(value: &str) -> AppResult<ReportStatus> {
    ReportStatus::parse(value)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown report status: {value}")))
}

/// Log in as an administrator.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> AppResult<ApiResponse<AdminSessionResponse>> {
    let session = state
        .admin_service
        .authenticate(&req.username, &req.password)
        .await?;

    Ok(ApiResponse::ok(AdminSessionResponse {
        id: session.admin.id,
        username: session.admin.username,
        token: session.token,
    }))
}

/// List NGOs, optionally by status, capability or name/email search.
async fn list_ngos(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Query(query): Query<ListNgosQuery>,
) -> AppResult<ApiResponse<Vec<NgoResponse>>> {
    let filter = NgoFilter {
        status: query.status.as_deref().map(parse_ngo_status).transpose()?,
        capability: query.capability.map(|c| c.trim().to_lowercase()),
        search: query.search,
    };

    let ngos = state.admin_service.list_ngos(&actor, &filter).await?;
    Ok(ApiResponse::ok(ngos.into_iter().map(Into::into).collect()))
}

/// Approve, suspend or reinstate an NGO.
async fn update_ngo_status(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<ApiResponse<NgoResponse>> {
    let status = parse_ngo_status(&req.status)?;
    let ngo = state
        .admin_service
        .set_ngo_status(&actor, &id, status)
        .await?;
    Ok(ApiResponse::ok(ngo.into()))
}

/// List reports of any status, newest first.
async fn list_reports(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let filter = ReportFilter {
        status: query.status.as_deref().map(parse_report_status).transpose()?,
        search: query.search,
        limit: query.limit.map(|l| l.min(MAX_LIMIT)),
        offset: query.offset,
    };

    let reports = state.admin_service.list_reports(&actor, &filter).await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Force an active report closed or flagged.
async fn override_report_status(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let status = req.report_status()?;
    let report = state.dispatch.admin_override(&actor, &id, status).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Delete a report permanently.
async fn delete_report(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.admin_service.delete_report(&actor, &id).await?;
    Ok(no_content())
}

/// Platform counts.
async fn stats(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PlatformStats>> {
    let stats = state.admin_service.compute_stats(&actor).await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/ngos", get(list_ngos))
        .route("/ngos/{id}/status", put(update_ngo_status))
        .route("/reports", get(list_reports))
        .route("/reports/{id}", delete(delete_report))
        .route("/reports/{id}/status", put(override_report_status))
        .route("/stats", get(stats))
}
