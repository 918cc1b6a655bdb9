//! Report endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use pawlink_common::{AppError, AppResult};
use pawlink_core::{AnimalKind, CreateReportInput};
use pawlink_db::entities::report::{self, ReportStatus};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthActor, middleware::AppState, response::ApiResponse};

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    pub animal_type: String,
    /// Capability bucket the animal type falls into.
    pub animal_kind: AnimalKind,
    pub severity: i16,
    pub severity_label: &'static str,
    pub description: Option<String>,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub reporter_phone: Option<String>,
    pub status: &'static str,
    pub closed_by: Option<String>,
    pub closed_at: Option<String>,
    pub flagged_by: Option<String>,
    pub flagged_at: Option<String>,
    pub reported_at: String,
}

impl From<report::Model> for ReportResponse {
    fn from(report: report::Model) -> Self {
        Self {
            animal_kind: AnimalKind::classify(&report.animal_type),
            severity_label: report.severity_label(),
            status: report.status.as_str(),
            id: report.id,
            animal_type: report.animal_type,
            severity: report.severity,
            description: report.description,
            image_url: report.image_url,
            latitude: report.latitude,
            longitude: report.longitude,
            address: report.address,
            reporter_phone: report.reporter_phone,
            closed_by: report.closed_by,
            closed_at: report.closed_at.map(|t| t.to_rfc3339()),
            flagged_by: report.flagged_by,
            flagged_at: report.flagged_at.map(|t| t.to_rfc3339()),
            reported_at: report.reported_at.to_rfc3339(),
        }
    }
}

/// Status change request, shared by NGO and admin endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

impl StatusRequest {
    /// Parse the requested report status.
    pub fn report_status(&self) -> AppResult<ReportStatus> {
        ReportStatus::parse(&self.status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown report status: {}", self.status)))
    }
}

/// Submit a new report.
async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateReportInput>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.create(input).await?;
    Ok(ApiResponse::created(report.into()))
}

/// List reports awaiting an NGO.
async fn list_active(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<ReportResponse>>> {
    let reports = state.report_service.list_active().await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

/// Get a report.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let report = state.report_service.get(&id).await?;
    Ok(ApiResponse::ok(report.into()))
}

/// Accept (`Closed`) or flag (`Flagged`) a report as an NGO.
async fn update_status(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> AppResult<ApiResponse<ReportResponse>> {
    let status = req.report_status()?;
    let report = state.dispatch.act(&actor, &id, status).await?;
    Ok(ApiResponse::ok(report.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/active", get(list_active))
        .route("/{id}", get(show))
        .route("/{id}/status", put(update_status))
}
