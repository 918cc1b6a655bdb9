//! NGO account endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use pawlink_common::AppResult;
use pawlink_core::{NearbyReport, ProfileSetupInput, RegisterNgoInput};
use pawlink_db::entities::ngo_profile;
use serde::{Deserialize, Serialize};

use super::reports::ReportResponse;
use crate::{extractors::AuthActor, middleware::AppState, response::ApiResponse};

/// NGO profile response. Credentials are never included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NgoResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub description: Option<String>,
    pub status: &'static str,
    pub animals: Vec<String>,
    pub transport: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub total_rescues: i32,
    pub rating: f64,
    pub profile_complete: bool,
    pub registered_at: String,
    pub approved_at: Option<String>,
}

impl From<ngo_profile::Model> for NgoResponse {
    fn from(ngo: ngo_profile::Model) -> Self {
        Self {
            animals: ngo.capabilities(),
            status: ngo.status.as_str(),
            id: ngo.id,
            name: ngo.name,
            email: ngo.email,
            description: ngo.description,
            transport: ngo.transport,
            latitude: ngo.latitude,
            longitude: ngo.longitude,
            address: ngo.address,
            contact_phone: ngo.contact_phone,
            website: ngo.website,
            total_rescues: ngo.total_rescues,
            rating: ngo.rating,
            profile_complete: ngo.profile_complete,
            registered_at: ngo.registered_at.to_rfc3339(),
            approved_at: ngo.approved_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Profile plus the bearer token for subsequent calls.
#[derive(Debug, Serialize)]
pub struct NgoSessionResponse {
    pub ngo: NgoResponse,
    pub token: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Report near an NGO.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyReportResponse {
    #[serde(flatten)]
    pub report: ReportResponse,
    pub distance_km: f64,
}

impl From<NearbyReport> for NearbyReportResponse {
    fn from(nearby: NearbyReport) -> Self {
        Self {
            report: nearby.report.into(),
            distance_km: nearby.distance_km,
        }
    }
}

/// Register an NGO account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterNgoInput>,
) -> AppResult<ApiResponse<NgoSessionResponse>> {
    let mut ngo = state.ngo_registry.register(input).await?;
    let token = ngo.token.take().unwrap_or_default();

    Ok(ApiResponse::created(NgoSessionResponse {
        ngo: ngo.into(),
        token,
    }))
}

/// Log in as an NGO.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<NgoSessionResponse>> {
    let session = state
        .ngo_registry
        .authenticate(&req.email, &req.password)
        .await?;

    Ok(ApiResponse::ok(NgoSessionResponse {
        ngo: session.profile.into(),
        token: session.token,
    }))
}

/// Get an NGO profile.
async fn show(
    AuthActor(_actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<NgoResponse>> {
    let ngo = state.ngo_registry.get(&id).await?;
    Ok(ApiResponse::ok(ngo.into()))
}

/// Complete or update the NGO's profile.
async fn update_profile(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProfileSetupInput>,
) -> AppResult<ApiResponse<NgoResponse>> {
    let ngo = state
        .ngo_registry
        .complete_setup(&actor, &id, input)
        .await?;
    Ok(ApiResponse::ok(ngo.into()))
}

/// Active reports in the NGO's area, nearest first.
async fn nearby_reports(
    AuthActor(actor): AuthActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<NearbyReportResponse>>> {
    let reports = state.dispatch.reports_for_ngo(&actor, &id).await?;
    Ok(ApiResponse::ok(reports.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/{id}", get(show))
        .route("/{id}/profile", put(update_profile))
        .route("/{id}/reports", get(nearby_reports))
}
