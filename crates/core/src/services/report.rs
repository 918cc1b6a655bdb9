//! Report intake and lookup.

use chrono::Utc;
use pawlink_common::{AppError, AppResult, IdGenerator};
use pawlink_db::{
    entities::report::{self, ReportStatus},
    repositories::{ReportFilter, SharedReportStore},
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::geo::GeoPoint;

/// Report service for intake and read access.
///
/// State transitions are not exposed here; they go through
/// [`super::dispatch::DispatchCoordinator`].
#[derive(Clone)]
pub struct ReportService {
    store: SharedReportStore,
    id_gen: IdGenerator,
}

/// Input for submitting a new report.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportInput {
    #[validate(length(min = 1, max = 64))]
    pub animal_type: String,

    #[validate(range(min = 1, max = 5))]
    pub severity: i16,

    #[validate(length(max = 2048))]
    pub description: Option<String>,

    /// Opaque reference to an already uploaded image.
    #[validate(length(min = 1, max = 2048))]
    pub image_url: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default)]
    #[validate(length(max = 512))]
    pub address: String,

    #[validate(length(max = 32))]
    pub reporter_phone: Option<String>,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(store: SharedReportStore) -> Self {
        Self {
            store,
            id_gen: IdGenerator::new(),
        }
    }

    /// Submit a report. It starts out `Active`.
    pub async fn create(&self, input: CreateReportInput) -> AppResult<report::Model> {
        input.validate()?;

        let animal_type = input.animal_type.trim();
        if animal_type.is_empty() {
            return Err(AppError::Validation("Animal type is required".to_string()));
        }
        let image_url = input.image_url.trim();
        if image_url.is_empty() {
            return Err(AppError::Validation("An image is required".to_string()));
        }

        let location = GeoPoint::new(input.latitude, input.longitude);
        let address = input.address.trim();
        if !location.in_range() {
            return Err(AppError::Validation("Coordinates are out of range".to_string()));
        }
        if location.is_unset() && address.is_empty() {
            return Err(AppError::Validation("Location is required".to_string()));
        }

        let model = report::Model {
            id: self.id_gen.generate(),
            animal_type: animal_type.to_string(),
            severity: input.severity,
            description: non_blank(input.description),
            image_url: image_url.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            address: address.to_string(),
            reporter_phone: non_blank(input.reporter_phone),
            status: ReportStatus::Active,
            closed_by: None,
            closed_at: None,
            flagged_by: None,
            flagged_at: None,
            reported_at: Utc::now().into(),
        };

        let report = self.store.create(model).await?;
        info!(
            report_id = %report.id,
            animal_type = %report.animal_type,
            severity = report.severity,
            "Report submitted"
        );
        Ok(report)
    }

    /// Get a report by ID.
    pub async fn get(&self, id: &str) -> AppResult<report::Model> {
        self.store.get_by_id(id).await
    }

    /// List reports matching a filter, newest first.
    pub async fn list(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>> {
        self.store.list(filter).await
    }

    /// List reports still awaiting an NGO.
    pub async fn list_active(&self) -> AppResult<Vec<report::Model>> {
        self.store.list(&ReportFilter::active()).await
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
