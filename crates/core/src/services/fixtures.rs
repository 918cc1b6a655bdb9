//! Shared builders for service tests.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use pawlink_db::{
    MemoryStore,
    entities::{
        ngo_profile::{self, NgoStatus},
        report::{self, ReportStatus},
    },
    repositories::{NgoStore, ReportStore},
};
use serde_json::json;

use super::geo::GeoPoint;

/// Central Bangalore.
pub const ORIGIN: GeoPoint = GeoPoint::new(12.9716, 77.5946);

/// A point roughly `km` kilometres north of [`ORIGIN`].
pub fn north_of_origin(km: f64) -> GeoPoint {
    GeoPoint::new(ORIGIN.latitude + km / 111.2, ORIGIN.longitude)
}

pub fn report_at(id: &str, animal: &str, at: GeoPoint) -> report::Model {
    report::Model {
        id: id.to_string(),
        animal_type: animal.to_string(),
        severity: 3,
        description: None,
        image_url: format!("https://img.example/{id}.jpg"),
        latitude: at.latitude,
        longitude: at.longitude,
        address: "MG Road".to_string(),
        reporter_phone: None,
        status: ReportStatus::Active,
        closed_by: None,
        closed_at: None,
        flagged_by: None,
        flagged_at: None,
        reported_at: Utc::now().into(),
    }
}

pub fn ngo_at(id: &str, status: NgoStatus, animals: &[&str], at: GeoPoint) -> ngo_profile::Model {
    ngo_profile::Model {
        id: id.to_string(),
        name: format!("Rescue {id}"),
        email: format!("{id}@rescue.example"),
        password: "hash".to_string(),
        token: Some(format!("token-{id}")),
        description: None,
        status,
        animals: json!(animals),
        transport: false,
        latitude: at.latitude,
        longitude: at.longitude,
        address: "Indiranagar".to_string(),
        contact_phone: None,
        website: None,
        total_rescues: 0,
        rating: 0.0,
        profile_complete: true,
        registered_at: Utc::now().into(),
        approved_at: None,
    }
}

pub async fn seed_report(store: &MemoryStore, model: report::Model) -> report::Model {
    ReportStore::create(store, model).await.unwrap()
}

pub async fn seed_ngo(store: &MemoryStore, model: ngo_profile::Model) -> ngo_profile::Model {
    NgoStore::create(store, model).await.unwrap()
}
