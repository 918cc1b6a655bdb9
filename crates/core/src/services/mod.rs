//! Business logic services.

#![allow(missing_docs)]

pub mod admin;
pub mod animal;
pub mod dispatch;
pub mod geo;
pub mod ngo_registry;
mod password;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use admin::{AdminService, AdminSession, CreateAdminInput, PlatformStats};
pub use animal::AnimalKind;
pub use dispatch::{DispatchCoordinator, NearbyReport};
pub use geo::{GeoMatcher, GeoPoint, distance_km, within_radius};
pub use ngo_registry::{
    NgoRegistry, NgoSession, NoOpRatingPolicy, ProfileSetupInput, RatingPolicy, RegisterNgoInput,
};
pub use report::{CreateReportInput, ReportService};
