//! Repository layer.

mod admin_account;
mod ngo_profile;
mod report;
pub mod store;

pub use admin_account::AdminAccountRepository;
pub use ngo_profile::NgoProfileRepository;
pub use report::ReportRepository;
pub use store::{
    AdminStore, NgoCounts, NgoFilter, NgoStore, ProfileSetup, ReportCounts, ReportFilter,
    ReportStore, ReportTransition, SharedAdminStore, SharedNgoStore, SharedReportStore, ensure_approved,
};
