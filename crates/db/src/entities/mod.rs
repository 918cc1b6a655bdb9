//! Database entities.

pub mod admin_account;
pub mod ngo_profile;
pub mod report;

pub use admin_account::Entity as AdminAccount;
pub use ngo_profile::Entity as NgoProfile;
pub use report::Entity as Report;
