//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for reports, NGO profiles and admin accounts.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort by creation time, which keeps report listings cheap to order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque API token for an account.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component, unlike ids
        Uuid::new_v4().simple().to_string()
    }
}
