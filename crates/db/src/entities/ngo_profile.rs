//! NGO profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// NGO approval status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum NgoStatus {
    #[sea_orm(string_value = "pending_approval")]
    #[default]
    PendingApproval,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "suspended")]
    Suspended,
}

impl NgoStatus {
    /// Display name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "Pending Approval",
            Self::Approved => "Approved",
            Self::Suspended => "Suspended",
        }
    }

    /// Parse a wire status. Accepts "Pending Approval", "pending_approval", "pending".
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pending" | "pendingapproval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

/// NGO profile model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    /// Contact email, also the login identity.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password: String,

    /// Access token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub status: NgoStatus,

    /// Animal capability ids, e.g. `["dogs", "cats"]`.
    #[sea_orm(column_type = "JsonBinary")]
    pub animals: Json,

    /// Whether the NGO can transport animals.
    #[sea_orm(default_value = false)]
    pub transport: bool,

    /// Operating location. `(0, 0)` means unset.
    pub latitude: f64,
    pub longitude: f64,
    #[sea_orm(column_type = "Text")]
    pub address: String,

    #[sea_orm(nullable)]
    pub contact_phone: Option<String>,

    #[sea_orm(nullable)]
    pub website: Option<String>,

    /// Rescues completed (denormalized, never decreases)
    #[sea_orm(default_value = 0)]
    pub total_rescues: i32,

    pub rating: f64,

    #[sea_orm(default_value = false)]
    pub profile_complete: bool,

    pub registered_at: DateTimeWithTimeZone,

    /// First time the NGO was approved.
    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Capability ids declared by the NGO.
    #[must_use]
    pub fn capabilities(&self) -> Vec<String> {
        self.animals
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the NGO declares the given capability id.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.animals
            .as_array()
            .is_some_and(|items| items.iter().any(|v| v.as_str() == Some(capability)))
    }

    /// Whether the NGO may act on reports.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        self.status == NgoStatus::Approved
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
