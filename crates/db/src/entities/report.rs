//! Animal report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report lifecycle status.
///
/// `Closed` and `Flagged` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReportStatus {
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "flagged")]
    Flagged,
}

impl ReportStatus {
    /// Whether no further transition is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Flagged)
    }

    /// Display name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Closed => "Closed",
            Self::Flagged => "Flagged",
        }
    }

    /// Parse a wire status, accepting any casing.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            "flagged" => Some(Self::Flagged),
            _ => None,
        }
    }
}

/// Animal report model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Animal type as entered by the reporter.
    pub animal_type: String,
    /// Injury severity, 1 (minor) to 5 (critical).
    pub severity: i16,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Opaque reference to the uploaded photo.
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    #[sea_orm(nullable)]
    pub reporter_phone: Option<String>,
    pub status: ReportStatus,
    /// Actor that closed the report.
    #[sea_orm(nullable)]
    pub closed_by: Option<String>,
    #[sea_orm(nullable)]
    pub closed_at: Option<DateTimeWithTimeZone>,
    /// Actor that flagged the report.
    #[sea_orm(nullable)]
    pub flagged_by: Option<String>,
    #[sea_orm(nullable)]
    pub flagged_at: Option<DateTimeWithTimeZone>,
    pub reported_at: DateTimeWithTimeZone,
}

impl Model {
    /// Human-readable label for the severity level.
    #[must_use]
    pub const fn severity_label(&self) -> &'static str {
        match self.severity {
            1 => "Minor issue",
            2 => "Moderate concern",
            3 => "Needs attention",
            4 => "Serious condition",
            5 => "Critical emergency",
            _ => "Unknown",
        }
    }

    /// Checks that the transition stamps agree with the status.
    ///
    /// Active reports carry no stamps; a terminal report carries exactly the
    /// pair belonging to its status.
    #[must_use]
    pub const fn stamps_consistent(&self) -> bool {
        let closed = self.closed_by.is_some() && self.closed_at.is_some();
        let closed_none = self.closed_by.is_none() && self.closed_at.is_none();
        let flagged = self.flagged_by.is_some() && self.flagged_at.is_some();
        let flagged_none = self.flagged_by.is_none() && self.flagged_at.is_none();

        match self.status {
            ReportStatus::Active => closed_none && flagged_none,
            ReportStatus::Closed => closed && flagged_none,
            ReportStatus::Flagged => flagged && closed_none,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
