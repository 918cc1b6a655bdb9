//! Caller identity passed into every authorized operation.

use pawlink_common::{AppError, AppResult};

/// Who is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// An NGO account, identified by its profile id.
    Ngo { id: String },
    /// An administrator account.
    Admin { id: String },
}

impl Actor {
    /// The account id, regardless of role.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Ngo { id } | Self::Admin { id } => id,
        }
    }

    /// The NGO id, or `Forbidden` for any other role.
    pub fn ngo_id(&self) -> AppResult<&str> {
        match self {
            Self::Ngo { id } => Ok(id),
            Self::Admin { .. } => Err(AppError::Forbidden(
                "This action is only available to NGOs".to_string(),
            )),
        }
    }

    /// The admin id, or `Forbidden` for any other role.
    pub fn admin_id(&self) -> AppResult<&str> {
        match self {
            Self::Admin { id } => Ok(id),
            Self::Ngo { .. } => Err(AppError::Forbidden(
                "Administrator access required".to_string(),
            )),
        }
    }

    /// Whether this is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accessors() {
        let ngo = Actor::Ngo { id: "n1".into() };
        let admin = Actor::Admin { id: "a1".into() };

        assert_eq!(ngo.id(), "n1");
        assert!(matches!(ngo.ngo_id(), Ok("n1")));
        assert!(matches!(ngo.admin_id(), Err(AppError::Forbidden(_))));
        assert!(admin.is_admin());
        assert!(matches!(admin.ngo_id(), Err(AppError::Forbidden(_))));
    }
}
