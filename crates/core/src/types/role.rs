//! User roles issued by the remote API.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not one the client recognizes.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized role: {0}")]
pub struct RoleParseError(pub String);

/// Role attached to an authenticated user.
///
/// `Admin` manages agents and users. `Employee` (shown to admins as
/// "HR Staff") and `Customer` can only chat with agents assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to agent and user management.
    Admin,
    /// Staff account created by an admin.
    Employee,
    /// Self-registered account.
    Customer,
}

impl Role {
    /// Every role the client knows about, in privilege order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Employee, Self::Customer];

    /// The wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
            Self::Customer => "customer",
        }
    }

    /// Roles an admin may assign when creating a user.
    ///
    /// Admin accounts cannot be created through the API.
    #[must_use]
    pub const fn is_assignable(self) -> bool {
        matches!(self, Self::Employee | Self::Customer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            "customer" => Ok(Self::Customer),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unrecognized role: superuser");
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_only_non_admin_roles_are_assignable() {
        assert!(!Role::Admin.is_assignable());
        assert!(Role::Employee.is_assignable());
        assert!(Role::Customer.is_assignable());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"employee\"");
    }
}
