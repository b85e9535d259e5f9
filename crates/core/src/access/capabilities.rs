//! Role-derived UI affordances.

use crate::types::Role;

/// Which actions the client offers to a given role.
///
/// Views consult this to hide controls the user cannot use. It mirrors the
/// route table; the API remains the authority on what is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Create, edit and delete agents.
    pub manage_agents: bool,
    /// Create employee and customer accounts.
    pub create_users: bool,
    /// List every user (needed to assign agents).
    pub list_users: bool,
    /// Open a chat with an agent.
    pub chat: bool,
}

impl Capabilities {
    /// Capabilities for a session role. An absent role gets none.
    #[must_use]
    pub const fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::Admin) => Self {
                manage_agents: true,
                create_users: true,
                list_users: true,
                chat: true,
            },
            Some(Role::Employee | Role::Customer) => Self {
                manage_agents: false,
                create_users: false,
                list_users: false,
                chat: true,
            },
            None => Self {
                manage_agents: false,
                create_users: false,
                list_users: false,
                chat: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_do_everything() {
        let caps = Capabilities::for_role(Some(Role::Admin));
        assert!(caps.manage_agents && caps.create_users && caps.list_users && caps.chat);
    }

    #[test]
    fn test_staff_and_customers_only_chat() {
        for role in [Role::Employee, Role::Customer] {
            let caps = Capabilities::for_role(Some(role));
            assert!(caps.chat);
            assert!(!caps.manage_agents);
            assert!(!caps.create_users);
        }
    }

    #[test]
    fn test_no_role_gets_nothing() {
        assert_eq!(Capabilities::for_role(None), Capabilities::default());
    }
}
