//! Staff roster, roles and advisory permission checks.
//!
//! There is no authentication here. The "current user" is whoever was last
//! selected in the user switcher; permission checks only decide which actions
//! the desk offers and who gets written to the audit log.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Supervisor,
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "Admin",
            Role::Supervisor => "Supervisor",
            Role::Agent => "Agent",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewSettings,
    EditSettings,
    ViewAudit,
    CalculateRates,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::ViewSettings => "view_settings",
            Permission::EditSettings => "edit_settings",
            Permission::ViewAudit => "view_audit",
            Permission::CalculateRates => "calculate_rates",
        };
        f.pad(name)
    }
}

/// Capability check injected into the service layer
pub type PermissionCheck = fn(Role, Permission) -> bool;

/// Default role policy
pub fn has_permission(role: Role, permission: Permission) -> bool {
    use Permission::*;

    match role {
        Role::Admin => true,
        Role::Supervisor => matches!(permission, ViewSettings | ViewAudit | CalculateRates),
        Role::Agent => permission == CalculateRates,
    }
}

/// A desk user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
}

/// Fixed staff roster
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// The desk's standard roster, with presence relative to `now`
    pub fn with_default_roster(now: DateTime<Utc>) -> Self {
        let user = |id, name: &str, email: &str, role, is_online, last_seen| User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            is_online,
            last_seen,
        };

        Self::new(vec![
            user(1, "John Smith", "john.smith@company.com", Role::Admin, true, now),
            user(2, "Sarah Johnson", "sarah.johnson@company.com", Role::Supervisor, true, now),
            user(
                3,
                "Mike Davis",
                "mike.davis@company.com",
                Role::Agent,
                false,
                now - Duration::minutes(30),
            ),
            user(4, "Lisa Wang", "lisa.wang@company.com", Role::Agent, true, now),
        ])
    }

    pub fn find(&self, id: u32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn online(&self) -> Vec<&User> {
        self.users.iter().filter(|u| u.is_online).collect()
    }

    /// Who is acting when nobody has been selected yet
    pub fn default_user(&self) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.role == Role::Admin)
            .or_else(|| self.users.first())
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::with_default_roster(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        for permission in [
            Permission::ViewSettings,
            Permission::EditSettings,
            Permission::ViewAudit,
            Permission::CalculateRates,
        ] {
            assert!(has_permission(Role::Admin, permission));
        }

        assert!(has_permission(Role::Supervisor, Permission::ViewSettings));
        assert!(has_permission(Role::Supervisor, Permission::ViewAudit));
        assert!(has_permission(Role::Supervisor, Permission::CalculateRates));
        assert!(!has_permission(Role::Supervisor, Permission::EditSettings));

        assert!(has_permission(Role::Agent, Permission::CalculateRates));
        assert!(!has_permission(Role::Agent, Permission::ViewSettings));
        assert!(!has_permission(Role::Agent, Permission::ViewAudit));
        assert!(!has_permission(Role::Agent, Permission::EditSettings));
    }

    #[test]
    fn test_default_roster() {
        let now = Utc::now();
        let directory = UserDirectory::with_default_roster(now);

        assert_eq!(directory.users().len(), 4);
        assert_eq!(directory.default_user().map(|u| u.id), Some(1));
        assert_eq!(directory.find(2).map(|u| u.role), Some(Role::Supervisor));
        assert!(directory.find(99).is_none());

        let online: Vec<u32> = directory.online().iter().map(|u| u.id).collect();
        assert_eq!(online, vec![1, 2, 4]);
        assert_eq!(
            directory.find(3).map(|u| u.last_seen),
            Some(now - Duration::minutes(30))
        );
    }

    #[test]
    fn test_permission_names() {
        assert_eq!(Permission::EditSettings.to_string(), "edit_settings");
        assert_eq!(Role::Supervisor.to_string(), "Supervisor");
        assert_eq!(
            serde_json::to_string(&Permission::CalculateRates).unwrap(),
            "\"calculate_rates\""
        );
    }
}
