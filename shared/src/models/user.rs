//! Users, roles and the typed capability model used for authorization

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Always empty for admins, who implicitly hold every capability
    pub capabilities: BTreeSet<Capability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account role as stored in the `users.role` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Employee,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Employee => "employee",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "employee" => Ok(UserRole::Employee),
            other => Err(format!("unknown user role '{}'", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Things an employee may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ApproveOrders,
    ManageInventory,
    ManageStores,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::ApproveOrders,
        Capability::ManageInventory,
        Capability::ManageStores,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ApproveOrders => "approve_orders",
            Capability::ManageInventory => "manage_inventory",
            Capability::ManageStores => "manage_stores",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employee capability flags as persisted in `employee_profiles`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub can_approve_orders: bool,
    pub can_manage_inventory: bool,
    pub can_manage_stores: bool,
}

impl CapabilityFlags {
    pub fn to_set(self) -> BTreeSet<Capability> {
        let mut set = BTreeSet::new();
        if self.can_approve_orders {
            set.insert(Capability::ApproveOrders);
        }
        if self.can_manage_inventory {
            set.insert(Capability::ManageInventory);
        }
        if self.can_manage_stores {
            set.insert(Capability::ManageStores);
        }
        set
    }

    pub fn from_set(capabilities: &BTreeSet<Capability>) -> Self {
        Self {
            can_approve_orders: capabilities.contains(&Capability::ApproveOrders),
            can_manage_inventory: capabilities.contains(&Capability::ManageInventory),
            can_manage_stores: capabilities.contains(&Capability::ManageStores),
        }
    }
}

/// What a user is, resolved once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Admin,
    Employee { capabilities: BTreeSet<Capability> },
}

impl Principal {
    /// Build a principal from a role and the (possibly missing) employee profile.
    /// An employee without a profile holds no capabilities.
    pub fn from_role(role: UserRole, flags: Option<CapabilityFlags>) -> Self {
        match role {
            UserRole::Admin => Principal::Admin,
            UserRole::Employee => Principal::Employee {
                capabilities: flags.unwrap_or_default().to_set(),
            },
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        match self {
            Principal::Admin => true,
            Principal::Employee { capabilities } => capabilities.contains(&capability),
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            Principal::Admin => UserRole::Admin,
            Principal::Employee { .. } => UserRole::Employee,
        }
    }
}

/// A resolved user acting on the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub principal: Principal,
}

impl Actor {
    pub fn new(user_id: Uuid, principal: Principal) -> Self {
        Self { user_id, principal }
    }

    pub fn require(&self, capability: Capability) -> Result<(), DomainError> {
        if self.principal.can(capability) {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(capability))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        let admin = Principal::from_role(UserRole::Admin, None);
        for capability in Capability::ALL {
            assert!(admin.can(capability));
        }
    }

    #[test]
    fn employee_without_profile_holds_nothing() {
        let employee = Principal::from_role(UserRole::Employee, None);
        for capability in Capability::ALL {
            assert!(!employee.can(capability));
        }
    }

    #[test]
    fn employee_flags_map_to_capabilities() {
        let flags = CapabilityFlags {
            can_approve_orders: true,
            can_manage_inventory: false,
            can_manage_stores: true,
        };
        let employee = Principal::from_role(UserRole::Employee, Some(flags));

        assert!(employee.can(Capability::ApproveOrders));
        assert!(!employee.can(Capability::ManageInventory));
        assert!(employee.can(Capability::ManageStores));
        assert_eq!(CapabilityFlags::from_set(&flags.to_set()), flags);
    }

    #[test]
    fn actor_require_reports_missing_capability() {
        let actor = Actor::new(
            Uuid::new_v4(),
            Principal::from_role(UserRole::Employee, Some(CapabilityFlags::default())),
        );
        assert_eq!(
            actor.require(Capability::ApproveOrders),
            Err(DomainError::PermissionDenied(Capability::ApproveOrders))
        );
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("employee".parse::<UserRole>(), Ok(UserRole::Employee));
        assert!("owner".parse::<UserRole>().is_err());
    }
}
