//! Permission resolution: who a user is and what they may do

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{Actor, Capability, CapabilityFlags, Principal, UserRole};

/// Permission service resolving users into typed principals
#[derive(Clone)]
pub struct PermissionService {
    db: PgPool,
}

/// Role and (for employees) capability flags of one user
#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    role: String,
    can_approve_orders: Option<bool>,
    can_manage_inventory: Option<bool>,
    can_manage_stores: Option<bool>,
}

impl PrincipalRow {
    fn into_principal(self) -> AppResult<Principal> {
        let role: UserRole = self.role.parse().map_err(AppError::Internal)?;
        // The profile columns are NOT NULL, so a NULL here means no profile row.
        let flags = self.can_approve_orders.map(|can_approve_orders| CapabilityFlags {
            can_approve_orders,
            can_manage_inventory: self.can_manage_inventory.unwrap_or(false),
            can_manage_stores: self.can_manage_stores.unwrap_or(false),
        });
        Ok(Principal::from_role(role, flags))
    }
}

/// Resolve a user into an [`Actor`]. Runs on a pool or inside a transaction.
pub async fn resolve_actor<'e, E>(executor: E, user_id: Uuid) -> AppResult<Actor>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PrincipalRow>(
        r#"
        SELECT u.role, e.can_approve_orders, e.can_manage_inventory, e.can_manage_stores
        FROM users u
        LEFT JOIN employee_profiles e ON e.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    Ok(Actor::new(user_id, row.into_principal()?))
}

impl PermissionService {
    /// Create a new PermissionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve a user into an actor
    pub async fn resolve(&self, user_id: Uuid) -> AppResult<Actor> {
        resolve_actor(&self.db, user_id).await
    }

    /// Whether the user may approve or reject orders
    pub async fn can_approve(&self, user_id: Uuid) -> AppResult<bool> {
        let actor = self.resolve(user_id).await?;
        Ok(actor.principal.can(Capability::ApproveOrders))
    }

    /// Resolve the user and fail with `PermissionDenied` unless they hold `capability`
    pub async fn require(&self, user_id: Uuid, capability: Capability) -> AppResult<Actor> {
        let actor = self.resolve(user_id).await?;
        actor.require(capability)?;
        Ok(actor)
    }

    /// Resolve the user and fail unless they are an administrator
    pub async fn require_admin(&self, user_id: Uuid) -> AppResult<Actor> {
        let actor = self.resolve(user_id).await?;
        if actor.principal != Principal::Admin {
            return Err(AppError::PermissionDenied(
                "Only administrators can manage users".to_string(),
            ));
        }
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str, approve: Option<bool>) -> PrincipalRow {
        PrincipalRow {
            role: role.to_string(),
            can_approve_orders: approve,
            can_manage_inventory: approve.map(|_| false),
            can_manage_stores: approve.map(|_| false),
        }
    }

    #[test]
    fn admin_row_resolves_to_admin() {
        assert_eq!(row("admin", None).into_principal().unwrap(), Principal::Admin);
    }

    #[test]
    fn employee_flag_controls_approval() {
        let approver = row("employee", Some(true)).into_principal().unwrap();
        let clerk = row("employee", Some(false)).into_principal().unwrap();
        let no_profile = row("employee", None).into_principal().unwrap();

        assert!(approver.can(Capability::ApproveOrders));
        assert!(!clerk.can(Capability::ApproveOrders));
        assert!(!no_profile.can(Capability::ApproveOrders));
    }

    #[test]
    fn unknown_role_is_internal_error() {
        assert!(matches!(
            row("superuser", None).into_principal(),
            Err(AppError::Internal(_))
        ));
    }
}
