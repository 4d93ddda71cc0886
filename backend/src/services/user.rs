//! User administration service

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::{Capability, CapabilityFlags, User, UserRole};

/// User service for accounts and employee capabilities
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// Database row for a user joined with their employee profile
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    can_approve_orders: Option<bool>,
    can_manage_inventory: Option<bool>,
    can_manage_stores: Option<bool>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row.role.parse().map_err(AppError::Internal)?;
        let capabilities = match role {
            UserRole::Admin => BTreeSet::new(),
            UserRole::Employee => CapabilityFlags {
                can_approve_orders: row.can_approve_orders.unwrap_or(false),
                can_manage_inventory: row.can_manage_inventory.unwrap_or(false),
                can_manage_stores: row.can_manage_stores.unwrap_or(false),
            }
            .to_set(),
        };

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            capabilities,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const USER_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.role,
           e.can_approve_orders, e.can_manage_inventory, e.can_manage_stores,
           u.created_at, u.updated_at
    FROM users u
    LEFT JOIN employee_profiles e ON e.user_id = u.id
"#;

/// Input for creating a user
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    pub role: UserRole,
    /// Ignored for admins
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

/// Input for replacing an employee's capabilities
#[derive(Debug, Deserialize)]
pub struct UpdateCapabilitiesInput {
    pub capabilities: BTreeSet<Capability>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a user, with an employee profile for employees
    pub async fn create(&self, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;
        let email = input.email.trim().to_lowercase();

        let mut tx = self.db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.name)
        .bind(&email)
        .bind(input.role.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if input.role == UserRole::Employee {
            upsert_profile(&mut tx, user_id, CapabilityFlags::from_set(&input.capabilities))
                .await?;
        }

        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");

        Ok(user)
    }

    /// Get a user by ID
    pub async fn get(&self, user_id: Uuid) -> AppResult<User> {
        let mut conn = self.db.acquire().await?;
        fetch_user(&mut conn, user_id).await
    }

    /// List all users
    pub async fn list(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} ORDER BY u.name ASC"))
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Replace the capability set of an employee
    pub async fn update_capabilities(
        &self,
        user_id: Uuid,
        input: UpdateCapabilitiesInput,
    ) -> AppResult<User> {
        let mut tx = self.db.begin().await?;

        let user = fetch_user(&mut tx, user_id).await?;
        if user.role != UserRole::Employee {
            return Err(AppError::validation(
                "capabilities",
                "Capabilities can only be assigned to employees",
            ));
        }

        upsert_profile(&mut tx, user_id, CapabilityFlags::from_set(&input.capabilities)).await?;
        sqlx::query("UPDATE users SET updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await?;

        let granted: HashMap<&str, bool> = Capability::ALL
            .iter()
            .map(|c| (c.as_str(), user.capabilities.contains(c)))
            .collect();
        tracing::info!(user_id = %user_id, ?granted, "Employee capabilities updated");

        Ok(user)
    }
}

async fn upsert_profile(
    conn: &mut PgConnection,
    user_id: Uuid,
    flags: CapabilityFlags,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO employee_profiles (user_id, can_approve_orders, can_manage_inventory, can_manage_stores)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id) DO UPDATE
        SET can_approve_orders = EXCLUDED.can_approve_orders,
            can_manage_inventory = EXCLUDED.can_manage_inventory,
            can_manage_stores = EXCLUDED.can_manage_stores
        "#,
    )
    .bind(user_id)
    .bind(flags.can_approve_orders)
    .bind(flags.can_manage_inventory)
    .bind(flags.can_manage_stores)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<User> {
    sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = $1"))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?
        .try_into()
}
