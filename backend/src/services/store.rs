//! Medical store service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::MedicalStore;

/// Store service for the pharmacies receiving stock
#[derive(Clone)]
pub struct StoreService {
    db: PgPool,
}

/// Database row for a medical store
#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    address: String,
    phone: Option<String>,
    license_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoreRow> for MedicalStore {
    fn from(row: StoreRow) -> Self {
        MedicalStore {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            license_number: row.license_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for registering a store
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoreInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub address: String,
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub license_number: Option<String>,
}

/// Input for updating a store
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStoreInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub license_number: Option<String>,
}

impl StoreService {
    /// Create a new StoreService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a store
    pub async fn create(&self, input: CreateStoreInput) -> AppResult<MedicalStore> {
        input.validate()?;
        if let Some(phone) = &input.phone {
            shared::validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }

        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            INSERT INTO medical_stores (name, address, phone, license_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, address, phone, license_number, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.license_number)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(store_id = %row.id, name = %row.name, "Store registered");

        Ok(row.into())
    }

    /// Get a store by ID
    pub async fn get(&self, store_id: Uuid) -> AppResult<MedicalStore> {
        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT id, name, address, phone, license_number, created_at, updated_at
            FROM medical_stores
            WHERE id = $1
            "#,
        )
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Store".to_string()))?;

        Ok(row.into())
    }

    /// List all stores by name
    pub async fn list(&self) -> AppResult<Vec<MedicalStore>> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT id, name, address, phone, license_number, created_at, updated_at
            FROM medical_stores
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(MedicalStore::from).collect())
    }

    /// Update a store
    pub async fn update(&self, store_id: Uuid, input: UpdateStoreInput) -> AppResult<MedicalStore> {
        input.validate()?;
        if let Some(phone) = &input.phone {
            shared::validate_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }

        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            UPDATE medical_stores
            SET name = COALESCE($1, name),
                address = COALESCE($2, address),
                phone = COALESCE($3, phone),
                license_number = COALESCE($4, license_number),
                updated_at = NOW()
            WHERE id = $5
            RETURNING id, name, address, phone, license_number, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.address)
        .bind(&input.phone)
        .bind(&input.license_number)
        .bind(store_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Store".to_string()))?;

        Ok(row.into())
    }
}
