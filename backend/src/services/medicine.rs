//! Medicine catalogue service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::{compute_alerts, Medicine, MedicineAlert};

/// Medicine service for catalogue management and stock alerts
#[derive(Clone)]
pub struct MedicineService {
    db: PgPool,
}

/// Database row for a medicine
#[derive(Debug, sqlx::FromRow)]
struct MedicineRow {
    id: Uuid,
    name: String,
    company: String,
    manufacture_date: NaiveDate,
    expiry_date: NaiveDate,
    price: Decimal,
    stock_quantity: i32,
    minimum_stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MedicineRow> for Medicine {
    fn from(row: MedicineRow) -> Self {
        Medicine {
            id: row.id,
            name: row.name,
            company: row.company,
            manufacture_date: row.manufacture_date,
            expiry_date: row.expiry_date,
            price: row.price,
            stock_quantity: row.stock_quantity,
            minimum_stock: row.minimum_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MEDICINE_COLUMNS: &str = "id, name, company, manufacture_date, expiry_date, price, \
     stock_quantity, minimum_stock, created_at, updated_at";

/// Input for registering a medicine
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicineInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub company: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub price: Decimal,
    /// Opening stock; later changes go through supplies and approvals
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub minimum_stock: i32,
}

/// Input for updating descriptive fields. Stock is not editable here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMedicineInput {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub company: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
    pub minimum_stock: Option<i32>,
}

/// Filters for listing medicines
#[derive(Debug, Default, Deserialize)]
pub struct MedicineFilter {
    /// Case-insensitive substring of name or company
    pub search: Option<String>,
    /// Only medicines at or below their minimum stock
    #[serde(default)]
    pub low_stock: bool,
}

impl MedicineService {
    /// Create a new MedicineService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a medicine
    pub async fn create(&self, input: CreateMedicineInput) -> AppResult<Medicine> {
        input.validate()?;
        shared::validate_shelf_life(input.manufacture_date, input.expiry_date)
            .map_err(|msg| AppError::validation("expiry_date", msg))?;
        shared::validate_price(input.price).map_err(|msg| AppError::validation("price", msg))?;
        shared::validate_stock_levels(input.stock_quantity, input.minimum_stock)
            .map_err(|msg| AppError::validation("stock_quantity", msg))?;

        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            INSERT INTO medicines (name, company, manufacture_date, expiry_date, price, stock_quantity, minimum_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.company)
        .bind(input.manufacture_date)
        .bind(input.expiry_date)
        .bind(input.price)
        .bind(input.stock_quantity)
        .bind(input.minimum_stock)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(medicine_id = %row.id, name = %row.name, "Medicine registered");

        Ok(row.into())
    }

    /// Get a medicine by ID
    pub async fn get(&self, medicine_id: Uuid) -> AppResult<Medicine> {
        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = $1"
        ))
        .bind(medicine_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        Ok(row.into())
    }

    /// List medicines by name
    pub async fn list(&self, filter: MedicineFilter) -> AppResult<Vec<Medicine>> {
        let pattern = filter
            .search
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", s.trim()));

        let rows = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            SELECT {MEDICINE_COLUMNS}
            FROM medicines
            WHERE ($1::varchar IS NULL OR name ILIKE $1 OR company ILIKE $1)
              AND (NOT $2 OR stock_quantity <= minimum_stock)
            ORDER BY name ASC
            "#
        ))
        .bind(pattern)
        .bind(filter.low_stock)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Medicine::from).collect())
    }

    /// Update descriptive fields of a medicine
    pub async fn update(
        &self,
        medicine_id: Uuid,
        input: UpdateMedicineInput,
    ) -> AppResult<Medicine> {
        input.validate()?;

        let existing = self.get(medicine_id).await?;

        let manufacture_date = input.manufacture_date.unwrap_or(existing.manufacture_date);
        let expiry_date = input.expiry_date.unwrap_or(existing.expiry_date);
        shared::validate_shelf_life(manufacture_date, expiry_date)
            .map_err(|msg| AppError::validation("expiry_date", msg))?;

        if let Some(price) = input.price {
            shared::validate_price(price).map_err(|msg| AppError::validation("price", msg))?;
        }
        if let Some(minimum_stock) = input.minimum_stock {
            shared::validate_stock_levels(0, minimum_stock)
                .map_err(|msg| AppError::validation("minimum_stock", msg))?;
        }

        let row = sqlx::query_as::<_, MedicineRow>(&format!(
            r#"
            UPDATE medicines
            SET name = COALESCE($1, name),
                company = COALESCE($2, company),
                manufacture_date = $3,
                expiry_date = $4,
                price = COALESCE($5, price),
                minimum_stock = COALESCE($6, minimum_stock),
                updated_at = NOW()
            WHERE id = $7
            RETURNING {MEDICINE_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.company)
        .bind(manufacture_date)
        .bind(expiry_date)
        .bind(input.price)
        .bind(input.minimum_stock)
        .bind(medicine_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        Ok(row.into())
    }

    /// Delete a medicine that no order or supply refers to
    pub async fn delete(&self, medicine_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(medicine_id)
            .execute(&self.db)
            .await
            .map_err(|e| match AppError::from(e) {
                // On delete the foreign key protects the referencing rows
                AppError::NotFound(_) => AppError::Conflict {
                    resource: "medicine".to_string(),
                    message: "Medicine is referenced by orders or supplies".to_string(),
                },
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Medicine".to_string()));
        }

        tracing::info!(medicine_id = %medicine_id, "Medicine deleted");

        Ok(())
    }

    /// Low-stock and expiry alerts as of `today`
    pub async fn alerts(
        &self,
        today: NaiveDate,
        expiry_warning_days: i64,
    ) -> AppResult<Vec<MedicineAlert>> {
        let medicines = self.list(MedicineFilter::default()).await?;
        Ok(compute_alerts(&medicines, today, expiry_warning_days))
    }
}
