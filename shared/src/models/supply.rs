//! Supply (restock) records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stock received from a supplier for one medicine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supply {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub supplier_name: String,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub received_by: Uuid,
    pub received_at: DateTime<Utc>,
    pub notes: Option<String>,
}
