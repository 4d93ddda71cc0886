//! Medical stores that receive distributed stock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pharmacy or clinic that orders medicine from the central inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalStore {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact store view nested into order responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSummary {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}
