//! Stock and expiry alerts derived from the medicine list
//!
//! The same computation backs the `/medicines/alerts` endpoint and the
//! dashboard's client-side alert panel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Medicine;

/// Days before expiry at which a medicine starts being flagged
pub const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OutOfStock,
    LowStock,
    Expired,
    ExpiringSoon,
}

/// Ordered so that `Critical` sorts first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
}

impl AlertKind {
    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertKind::OutOfStock | AlertKind::Expired => AlertSeverity::Critical,
            AlertKind::LowStock | AlertKind::ExpiringSoon => AlertSeverity::Warning,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineAlert {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub stock_quantity: i32,
    pub minimum_stock: i32,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub message: String,
}

/// Compute all alerts for `medicines` as of `today`.
///
/// A medicine yields at most one stock alert (out of stock wins over low
/// stock) and at most one expiry alert. Results are sorted by severity,
/// then by days until expiry, then by name.
pub fn compute_alerts(
    medicines: &[Medicine],
    today: NaiveDate,
    expiry_warning_days: i64,
) -> Vec<MedicineAlert> {
    let mut alerts = Vec::new();

    for medicine in medicines {
        let days_until_expiry = medicine.days_until_expiry(today);

        let stock_alert = if medicine.stock_quantity <= 0 {
            Some((
                AlertKind::OutOfStock,
                format!("{} is out of stock", medicine.name),
            ))
        } else if medicine.is_low_stock() {
            Some((
                AlertKind::LowStock,
                format!(
                    "{} is low on stock ({} left, minimum {})",
                    medicine.name, medicine.stock_quantity, medicine.minimum_stock
                ),
            ))
        } else {
            None
        };

        let expiry_alert = if medicine.is_expired(today) {
            Some((
                AlertKind::Expired,
                format!("{} expired on {}", medicine.name, medicine.expiry_date),
            ))
        } else if days_until_expiry <= expiry_warning_days {
            Some((
                AlertKind::ExpiringSoon,
                format!(
                    "{} expires in {} day(s) on {}",
                    medicine.name, days_until_expiry, medicine.expiry_date
                ),
            ))
        } else {
            None
        };

        for (kind, message) in stock_alert.into_iter().chain(expiry_alert) {
            alerts.push(MedicineAlert {
                medicine_id: medicine.id,
                medicine_name: medicine.name.clone(),
                kind,
                severity: kind.severity(),
                stock_quantity: medicine.stock_quantity,
                minimum_stock: medicine.minimum_stock,
                expiry_date: medicine.expiry_date,
                days_until_expiry,
                message,
            });
        }
    }

    alerts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then(a.days_until_expiry.cmp(&b.days_until_expiry))
            .then_with(|| a.medicine_name.cmp(&b.medicine_name))
    });
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn medicine(name: &str, stock: i32, minimum: i32, expiry: NaiveDate) -> Medicine {
        let now = Utc::now();
        Medicine {
            id: Uuid::new_v4(),
            name: name.to_string(),
            company: "Acme Pharma".to_string(),
            manufacture_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: expiry,
            price: Decimal::new(1250, 2),
            stock_quantity: stock,
            minimum_stock: minimum,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn healthy_medicine_has_no_alerts() {
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let alerts = compute_alerts(&[medicine("Amoxicillin", 100, 10, far)], today(), 30);
        assert!(alerts.is_empty());
    }

    #[test]
    fn stock_at_minimum_is_low() {
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let alerts = compute_alerts(&[medicine("Ibuprofen", 10, 10, far)], today(), 30);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowStock);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    }

    #[test]
    fn out_of_stock_supersedes_low_stock() {
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let alerts = compute_alerts(&[medicine("Insulin", 0, 10, far)], today(), 30);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::OutOfStock);
    }

    #[test]
    fn expiry_window_boundaries() {
        let on_day = today();
        let in_window = today() + chrono::Duration::days(30);
        let outside = today() + chrono::Duration::days(31);

        let alerts = compute_alerts(
            &[
                medicine("A", 100, 10, on_day),
                medicine("B", 100, 10, in_window),
                medicine("C", 100, 10, outside),
            ],
            today(),
            30,
        );

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::Expired);
        assert_eq!(alerts[0].medicine_name, "A");
        assert_eq!(alerts[1].kind, AlertKind::ExpiringSoon);
        assert_eq!(alerts[1].days_until_expiry, 30);
    }

    #[test]
    fn critical_alerts_sort_first() {
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let alerts = compute_alerts(
            &[medicine("Low", 2, 5, far), medicine("Empty", 0, 5, far)],
            today(),
            30,
        );
        assert_eq!(alerts[0].medicine_name, "Empty");
        assert_eq!(alerts[1].medicine_name, "Low");
    }
}
