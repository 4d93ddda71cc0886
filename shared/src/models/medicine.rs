//! Medicine catalogue and stock ledger

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A medicine held in the central inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub price: Decimal,
    /// Never negative
    pub stock_quantity: i32,
    /// Advisory floor used for low-stock alerts
    pub minimum_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.minimum_stock
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date <= today
    }

    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry_date - today).num_days()
    }
}

/// Compact medicine view nested into order responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineSummary {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub stock_quantity: i32,
}

/// The mutable stock counter of one medicine.
///
/// Callers load it from a row they hold a lock on, apply a withdrawal or
/// deposit, and write `quantity()` back in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLedger {
    quantity: i32,
}

impl StockLedger {
    pub fn new(quantity: i32) -> Self {
        Self { quantity }
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn can_cover(&self, requested: i32) -> bool {
        requested > 0 && self.quantity >= requested
    }

    /// Remove `requested` units. Leaves the ledger untouched on error.
    pub fn withdraw(&mut self, requested: i32) -> Result<i32, DomainError> {
        if requested <= 0 {
            return Err(DomainError::InvalidQuantity(requested));
        }
        if self.quantity < requested {
            return Err(DomainError::InsufficientStock {
                available: self.quantity,
                requested,
            });
        }
        self.quantity -= requested;
        Ok(self.quantity)
    }

    /// Add `received` units from a supply.
    pub fn deposit(&mut self, received: i32) -> Result<i32, DomainError> {
        if received <= 0 {
            return Err(DomainError::InvalidQuantity(received));
        }
        self.quantity = self
            .quantity
            .checked_add(received)
            .ok_or(DomainError::StockOverflow)?;
        Ok(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdraw_decrements_stock() {
        let mut ledger = StockLedger::new(100);
        assert_eq!(ledger.withdraw(30), Ok(70));
        assert_eq!(ledger.quantity(), 70);
    }

    #[test]
    fn withdraw_exact_stock_reaches_zero() {
        let mut ledger = StockLedger::new(12);
        assert_eq!(ledger.withdraw(12), Ok(0));
    }

    #[test]
    fn withdraw_more_than_available_is_rejected_without_change() {
        let mut ledger = StockLedger::new(10);
        assert_eq!(
            ledger.withdraw(20),
            Err(DomainError::InsufficientStock {
                available: 10,
                requested: 20
            })
        );
        assert_eq!(ledger.quantity(), 10);
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        let mut ledger = StockLedger::new(10);
        assert_eq!(ledger.withdraw(0), Err(DomainError::InvalidQuantity(0)));
        assert_eq!(ledger.deposit(-5), Err(DomainError::InvalidQuantity(-5)));
        assert_eq!(ledger.quantity(), 10);
    }

    #[test]
    fn deposit_guards_overflow() {
        let mut ledger = StockLedger::new(i32::MAX - 1);
        assert_eq!(ledger.deposit(2), Err(DomainError::StockOverflow));
        assert_eq!(ledger.deposit(1), Ok(i32::MAX));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn withdrawals_never_drive_stock_negative(
                initial in 0i32..1_000,
                requests in prop::collection::vec(1i32..200, 0..30)
            ) {
                let mut ledger = StockLedger::new(initial);
                let mut granted = 0;
                for requested in requests {
                    if ledger.withdraw(requested).is_ok() {
                        granted += requested;
                    }
                    prop_assert!(ledger.quantity() >= 0);
                }
                prop_assert_eq!(ledger.quantity(), initial - granted);
            }

            #[test]
            fn deposit_then_withdraw_restores_stock(
                initial in 0i32..10_000,
                amount in 1i32..10_000
            ) {
                let mut ledger = StockLedger::new(initial);
                ledger.deposit(amount).unwrap();
                ledger.withdraw(amount).unwrap();
                prop_assert_eq!(ledger.quantity(), initial);
            }
        }
    }
}
