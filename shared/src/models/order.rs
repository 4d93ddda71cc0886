//! Distribution orders and their approval state machine
//!
//! ```text
//!            approve            mark_delivered
//! pending ------------> approved ------------> approved + delivered_at
//!    |
//!    |      reject
//!    +----------------> rejected
//! ```
//!
//! `approved` and `rejected` are terminal. Delivery only stamps `delivered_at`
//! and leaves the status at `approved`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Actor, Capability, MedicineSummary, StockLedger, StoreSummary};
use crate::error::DomainError;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Status reached by applying `action`, or why it is not allowed
    pub fn apply(self, action: OrderAction) -> Result<OrderStatus, DomainError> {
        match (self, action) {
            (OrderStatus::Pending, OrderAction::Approve) => Ok(OrderStatus::Approved),
            (OrderStatus::Pending, OrderAction::Reject) => Ok(OrderStatus::Rejected),
            (OrderStatus::Approved, OrderAction::Deliver) => Ok(OrderStatus::Approved),
            (current, action) => Err(DomainError::InvalidState { current, action }),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision taken on a pending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Approve,
    Reject,
    Deliver,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderAction::Approve => "approve",
            OrderAction::Reject => "reject",
            OrderAction::Deliver => "deliver",
        })
    }
}

/// A request to move `quantity` units of one medicine to one store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub store_id: Uuid,
    pub requester_id: Uuid,
    pub quantity: i32,
    pub status: OrderStatus,
    pub approver_id: Option<Uuid>,
    /// Decision timestamp; set on rejection as well as approval
    pub approved_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// A fresh pending order. Stock is deliberately not checked here.
    pub fn new_pending(
        medicine_id: Uuid,
        store_id: Uuid,
        requester_id: Uuid,
        quantity: i32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            medicine_id,
            store_id,
            requester_id,
            quantity,
            status: OrderStatus::Pending,
            approver_id: None,
            approved_at: None,
            delivered_at: None,
            notes,
            created_at: now,
            updated_at: now,
        })
    }

    /// Approve the order against `stock`, which must be the current counter of
    /// the order's medicine. Checks permission, then status, then stock; on
    /// any failure neither the order nor the ledger is modified.
    pub fn approve(
        &mut self,
        approver: &Actor,
        stock: &mut StockLedger,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        approver.require(Capability::ApproveOrders)?;
        let next = self.status.apply(OrderAction::Approve)?;
        stock.withdraw(self.quantity)?;

        self.status = next;
        self.approver_id = Some(approver.user_id);
        self.approved_at = Some(now);
        self.delivered_at = None;
        self.set_notes(notes);
        self.updated_at = now;
        Ok(())
    }

    /// Reject the order. Inventory is never touched.
    pub fn reject(
        &mut self,
        approver: &Actor,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        approver.require(Capability::ApproveOrders)?;
        let next = self.status.apply(OrderAction::Reject)?;

        self.status = next;
        self.approver_id = Some(approver.user_id);
        self.approved_at = Some(now);
        self.set_notes(notes);
        self.updated_at = now;
        Ok(())
    }

    /// Stamp the delivery time on an approved order
    pub fn mark_delivered(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        check_delivery(self.status, self.delivered_at)?;
        self.delivered_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn set_notes(&mut self, notes: Option<String>) {
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
    }
}

/// Whether an order in this state may be marked delivered
pub fn check_delivery(
    status: OrderStatus,
    delivered_at: Option<DateTime<Utc>>,
) -> Result<(), DomainError> {
    status.apply(OrderAction::Deliver)?;
    if delivered_at.is_some() {
        return Err(DomainError::AlreadyDelivered);
    }
    Ok(())
}

/// Order with the medicine and store it refers to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub medicine: MedicineSummary,
    pub store: StoreSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CapabilityFlags, Principal, UserRole};

    fn admin() -> Actor {
        Actor::new(Uuid::new_v4(), Principal::Admin)
    }

    fn employee(can_approve_orders: bool) -> Actor {
        Actor::new(
            Uuid::new_v4(),
            Principal::from_role(
                UserRole::Employee,
                Some(CapabilityFlags {
                    can_approve_orders,
                    ..Default::default()
                }),
            ),
        )
    }

    fn pending(quantity: i32) -> Order {
        Order::new_pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            quantity,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn transitions_from_pending() {
        assert_eq!(
            OrderStatus::Pending.apply(OrderAction::Approve),
            Ok(OrderStatus::Approved)
        );
        assert_eq!(
            OrderStatus::Pending.apply(OrderAction::Reject),
            Ok(OrderStatus::Rejected)
        );
    }

    #[test]
    fn delivery_keeps_approved_status() {
        assert_eq!(
            OrderStatus::Approved.apply(OrderAction::Deliver),
            Ok(OrderStatus::Approved)
        );
        for current in [OrderStatus::Pending, OrderStatus::Rejected] {
            assert_eq!(
                current.apply(OrderAction::Deliver),
                Err(DomainError::InvalidState {
                    current,
                    action: OrderAction::Deliver
                })
            );
        }
    }

    #[test]
    fn terminal_states_reject_every_decision() {
        for current in [OrderStatus::Approved, OrderStatus::Rejected] {
            assert!(current.is_terminal());
            for action in [OrderAction::Approve, OrderAction::Reject] {
                assert_eq!(
                    current.apply(action),
                    Err(DomainError::InvalidState { current, action })
                );
            }
        }
    }

    #[test]
    fn approve_decrements_stock_and_records_decision() {
        let approver = admin();
        let mut order = pending(30);
        let mut stock = StockLedger::new(100);
        let now = Utc::now();

        order
            .approve(&approver, &mut stock, Some("urgent".into()), now)
            .unwrap();

        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.approver_id, Some(approver.user_id));
        assert_eq!(order.approved_at, Some(now));
        assert_eq!(order.notes.as_deref(), Some("urgent"));
        assert_eq!(stock.quantity(), 70);
    }

    #[test]
    fn second_approval_is_invalid_state_and_keeps_stock() {
        let approver = admin();
        let mut order = pending(30);
        let mut stock = StockLedger::new(100);
        order.approve(&approver, &mut stock, None, Utc::now()).unwrap();

        let err = order
            .approve(&approver, &mut stock, None, Utc::now())
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::InvalidState {
                current: OrderStatus::Approved,
                action: OrderAction::Approve
            }
        );
        assert_eq!(stock.quantity(), 70);
    }

    #[test]
    fn insufficient_stock_leaves_order_pending() {
        let mut order = pending(20);
        let mut stock = StockLedger::new(10);

        let err = order
            .approve(&admin(), &mut stock, None, Utc::now())
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::InsufficientStock {
                available: 10,
                requested: 20
            }
        );
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.approver_id, None);
        assert_eq!(stock.quantity(), 10);
    }

    #[test]
    fn employee_without_capability_is_denied_before_state_check() {
        let approver = employee(false);
        let mut order = pending(5);
        order.status = OrderStatus::Rejected;
        let mut stock = StockLedger::new(10);

        assert_eq!(
            order.approve(&approver, &mut stock, None, Utc::now()),
            Err(DomainError::PermissionDenied(Capability::ApproveOrders))
        );
        assert_eq!(
            order.reject(&approver, None, Utc::now()),
            Err(DomainError::PermissionDenied(Capability::ApproveOrders))
        );
    }

    #[test]
    fn capable_employee_can_approve() {
        let mut order = pending(5);
        let mut stock = StockLedger::new(5);
        order
            .approve(&employee(true), &mut stock, None, Utc::now())
            .unwrap();
        assert_eq!(stock.quantity(), 0);
    }

    #[test]
    fn reject_never_touches_stock_and_is_single_shot() {
        let approver = admin();
        let mut order = pending(5);
        let mut stock = StockLedger::new(10);
        order.reject(&approver, Some("duplicate".into()), Utc::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Rejected);
        assert!(order.approved_at.is_some());
        assert_eq!(stock.quantity(), 10);
        assert!(matches!(
            order.approve(&approver, &mut stock, None, Utc::now()),
            Err(DomainError::InvalidState { .. })
        ));
    }

    #[test]
    fn delivery_requires_approval_and_happens_once() {
        let mut order = pending(5);
        assert_eq!(
            order.mark_delivered(Utc::now()),
            Err(DomainError::InvalidState {
                current: OrderStatus::Pending,
                action: OrderAction::Deliver
            })
        );

        let mut stock = StockLedger::new(5);
        order.approve(&admin(), &mut stock, None, Utc::now()).unwrap();
        order.mark_delivered(Utc::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Approved);
        assert!(order.delivered_at.is_some());
        assert_eq!(
            order.mark_delivered(Utc::now()),
            Err(DomainError::AlreadyDelivered)
        );
    }

    #[test]
    fn new_order_requires_positive_quantity() {
        let result = Order::new_pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            0,
            None,
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), DomainError::InvalidQuantity(0));
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!("rejected".parse::<OrderStatus>(), Ok(OrderStatus::Rejected));
    }
}
