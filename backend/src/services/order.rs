//! Order lifecycle service: creation, approval, rejection and delivery
//!
//! Approval decrements medicine stock in the same transaction that resolves
//! the order. Both rows are locked with `FOR UPDATE` (order first, then
//! medicine) and the stock check runs on the locked row, so concurrent
//! approvals serialize: a second approval of the same order sees it resolved,
//! and a second approval against the same medicine sees the decremented stock.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::permission::resolve_actor;
use shared::{MedicineSummary, Order, OrderDetails, OrderStatus, StockLedger, StoreSummary};

/// Order service for the approval workflow
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Database row for an order
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    medicine_id: Uuid,
    store_id: Uuid,
    requester_id: Uuid,
    quantity: i32,
    status: String,
    approver_id: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.id,
            medicine_id: row.medicine_id,
            store_id: row.store_id,
            requester_id: row.requester_id,
            quantity: row.quantity,
            status: row.status.parse().map_err(AppError::Internal)?,
            approver_id: row.approver_id,
            approved_at: row.approved_at,
            delivered_at: row.delivered_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for an order joined with its medicine and store
#[derive(Debug, sqlx::FromRow)]
struct OrderDetailsRow {
    #[sqlx(flatten)]
    order: OrderRow,
    medicine_name: String,
    medicine_company: String,
    medicine_stock_quantity: i32,
    store_name: String,
    store_address: String,
}

impl TryFrom<OrderDetailsRow> for OrderDetails {
    type Error = AppError;

    fn try_from(row: OrderDetailsRow) -> Result<Self, Self::Error> {
        let order = Order::try_from(row.order)?;
        Ok(OrderDetails {
            medicine: MedicineSummary {
                id: order.medicine_id,
                name: row.medicine_name,
                company: row.medicine_company,
                stock_quantity: row.medicine_stock_quantity,
            },
            store: StoreSummary {
                id: order.store_id,
                name: row.store_name,
                address: row.store_address,
            },
            order,
        })
    }
}

const ORDER_COLUMNS: &str = "id, medicine_id, store_id, requester_id, quantity, status, \
     approver_id, approved_at, delivered_at, notes, created_at, updated_at";

const DETAILS_SELECT: &str = r#"
    SELECT o.id, o.medicine_id, o.store_id, o.requester_id, o.quantity, o.status,
           o.approver_id, o.approved_at, o.delivered_at, o.notes, o.created_at, o.updated_at,
           m.name AS medicine_name, m.company AS medicine_company,
           m.stock_quantity AS medicine_stock_quantity,
           s.name AS store_name, s.address AS store_address
    FROM orders o
    JOIN medicines m ON m.id = o.medicine_id
    JOIN medical_stores s ON s.id = o.store_id
"#;

/// Input for creating an order
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub medicine_id: Uuid,
    pub store_id: Uuid,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Input for approving or rejecting an order
#[derive(Debug, Deserialize, Validate)]
pub struct OrderDecisionInput {
    pub approver_id: Uuid,
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Filters for listing orders
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub medicine_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a pending order. Stock is checked at approval time, not here.
    pub async fn create(
        &self,
        requester_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderDetails> {
        input.validate()?;

        let medicine_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM medicines WHERE id = $1)")
                .bind(input.medicine_id)
                .fetch_one(&self.db)
                .await?;

        if !medicine_exists {
            return Err(AppError::NotFound("Medicine".to_string()));
        }

        let order = Order::new_pending(
            input.medicine_id,
            input.store_id,
            requester_id,
            input.quantity,
            input.notes,
            Utc::now(),
        )?;

        let mut conn = self.db.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO orders (id, medicine_id, store_id, requester_id, quantity, status, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id)
        .bind(order.medicine_id)
        .bind(order.store_id)
        .bind(order.requester_id)
        .bind(order.quantity)
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        tracing::info!(
            order_id = %order.id,
            medicine_id = %order.medicine_id,
            store_id = %order.store_id,
            quantity = order.quantity,
            "Order created"
        );

        fetch_details(&mut conn, order.id).await
    }

    /// Approve a pending order and withdraw its quantity from stock
    pub async fn approve(
        &self,
        order_id: Uuid,
        input: OrderDecisionInput,
    ) -> AppResult<OrderDetails> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let mut order = lock_order(&mut tx, order_id).await?;
        let approver = resolve_actor(&mut *tx, input.approver_id).await?;
        let mut stock = lock_stock(&mut tx, order.medicine_id).await?;
        let before = stock.quantity();

        if let Err(err) = order.approve(&approver, &mut stock, input.notes, Utc::now()) {
            tracing::warn!(
                order_id = %order_id,
                approver_id = %approver.user_id,
                "Order approval refused: {}",
                err
            );
            return Err(err.into());
        }

        let remaining = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE medicines
            SET stock_quantity = stock_quantity - $1, updated_at = $2
            WHERE id = $3 AND stock_quantity >= $1
            RETURNING stock_quantity
            "#,
        )
        .bind(order.quantity)
        .bind(order.updated_at)
        .bind(order.medicine_id)
        .fetch_optional(&mut *tx)
        .await?;

        if remaining != Some(stock.quantity()) {
            return Err(AppError::Internal(format!(
                "Stock for medicine {} changed while locked",
                order.medicine_id
            )));
        }

        persist_decision(&mut tx, &order).await?;
        let details = fetch_details(&mut tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            approver_id = %approver.user_id,
            medicine_id = %order.medicine_id,
            stock_before = before,
            stock_after = stock.quantity(),
            "Order approved"
        );

        Ok(details)
    }

    /// Reject a pending order. Stock is never touched.
    pub async fn reject(
        &self,
        order_id: Uuid,
        input: OrderDecisionInput,
    ) -> AppResult<OrderDetails> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let mut order = lock_order(&mut tx, order_id).await?;
        let approver = resolve_actor(&mut *tx, input.approver_id).await?;

        if let Err(err) = order.reject(&approver, input.notes, Utc::now()) {
            tracing::warn!(
                order_id = %order_id,
                approver_id = %approver.user_id,
                "Order rejection refused: {}",
                err
            );
            return Err(err.into());
        }

        persist_decision(&mut tx, &order).await?;
        let details = fetch_details(&mut tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, approver_id = %approver.user_id, "Order rejected");

        Ok(details)
    }

    /// Stamp the delivery time of an approved order. Status stays `approved`.
    pub async fn mark_delivered(&self, order_id: Uuid) -> AppResult<OrderDetails> {
        let mut tx = self.db.begin().await?;

        let mut order = lock_order(&mut tx, order_id).await?;
        if let Err(err) = order.mark_delivered(Utc::now()) {
            tracing::warn!(order_id = %order_id, "Delivery refused: {}", err);
            return Err(err.into());
        }

        sqlx::query("UPDATE orders SET delivered_at = $1, updated_at = $2 WHERE id = $3")
            .bind(order.delivered_at)
            .bind(order.updated_at)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let details = fetch_details(&mut tx, order_id).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, "Order delivered");

        Ok(details)
    }

    /// Get an order with its medicine and store
    pub async fn get(&self, order_id: Uuid) -> AppResult<OrderDetails> {
        let mut conn = self.db.acquire().await?;
        fetch_details(&mut conn, order_id).await
    }

    /// List orders, newest first
    pub async fn list(&self, filter: OrderFilter) -> AppResult<Vec<OrderDetails>> {
        let rows = sqlx::query_as::<_, OrderDetailsRow>(&format!(
            r#"
            {DETAILS_SELECT}
            WHERE ($1::varchar IS NULL OR o.status = $1)
              AND ($2::uuid IS NULL OR o.medicine_id = $2)
              AND ($3::uuid IS NULL OR o.store_id = $3)
            ORDER BY o.created_at DESC
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.medicine_id)
        .bind(filter.store_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(OrderDetails::try_from).collect()
    }
}

/// Lock an order row for the rest of the transaction
async fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Order> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Order".to_string()))?
    .try_into()
}

/// Lock a medicine row and read its current stock
pub(crate) async fn lock_stock(conn: &mut PgConnection, medicine_id: Uuid) -> AppResult<StockLedger> {
    let quantity = sqlx::query_scalar::<_, i32>(
        "SELECT stock_quantity FROM medicines WHERE id = $1 FOR UPDATE",
    )
    .bind(medicine_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

    Ok(StockLedger::new(quantity))
}

/// Write the outcome of an approve/reject decision
async fn persist_decision(conn: &mut PgConnection, order: &Order) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET status = $1, approver_id = $2, approved_at = $3, delivered_at = $4,
            notes = $5, updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(order.status.as_str())
    .bind(order.approver_id)
    .bind(order.approved_at)
    .bind(order.delivered_at)
    .bind(&order.notes)
    .bind(order.updated_at)
    .bind(order.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn fetch_details(conn: &mut PgConnection, order_id: Uuid) -> AppResult<OrderDetails> {
    sqlx::query_as::<_, OrderDetailsRow>(&format!("{DETAILS_SELECT} WHERE o.id = $1"))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?
        .try_into()
}
