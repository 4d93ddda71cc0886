//! Order workflow against a real PostgreSQL database
//!
//! Ignored by default. Run with a disposable database:
//!
//! ```text
//! PHARMA__DATABASE__URL=postgres://... cargo test -p pharma-distribution-backend -- --ignored
//! ```

use std::collections::BTreeSet;

use chrono::NaiveDate;
use pharma_backend::error::AppError;
use pharma_backend::services::medicine::CreateMedicineInput;
use pharma_backend::services::order::{CreateOrderInput, OrderDecisionInput};
use pharma_backend::services::store::CreateStoreInput;
use pharma_backend::services::supply::RecordSupplyInput;
use pharma_backend::services::user::CreateUserInput;
use pharma_backend::services::{
    MedicineService, OrderService, PermissionService, StoreService, SupplyService, UserService,
};
use rust_decimal::Decimal;
use shared::{Capability, OrderStatus, User, UserRole};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> PgPool {
    let url = std::env::var("PHARMA__DATABASE__URL")
        .expect("PHARMA__DATABASE__URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("connect");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
    pool
}

async fn user(db: &PgPool, role: UserRole, capabilities: &[Capability]) -> User {
    let tag = Uuid::new_v4();
    UserService::new(db.clone())
        .create(CreateUserInput {
            name: format!("user-{}", tag),
            email: format!("{}@example.test", tag),
            role,
            capabilities: capabilities.iter().copied().collect::<BTreeSet<_>>(),
        })
        .await
        .unwrap()
}

async fn medicine(db: &PgPool, stock: i32) -> Uuid {
    MedicineService::new(db.clone())
        .create(CreateMedicineInput {
            name: format!("Amoxicillin {}", Uuid::new_v4()),
            company: "Acme Pharma".to_string(),
            manufacture_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            price: Decimal::new(1250, 2),
            stock_quantity: stock,
            minimum_stock: 5,
        })
        .await
        .unwrap()
        .id
}

async fn store(db: &PgPool) -> Uuid {
    StoreService::new(db.clone())
        .create(CreateStoreInput {
            name: "Corner Pharmacy".to_string(),
            address: "12 Main Street".to_string(),
            phone: Some("+1 555 0100".to_string()),
            license_number: None,
        })
        .await
        .unwrap()
        .id
}

async fn stock_of(db: &PgPool, medicine_id: Uuid) -> i32 {
    MedicineService::new(db.clone())
        .get(medicine_id)
        .await
        .unwrap()
        .stock_quantity
}

fn decision(approver_id: Uuid) -> OrderDecisionInput {
    OrderDecisionInput {
        approver_id,
        notes: None,
    }
}

#[tokio::test]
#[ignore]
async fn approve_then_deliver() {
    let db = pool().await;
    let admin = user(&db, UserRole::Admin, &[]).await;
    let medicine_id = medicine(&db, 100).await;
    let store_id = store(&db).await;
    let orders = OrderService::new(db.clone());

    let order = orders
        .create(
            admin.id,
            CreateOrderInput {
                medicine_id,
                store_id,
                quantity: 30,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(order.order.status, OrderStatus::Pending);

    let approved = orders.approve(order.order.id, decision(admin.id)).await.unwrap();
    assert_eq!(approved.order.status, OrderStatus::Approved);
    assert_eq!(approved.medicine.stock_quantity, 70);
    assert_eq!(stock_of(&db, medicine_id).await, 70);

    let again = orders.approve(order.order.id, decision(admin.id)).await;
    assert!(matches!(again, Err(AppError::InvalidState(_))));
    assert_eq!(stock_of(&db, medicine_id).await, 70);

    let delivered = orders.mark_delivered(order.order.id).await.unwrap();
    assert_eq!(delivered.order.status, OrderStatus::Approved);
    assert!(delivered.order.delivered_at.is_some());
    assert!(matches!(
        orders.mark_delivered(order.order.id).await,
        Err(AppError::AlreadyDelivered)
    ));
}

#[tokio::test]
#[ignore]
async fn shortfall_and_permission_leave_order_pending() {
    let db = pool().await;
    let clerk = user(&db, UserRole::Employee, &[Capability::ManageInventory]).await;
    let admin = user(&db, UserRole::Admin, &[]).await;
    let medicine_id = medicine(&db, 10).await;
    let store_id = store(&db).await;
    let orders = OrderService::new(db.clone());

    let order = orders
        .create(
            clerk.id,
            CreateOrderInput {
                medicine_id,
                store_id,
                quantity: 20,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert!(!PermissionService::new(db.clone()).can_approve(clerk.id).await.unwrap());
    assert!(matches!(
        orders.approve(order.order.id, decision(clerk.id)).await,
        Err(AppError::PermissionDenied(_))
    ));
    assert!(matches!(
        orders.approve(order.order.id, decision(admin.id)).await,
        Err(AppError::InsufficientStock {
            available: 10,
            requested: 20
        })
    ));

    let unchanged = orders.get(order.order.id).await.unwrap();
    assert_eq!(unchanged.order.status, OrderStatus::Pending);
    assert_eq!(stock_of(&db, medicine_id).await, 10);
}

#[tokio::test]
#[ignore]
async fn order_for_missing_store_is_not_found() {
    let db = pool().await;
    let admin = user(&db, UserRole::Admin, &[]).await;
    let medicine_id = medicine(&db, 10).await;

    let result = OrderService::new(db.clone())
        .create(
            admin.id,
            CreateOrderInput {
                medicine_id,
                store_id: Uuid::new_v4(),
                quantity: 1,
                notes: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(ref what)) if what == "Store"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_approvals_never_oversell() {
    let db = pool().await;
    let approver = user(&db, UserRole::Employee, &[Capability::ApproveOrders]).await;
    let medicine_id = medicine(&db, 50).await;
    let store_id = store(&db).await;
    let orders = OrderService::new(db.clone());

    let mut ids = Vec::new();
    for _ in 0..12 {
        let order = orders
            .create(
                approver.id,
                CreateOrderInput {
                    medicine_id,
                    store_id,
                    quantity: 7,
                    notes: None,
                },
            )
            .await
            .unwrap();
        ids.push(order.order.id);
    }

    // Every order approved twice, all at once
    let handles: Vec<_> = ids
        .iter()
        .chain(ids.iter())
        .map(|&id| {
            let orders = orders.clone();
            let approver_id = approver.id;
            tokio::spawn(async move { orders.approve(id, decision(approver_id)).await })
        })
        .collect();

    let mut approved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => approved += 1,
            Err(AppError::InvalidState(_)) | Err(AppError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(approved, 7);
    assert_eq!(stock_of(&db, medicine_id).await, 50 - 7 * 7);
}

#[tokio::test]
#[ignore]
async fn supply_restocks_under_lock() {
    let db = pool().await;
    let keeper = user(&db, UserRole::Employee, &[Capability::ManageInventory]).await;
    let medicine_id = medicine(&db, 3).await;
    let actor = PermissionService::new(db.clone()).resolve(keeper.id).await.unwrap();

    let supply = SupplyService::new(db.clone())
        .record_supply(
            &actor,
            RecordSupplyInput {
                medicine_id,
                supplier_name: "MedSource".to_string(),
                quantity: 40,
                unit_cost: Decimal::new(500, 2),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(supply.total_cost, Decimal::new(20000, 2));
    assert_eq!(stock_of(&db, medicine_id).await, 43);
}
