//! Business logic services for the pharmaceutical distribution platform

pub mod medicine;
pub mod order;
pub mod permission;
pub mod store;
pub mod supply;
pub mod user;

pub use medicine::MedicineService;
pub use order::OrderService;
pub use permission::PermissionService;
pub use store::StoreService;
pub use supply::SupplyService;
pub use user::UserService;
