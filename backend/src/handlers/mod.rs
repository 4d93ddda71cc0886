//! HTTP handlers for the pharmaceutical distribution API

pub mod health;
pub mod medicine;
pub mod order;
pub mod store;
pub mod supply;
pub mod user;

pub use health::*;
pub use medicine::*;
pub use order::*;
pub use store::*;
pub use supply::*;
pub use user::*;
