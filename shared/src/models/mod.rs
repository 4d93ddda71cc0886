//! Domain models for pharmaceutical distribution

mod medicine;
mod order;
mod store;
mod supply;
mod user;

pub use medicine::*;
pub use order::*;
pub use store::*;
pub use supply::*;
pub use user::*;
