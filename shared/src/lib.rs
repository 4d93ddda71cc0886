//! Shared types and models for the pharmaceutical distribution platform
//!
//! This crate contains the domain model and the pure order-approval rules,
//! shared between the backend and the dashboard (via WASM).

pub mod alerts;
pub mod error;
pub mod models;
pub mod validation;

pub use alerts::*;
pub use error::*;
pub use models::*;
pub use validation::*;
