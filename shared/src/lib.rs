//! Shared types and models for the crop advisor
//!
//! This crate contains the pure domain logic shared between the backend,
//! the browser client (via WASM), and other components of the system:
//! soil readings and their validation, crop candidates, prediction history
//! records and the analytics derived from them.

pub mod analytics;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
