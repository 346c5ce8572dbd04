//! HTTP handlers

pub mod health;
pub mod history;
pub mod workflow;

pub use health::*;
pub use history::*;
pub use workflow::*;
