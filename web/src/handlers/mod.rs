//! Shared HTTP handlers.

pub mod health;

pub use health::{health_check, readiness_check};
