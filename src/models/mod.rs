//! Models for the lookup service
//!
//! The record type it caches and the DTOs used for HTTP response bodies.

pub mod record;
pub mod responses;

// Re-export commonly used types
pub use record::Record;
pub use responses::{ErrorResponse, HealthResponse, StatsResponse, WarmResponse};
