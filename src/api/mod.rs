//! API Module
//!
//! HTTP handlers and routing for the record lookup service.
//!
//! # Endpoints
//! - `GET /records/:id` - Record by primary key
//! - `GET /records/by-slug/:slug` - Record by slug
//! - `POST /warm` - Rebuild the table index
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
