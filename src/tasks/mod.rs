//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry Cleanup: Removes expired entries from the in-memory cache backend

mod cleanup;

pub use cleanup::spawn_cleanup_task;
