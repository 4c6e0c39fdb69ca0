//! Keys Module
//!
//! Deterministic cache keys: canonical call signatures, versioned namespaces
//! and the per-entity namespace combining the two.

mod entity;
mod namespace;
mod signature;


pub use entity::EntityNamespace;
pub use namespace::KeySpace;
pub use signature::{CallArgs, Signature};
