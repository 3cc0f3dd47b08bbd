//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod object_store;
pub mod telemetry;
