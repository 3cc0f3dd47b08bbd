//! Domain layer types and invariants.

pub mod error;
pub mod event;
pub mod ids;
pub mod schedule;
