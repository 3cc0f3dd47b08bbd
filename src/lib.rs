//! Fairway: tiered resolution and schema normalization for golf tournament data.
//!
//! Raw upstream payloads flow through a cache → archive → live-fetch chain and are
//! normalized into one canonical event and schedule contract on every read.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
