//! Application services: the resolution chain and the normalizers it feeds.

pub mod archive;
pub mod error;
pub mod event;
mod loose;
pub mod resolver;
pub mod schedule;
pub mod service;
pub mod storage;
