//! services/site/src/lib.rs
//!
//! The Meadowlark Travel site as a library, so the binaries and the
//! integration tests share one application builder.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
