//! services/site/src/web/handlers/mod.rs
//!
//! Route handlers, grouped by page family.

pub mod contest;
pub mod diagnostics;
pub mod newsletter;
pub mod pages;
