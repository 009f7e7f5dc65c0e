//! Crate-level tests that exercise several modules together.
//!
//! - `scenarios.rs`: the reference combat, queue and persistence scenarios
//!   driven through the public API
//! - `concurrency.rs`: full concurrent runs and multi-consumer stress tests
//! - `helpers.rs`: configuration and sink utilities shared by both

mod helpers;
