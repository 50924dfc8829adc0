//! Integration test suite for viewscan
//!
//! End-to-end tests over real template trees on disk and the `viewscan`
//! binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scan**: discovery, engine dispatch and scan failures
//! - **cache_keys**: key stability and propagation across real trees
//! - **render**: layouts, formats, helpers and fallback pages
//! - **reload**: generation publishing under concurrent readers
//! - **cli**: the `scan`, `render` and `sanitize` commands

mod cache_keys;
mod cli;
mod reload;
mod render;
