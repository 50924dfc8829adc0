//! Core types shared across viewscan.
//!
//! Currently this is the error taxonomy ([`ViewError`]) and the CLI-facing
//! [`ErrorContext`] used to print errors with suggestions.

pub mod error;

pub use error::{ErrorContext, ViewError, user_friendly_error};
