//! Small cross-platform helpers.
//!
//! - [`paths`] - registry path normalization and dot-file detection

pub mod paths;

pub use paths::{is_hidden, normalize_path_for_storage};
