//! viewscan - template discovery, dependency-aware cache keys and rendering
//!
//! viewscan scans directories of view templates, registers each file under its
//! root-relative path, tracks which templates include which, and derives a
//! cache key per template that changes whenever the template or anything it
//! includes changes. Templates are rendered with tera into layouts, with
//! error and status pages as fallbacks, and untrusted markup can be filtered
//! through an allow-list sanitizer.
//!
//! # Architecture Overview
//!
//! - A scan walks the configured roots and offers every file to the format
//!   engines (data, markup, text) in priority order. The first engine whose
//!   suffix matches claims the file.
//! - Claimed files become records in a registry and templates in their
//!   format's namespace. Include directives are resolved against the full
//!   registry once every root is walked.
//! - The registry and namespaces of one scan form a generation. A reload
//!   builds a new generation and swaps it in atomically; a failed reload
//!   leaves the old generation in place.
//!
//! # Core Modules
//!
//! - [`templating`] - Scanner, registry, cache keys, view set and renderer
//! - [`sanitize`] - Allow-list markup sanitizer
//! - [`config`] - `viewscan.toml` loading and validation
//! - [`core`] - Error types and user-facing error formatting
//! - [`cli`] - Command-line interface
//! - [`utils`] - Path helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use viewscan::config::ViewConfig;
//! use viewscan::templating::{Renderer, ViewSet};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = ViewConfig::load_with_optional(None)?;
//! let views = ViewSet::from_config(&config)?;
//!
//! let generation = views.current();
//! for path in generation.registry().paths() {
//!     println!("{path} {}", generation.cache_key(path).unwrap_or_default());
//! }
//!
//! let page = Renderer::new(&views, "/posts/1").insert("id", &1).render();
//! println!("{}", page.body);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod sanitize;
pub mod templating;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
