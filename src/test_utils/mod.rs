//! Test utilities for viewscan
//!
//! Helpers shared by unit tests and the integration test target:
//! - [`init_test_logging`] installs a tracing subscriber once per process
//! - [`TemplateTree`] writes template files into a temporary root
//!
//! # Example
//!
//! ```rust,no_run
//! use viewscan::test_utils::TemplateTree;
//!
//! let tree = TemplateTree::new();
//! tree.write("app/views/index.html.tera", "<p>{{ title }}</p>");
//! let generation = tree.scan().unwrap();
//! assert!(generation.contains("app/views/index.html.tera"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::ViewError;
use crate::templating::{RenderSettings, Scanner, ViewGeneration, ViewSet};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, nothing is
/// installed.
///
/// ```bash
/// RUST_LOG=viewscan=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A temporary template root.
///
/// The directory is removed when the tree is dropped.
#[derive(Debug)]
pub struct TemplateTree {
    dir: TempDir,
}

impl Default for TemplateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateTree {
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary template root"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the tree.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create template directory");
        }
        fs::write(&path, content).expect("failed to write template");
        self
    }

    /// # Panics
    ///
    /// Panics if the file cannot be removed.
    pub fn remove(&self, relative: &str) -> &Self {
        fs::remove_file(self.path(relative)).expect("failed to remove template");
        self
    }

    /// A scanner over this tree with default engines.
    pub fn scanner(&self) -> Scanner {
        Scanner::new([self.root()])
    }

    /// Scan the tree as generation 1.
    ///
    /// # Errors
    ///
    /// Returns the scan error.
    pub fn scan(&self) -> Result<ViewGeneration, ViewError> {
        self.scanner().scan(1)
    }

    /// Load a view set over this tree.
    ///
    /// # Errors
    ///
    /// Returns the scan error.
    pub fn view_set(&self, production: bool) -> Result<ViewSet, ViewError> {
        let settings = RenderSettings {
            production,
            ..RenderSettings::default()
        };
        ViewSet::load(self.scanner(), settings)
    }
}
