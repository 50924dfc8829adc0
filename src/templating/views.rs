//! Published generations and hot reload.
//!
//! A [`ViewGeneration`] pairs the registry produced by one scan with the
//! namespaces compiled from the same files. The [`ViewSet`] owns the current
//! generation behind a single swappable `Arc`: a reload builds a complete
//! new generation off to the side and replaces the pointer under a short
//! write lock, so a reader holds either the whole old generation or the whole
//! new one. Readers that already cloned the old `Arc` keep rendering from it
//! until they drop it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tera::Context;

use super::engine::{FormatKind, Namespace};
use super::record::TemplateRecord;
use super::registry::Registry;
use super::renderer::RenderSettings;
use super::scanner::Scanner;
use crate::config::ViewConfig;
use crate::core::ViewError;

/// The output of one successful scan.
#[derive(Debug)]
pub struct ViewGeneration {
    number: u64,
    registry: Registry,
    namespaces: BTreeMap<FormatKind, Namespace>,
}

impl ViewGeneration {
    pub(crate) fn new(number: u64, registry: Registry, namespaces: BTreeMap<FormatKind, Namespace>) -> Self {
        Self {
            number,
            registry,
            namespaces,
        }
    }

    /// Sequence number; each published reload increments it.
    pub const fn number(&self) -> u64 {
        self.number
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.registry.contains(path)
    }

    /// # Errors
    ///
    /// Returns [`ViewError::TemplateNotFound`] with a suggestion when `path`
    /// is not registered.
    pub fn lookup(&self, path: &str) -> Result<&TemplateRecord, ViewError> {
        self.registry.lookup(path)
    }

    pub fn cache_key(&self, path: &str) -> Option<&str> {
        self.registry.cache_key_for(path)
    }

    /// Render the template registered as `path` in its own format's
    /// namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateNotFound`] for an unknown path and
    /// [`ViewError::RenderExecution`] when the template fails.
    pub fn execute(&self, path: &str, context: &Context) -> Result<String, ViewError> {
        let record = self.lookup(path)?;
        let namespace = self.namespaces.get(&record.format()).ok_or_else(|| ViewError::TemplateNotFound {
            path: path.to_string(),
            suggestion: None,
        })?;
        namespace.execute(path, context)
    }
}

/// The live set of views.
#[derive(Debug)]
pub struct ViewSet {
    scanner: Scanner,
    settings: RenderSettings,
    current: RwLock<Arc<ViewGeneration>>,
    reload_lock: Mutex<()>,
}

impl ViewSet {
    /// Run the first scan and publish it as generation 1.
    ///
    /// # Errors
    ///
    /// Returns the scan error if the first scan fails.
    pub fn load(scanner: Scanner, settings: RenderSettings) -> Result<Self, ViewError> {
        let generation = scanner.scan(1)?;
        tracing::info!(
            "Loaded {} template(s) as view generation {}",
            generation.len(),
            generation.number()
        );
        Ok(Self {
            scanner,
            settings,
            current: RwLock::new(Arc::new(generation)),
            reload_lock: Mutex::new(()),
        })
    }

    /// Build the scanner and settings described by `config` and load.
    ///
    /// # Errors
    ///
    /// Returns the scan error if the first scan fails.
    pub fn from_config(config: &ViewConfig) -> Result<Self, ViewError> {
        Self::load(Scanner::from_config(config), config.render_settings())
    }

    pub const fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub const fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// The generation currently published.
    pub fn current(&self) -> Arc<ViewGeneration> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Rescan and publish the result.
    ///
    /// Concurrent reloads are serialized. On failure the previous generation
    /// stays published and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the scan error.
    pub fn reload(&self) -> Result<Arc<ViewGeneration>, ViewError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let number = self.current().number() + 1;
        let generation = Arc::new(self.scanner.scan(number)?);

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&generation);
        tracing::info!(
            "Published view generation {} with {} template(s)",
            generation.number(),
            generation.len()
        );
        Ok(generation)
    }

    /// The generation a render should use.
    ///
    /// Outside production mode this reloads first. A failed reload is
    /// logged and returned together with the still-published generation.
    pub fn refresh_for_render(&self) -> (Arc<ViewGeneration>, Option<ViewError>) {
        if self.settings.production {
            return (self.current(), None);
        }

        tracing::debug!("Reloading templates in development mode");
        match self.reload() {
            Ok(generation) => (generation, None),
            Err(e) => {
                tracing::error!("Template reload failed: {}", e);
                (self.current(), Some(e))
            }
        }
    }
}
