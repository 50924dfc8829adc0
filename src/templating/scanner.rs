//! Template discovery.
//!
//! The [`Scanner`] walks its roots, offers each file to the format engines in
//! priority order and feeds claimed files into a [`GenerationBuilder`]. The
//! builder can also be driven directly with in-memory sources.
//!
//! A scan either produces a complete [`ViewGeneration`] or fails as a whole;
//! nothing is published from a failed scan.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::cache_key::{DEFAULT_MAX_CACHE_KEY_LENGTH, content_hash};
use super::engine::{FormatEngine, FormatKind, Namespace, default_engines};
use super::filters::TemplateHelpers;
use super::record::TemplateRecord;
use super::registry::RegistryBuilder;
use super::views::ViewGeneration;
use crate::core::ViewError;
use crate::utils::normalize_path_for_storage;

/// Accumulates one generation's records and namespaces.
#[derive(Debug)]
pub struct GenerationBuilder {
    engines: Vec<FormatEngine>,
    helpers: TemplateHelpers,
    namespaces: BTreeMap<FormatKind, Namespace>,
    registry: RegistryBuilder,
}

impl GenerationBuilder {
    pub fn new(engines: Vec<FormatEngine>, helpers: TemplateHelpers, max_key_length: usize) -> Self {
        Self {
            engines,
            helpers,
            namespaces: BTreeMap::new(),
            registry: RegistryBuilder::new(max_key_length),
        }
    }

    /// The first engine claiming `path`, in priority order.
    pub fn engine_for(&self, path: &str) -> Option<&FormatEngine> {
        self.engines.iter().find(|engine| engine.can_handle(path))
    }

    /// Register `source` under `path` with whichever engine claims it.
    ///
    /// Returns the claiming format, or `None` if no engine claims the path.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::DuplicateTemplate`] if `path` is already
    /// registered.
    pub fn add_template(&mut self, path: &str, source: &str) -> Result<Option<FormatKind>, ViewError> {
        let Some(kind) = self.engine_for(path).map(FormatEngine::kind) else {
            tracing::trace!("No engine claims {}", path);
            return Ok(None);
        };
        self.add_template_as(kind, path, source)?;
        Ok(Some(kind))
    }

    /// Register `source` under `path` in the namespace of `kind`, bypassing
    /// suffix dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::DuplicateTemplate`] if `path` is already
    /// registered in any format.
    pub fn add_template_as(&mut self, kind: FormatKind, path: &str, source: &str) -> Result<(), ViewError> {
        self.registry.insert(TemplateRecord::new(path, source, kind))?;

        let helpers = &self.helpers;
        self.namespaces
            .entry(kind)
            .or_insert_with(|| kind.new_namespace(helpers))
            .register(path, source)?;

        tracing::trace!("Registered {} template {}", kind, path);
        Ok(())
    }

    /// Register an in-memory template under the hash of its source and
    /// return that path.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::DuplicateTemplate`] if the same source was
    /// already added.
    pub fn add_source(&mut self, kind: FormatKind, source: &str) -> Result<String, ViewError> {
        let path = content_hash(source);
        self.add_template_as(kind, &path, source)?;
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Parse every namespace, resolve includes and seal the generation.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateParse`] if any namespace holds an
    /// invalid template.
    pub fn finish(mut self, number: u64) -> Result<ViewGeneration, ViewError> {
        for namespace in self.namespaces.values_mut() {
            namespace.finish()?;
        }
        let registry = self.registry.finalize();
        Ok(ViewGeneration::new(number, registry, self.namespaces))
    }
}

/// Walks template roots and builds generations from them.
#[derive(Debug, Clone)]
pub struct Scanner {
    roots: Vec<PathBuf>,
    engines: Vec<FormatEngine>,
    helpers: TemplateHelpers,
    max_key_length: usize,
}

impl Scanner {
    /// Scanner over `roots` with the default engines and helpers.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            engines: default_engines(),
            helpers: TemplateHelpers::default(),
            max_key_length: DEFAULT_MAX_CACHE_KEY_LENGTH,
        }
    }

    /// Replace the engines; earlier engines take priority.
    #[must_use]
    pub fn with_engines(mut self, engines: Vec<FormatEngine>) -> Self {
        self.engines = engines;
        self
    }

    #[must_use]
    pub fn with_helpers(mut self, helpers: TemplateHelpers) -> Self {
        self.helpers = helpers;
        self
    }

    #[must_use]
    pub fn with_max_cache_key_length(mut self, max: usize) -> Self {
        self.max_key_length = max;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn engines(&self) -> &[FormatEngine] {
        &self.engines
    }

    pub const fn helpers(&self) -> &TemplateHelpers {
        &self.helpers
    }

    /// An empty builder configured like this scanner.
    pub fn builder(&self) -> GenerationBuilder {
        GenerationBuilder::new(self.engines.clone(), self.helpers.clone(), self.max_key_length)
    }

    /// Scan every root and build generation `number`.
    ///
    /// # Errors
    ///
    /// Fails on a missing or unreadable root or file, a registry path seen
    /// twice, or a template the engine cannot parse.
    pub fn scan(&self, number: u64) -> Result<ViewGeneration, ViewError> {
        let mut builder = self.builder();
        for root in &self.roots {
            scan_root(root, &mut builder)?;
        }
        tracing::debug!("Scanned {} template(s) from {} root(s)", builder.len(), self.roots.len());
        builder.finish(number)
    }
}

fn scan_root(root: &Path, builder: &mut GenerationBuilder) -> Result<(), ViewError> {
    let metadata = fs::metadata(root).map_err(|source| ViewError::ScanIo {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ViewError::ScanIo {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotADirectory, "template root is not a directory"),
        });
    }

    tracing::debug!("Scanning templates under {}", root.display());

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|source| ViewError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_path = entry.path();
        let relative = normalize_path_for_storage(file_path.strip_prefix(root).unwrap_or(file_path));
        let Some(kind) = builder.engine_for(&relative).map(FormatEngine::kind) else {
            tracing::trace!("Skipping unclaimed file {}", relative);
            continue;
        };

        let source = fs::read_to_string(file_path).map_err(|source| ViewError::ScanIo {
            path: file_path.to_path_buf(),
            source,
        })?;
        builder.add_template_as(kind, &relative, &source)?;
    }

    Ok(())
}
