//! The per-file unit tracked by the registry.

use std::fmt;
use std::sync::OnceLock;

use super::cache_key::content_hash;
use super::engine::FormatKind;

/// Index of a record within its [`Registry`](super::Registry).
///
/// Ids are only meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub(crate) usize);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One discovered template: its registry path, raw source, format,
/// resolved includes and memoized cache key.
///
/// Records are immutable once their registry is published. The dependency
/// list and include component are filled in by the registry's finalize pass
/// before publication and the cache key on first request.
#[derive(Debug)]
pub struct TemplateRecord {
    path: String,
    source: String,
    format: FormatKind,
    pub(crate) dependencies: Vec<TemplateId>,
    /// Index of the include component holding this record.
    pub(crate) component: usize,
    pub(crate) cache_key: OnceLock<String>,
}

impl TemplateRecord {
    pub fn new(path: impl Into<String>, source: impl Into<String>, format: FormatKind) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            format,
            dependencies: Vec::new(),
            component: 0,
            cache_key: OnceLock::new(),
        }
    }

    /// A record for an in-memory template; its path is the hash of its
    /// source.
    pub fn from_source(format: FormatKind, source: impl Into<String>) -> Self {
        let source = source.into();
        Self::new(content_hash(&source), source, format)
    }

    /// Root-relative path with `/` separators.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File content exactly as read.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn format(&self) -> FormatKind {
        self.format
    }

    /// Ids of included templates, in order of appearance in the source.
    pub fn dependency_ids(&self) -> &[TemplateId] {
        &self.dependencies
    }
}
