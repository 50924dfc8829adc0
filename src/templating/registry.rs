//! The path-indexed set of template records produced by one scan.
//!
//! A registry is assembled by a [`RegistryBuilder`]: records are inserted one
//! per file, then [`RegistryBuilder::finalize`] resolves every record's
//! include directives against the complete set and groups records into
//! include components: sets of templates that reach each other through
//! includes. Only the finalized [`Registry`] is ever handed out, so no reader
//! sees records whose dependency lists are still empty.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::cache_key::{DEFAULT_MAX_CACHE_KEY_LENGTH, MIN_CACHE_KEY_LENGTH};
use super::dependencies::extract_includes;
use super::record::{TemplateId, TemplateRecord};
use crate::core::ViewError;

/// Maximum Levenshtein distance, as a percentage of the requested path's
/// length, for a registered path to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Collects records during a scan.
#[derive(Debug)]
pub struct RegistryBuilder {
    records: Vec<TemplateRecord>,
    index: HashMap<String, TemplateId>,
    max_key_length: usize,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_KEY_LENGTH)
    }
}

impl RegistryBuilder {
    pub fn new(max_key_length: usize) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            max_key_length: max_key_length.max(MIN_CACHE_KEY_LENGTH),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a record.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::DuplicateTemplate`] if a record with the same path
    /// was already inserted, whatever its format.
    pub fn insert(&mut self, record: TemplateRecord) -> Result<TemplateId, ViewError> {
        if self.index.contains_key(record.path()) {
            return Err(ViewError::DuplicateTemplate {
                path: record.path().to_string(),
            });
        }
        let id = TemplateId(self.records.len());
        self.index.insert(record.path().to_string(), id);
        self.records.push(record);
        Ok(id)
    }

    /// Resolve every record's includes and produce the registry.
    ///
    /// Includes naming paths that are not in the registry are dropped from
    /// the dependency list; executing them still fails.
    pub fn finalize(mut self) -> Registry {
        let resolved: Vec<Vec<TemplateId>> = self
            .records
            .iter()
            .map(|record| {
                extract_includes(record.source())
                    .into_iter()
                    .filter_map(|path| {
                        let id = self.index.get(&path).copied();
                        if id.is_none() {
                            tracing::trace!(
                                "Dropping include of unknown template {} from {}",
                                path,
                                record.path()
                            );
                        }
                        id
                    })
                    .collect()
            })
            .collect();

        for (record, dependencies) in self.records.iter_mut().zip(resolved) {
            record.dependencies = dependencies;
        }

        let components: Vec<IncludeComponent> = include_components(&self.records)
            .into_iter()
            .map(|mut members| {
                members.sort_by(|a, b| self.records[a.0].path().cmp(self.records[b.0].path()));
                IncludeComponent {
                    members,
                    digest: OnceLock::new(),
                }
            })
            .collect();

        for (index, component) in components.iter().enumerate() {
            for member in &component.members {
                self.records[member.0].component = index;
            }
            if component.is_cycle(&self.records) {
                let paths: Vec<&str> = component.members.iter().map(|id| self.records[id.0].path()).collect();
                tracing::debug!("Include cycle between {}", paths.join(", "));
            }
        }

        Registry {
            records: self.records,
            index: self.index,
            components,
            max_key_length: self.max_key_length,
        }
    }
}

/// A strongly connected set of records in the include graph.
///
/// Every record is in exactly one component. A component of one record that
/// does not include itself is an ordinary acyclic node.
#[derive(Debug)]
pub(crate) struct IncludeComponent {
    /// Members sorted by path.
    pub(crate) members: Vec<TemplateId>,
    /// Summary hash over the members and everything they include from
    /// outside the component, derived on first use.
    pub(crate) digest: OnceLock<String>,
}

impl IncludeComponent {
    fn is_cycle(&self, records: &[TemplateRecord]) -> bool {
        match self.members.as_slice() {
            [single] => records[single.0].dependency_ids().contains(single),
            _ => true,
        }
    }
}

/// Strongly connected components of the include graph, each emitted after
/// every component it includes.
fn include_components(records: &[TemplateRecord]) -> Vec<Vec<TemplateId>> {
    let mut graph: DiGraph<TemplateId, ()> = DiGraph::with_capacity(records.len(), 0);
    let nodes: Vec<NodeIndex> = (0..records.len()).map(|i| graph.add_node(TemplateId(i))).collect();
    for (node, record) in nodes.iter().zip(records) {
        for dependency in record.dependency_ids() {
            graph.add_edge(*node, nodes[dependency.0], ());
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .map(|component| component.into_iter().map(|node| graph[node]).collect())
        .collect()
}

/// Finalized, read-only mapping from registry path to record.
#[derive(Debug)]
pub struct Registry {
    pub(crate) records: Vec<TemplateRecord>,
    index: HashMap<String, TemplateId>,
    pub(crate) components: Vec<IncludeComponent>,
    pub(crate) max_key_length: usize,
}

impl Registry {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn id(&self, path: &str) -> Option<TemplateId> {
        self.index.get(path).copied()
    }

    pub fn get(&self, path: &str) -> Option<&TemplateRecord> {
        self.id(path).map(|id| self.record(id))
    }

    /// The record behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different registry with more records.
    pub fn record(&self, id: TemplateId) -> &TemplateRecord {
        &self.records[id.0]
    }

    /// Look up `path`, suggesting the closest registered path on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateNotFound`] if `path` is not registered.
    pub fn lookup(&self, path: &str) -> Result<&TemplateRecord, ViewError> {
        self.get(path).ok_or_else(|| ViewError::TemplateNotFound {
            path: path.to_string(),
            suggestion: self.closest_path(path).map(str::to_string),
        })
    }

    /// Records in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &TemplateRecord)> {
        self.records.iter().enumerate().map(|(i, record)| (TemplateId(i), record))
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.index.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Direct dependencies of `record`, in include order.
    pub fn dependencies<'a>(
        &'a self,
        record: &'a TemplateRecord,
    ) -> impl Iterator<Item = &'a TemplateRecord> + 'a {
        record.dependency_ids().iter().map(|id| self.record(*id))
    }

    /// Whether `record` includes itself, directly or through other templates.
    pub fn in_cycle(&self, record: &TemplateRecord) -> bool {
        self.components[record.component].is_cycle(&self.records)
    }

    pub(crate) fn component(&self, record: &TemplateRecord) -> &IncludeComponent {
        &self.components[record.component]
    }

    pub const fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    fn closest_path(&self, path: &str) -> Option<&str> {
        let threshold = path.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
        self.index
            .keys()
            .map(|candidate| (strsim::levenshtein(path, candidate), candidate))
            .filter(|(distance, _)| *distance <= threshold)
            .min()
            .map(|(_, candidate)| candidate.as_str())
    }
}
