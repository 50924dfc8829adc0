//! Dependency-aware cache keys.
//!
//! A record's key is the hash of its path and content hash, followed by the
//! keys of its direct includes in order:
//!
//! ```text
//! key(T) = sha256(T.path + "/" + sha256(T.source)) ["-" key(D)]...
//! ```
//!
//! A key longer than the registry's maximum is replaced by its own hash, so
//! keys are bounded while still changing whenever any transitive dependency
//! changes.
//!
//! # Cycles
//!
//! Includes may form cycles. The registry groups records into include
//! components (templates that reach each other through includes), and keys
//! are folded over that acyclic component graph:
//!
//! - an include of a record in another component contributes that record's
//!   key, as above;
//! - an include of a record in the same component contributes
//!   `sha256(base(D) + "/" + digest)`, where the component digest hashes the
//!   base key of every member together with the keys of everything the
//!   members include from outside the component.
//!
//! Each key and each digest is derived once, so deriving every key in a
//! registry is linear in the number of includes. A change anywhere in a cycle
//! or below it changes the key of every member, and no key depends on the
//! order in which keys are requested.

use sha2::{Digest, Sha256};

use super::record::{TemplateId, TemplateRecord};
use super::registry::Registry;

/// Default upper bound on key length.
pub const DEFAULT_MAX_CACHE_KEY_LENGTH: usize = 250;

/// Smallest usable maximum: the length of one hex digest.
pub const MIN_CACHE_KEY_LENGTH: usize = 64;

/// Lowercase hex SHA-256 of `content`.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// The key a record has before its dependencies are folded in.
pub fn base_key(path: &str, source: &str) -> String {
    content_hash(&format!("{path}/{}", content_hash(source)))
}

impl Registry {
    /// Cache key of the record behind `id`.
    pub fn cache_key(&self, id: TemplateId) -> &str {
        let record = self.record(id);
        if let Some(key) = record.cache_key.get() {
            return key;
        }
        let key = self.derive_key(record);
        record.cache_key.get_or_init(|| key)
    }

    /// Cache key of the record registered as `path`.
    pub fn cache_key_for(&self, path: &str) -> Option<&str> {
        self.id(path).map(|id| self.cache_key(id))
    }

    fn derive_key(&self, record: &TemplateRecord) -> String {
        let mut key = base_key(record.path(), record.source());
        for &dependency in record.dependency_ids() {
            key.push('-');
            let target = self.record(dependency);
            if target.component == record.component {
                key.push_str(&self.cycle_member_key(target));
            } else {
                key.push_str(self.cache_key(dependency));
            }
        }
        self.bound_key(key)
    }

    fn cycle_member_key(&self, record: &TemplateRecord) -> String {
        let digest = self.component_digest(record);
        content_hash(&format!("{}/{digest}", base_key(record.path(), record.source())))
    }

    fn component_digest(&self, record: &TemplateRecord) -> &str {
        let component = self.component(record);
        if let Some(digest) = component.digest.get() {
            return digest;
        }

        let mut summary = String::new();
        for &member in &component.members {
            let member = self.record(member);
            summary.push_str(&base_key(member.path(), member.source()));
            for &dependency in member.dependency_ids() {
                if self.record(dependency).component != member.component {
                    summary.push('-');
                    summary.push_str(self.cache_key(dependency));
                }
            }
            summary.push('\n');
        }
        tracing::trace!(
            "Derived include cycle digest for {} template(s) around {}",
            component.members.len(),
            record.path()
        );

        let digest = content_hash(&summary);
        component.digest.get_or_init(|| digest)
    }

    fn bound_key(&self, key: String) -> String {
        if key.len() > self.max_key_length() {
            content_hash(&key)
        } else {
            key
        }
    }
}

impl TemplateRecord {
    /// The memoized key, if it has been derived yet.
    pub fn memoized_cache_key(&self) -> Option<&str> {
        self.cache_key.get().map(String::as_str)
    }
}
