//! Allow-lists and deny-list used by the sanitizer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Tags whose whole subtree is dropped, whatever the allow-list says.
pub const DEFAULT_IGNORED_TAGS: &[&str] = &[
    "title", "script", "style", "iframe", "frame", "frameset", "noframes", "noembed", "embed",
    "applet", "object",
];

/// Tags re-emitted by default.
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "div", "span", "hr", "p", "br", "b", "i", "ol", "ul", "li",
    "strong", "em", "a", "img",
];

/// Attribute names kept on allowed tags by default.
pub const DEFAULT_ALLOWED_ATTRIBUTES: &[&str] =
    &["id", "class", "src", "title", "alt", "name", "rel", "href"];

/// The three name sets a sanitizer filters with.
///
/// Names are compared against the lowercased names produced by the tokenizer,
/// so entries should be lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    allowed_tags: HashSet<String>,
    allowed_attributes: HashSet<String>,
    ignored_tags: HashSet<String>,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            allowed_tags: to_set(DEFAULT_ALLOWED_TAGS),
            allowed_attributes: to_set(DEFAULT_ALLOWED_ATTRIBUTES),
            ignored_tags: to_set(DEFAULT_IGNORED_TAGS),
        }
    }
}

impl SanitizePolicy {
    /// Policy that re-emits no tags and no attributes; only text survives.
    #[must_use]
    pub fn strip() -> Self {
        Self {
            allowed_tags: HashSet::new(),
            allowed_attributes: HashSet::new(),
            ignored_tags: to_set(DEFAULT_IGNORED_TAGS),
        }
    }

    /// Replace the allowed tag names.
    #[must_use]
    pub fn with_allowed_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_tags = normalize(tags);
        self
    }

    /// Replace the allowed attribute names.
    #[must_use]
    pub fn with_allowed_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_attributes = normalize(attributes);
        self
    }

    /// Replace the deny-list of tags whose subtree is suppressed.
    #[must_use]
    pub fn with_ignored_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_tags = normalize(tags);
        self
    }

    pub fn allows_tag(&self, name: &str) -> bool {
        self.allowed_tags.contains(name)
    }

    pub fn allows_attribute(&self, name: &str) -> bool {
        self.allowed_attributes.contains(name)
    }

    pub fn ignores_tag(&self, name: &str) -> bool {
        self.ignored_tags.contains(name)
    }
}

/// Sanitizer section of the configuration file.
///
/// Each list that is present replaces the corresponding default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SanitizerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_tags: Option<Vec<String>>,
}

impl SanitizerConfig {
    /// Build the default policy with this configuration's overrides applied.
    #[must_use]
    pub fn to_policy(&self) -> SanitizePolicy {
        let mut policy = SanitizePolicy::default();
        if let Some(tags) = &self.allowed_tags {
            policy = policy.with_allowed_tags(tags);
        }
        if let Some(attributes) = &self.allowed_attributes {
            policy = policy.with_allowed_attributes(attributes);
        }
        if let Some(tags) = &self.ignored_tags {
            policy = policy.with_ignored_tags(tags);
        }
        policy
    }
}

fn to_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn normalize<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|name| name.as_ref().trim().to_ascii_lowercase()).collect()
}
