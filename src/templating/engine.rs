//! Format engines and their template namespaces.
//!
//! A [`FormatEngine`] decides which files belong to a format by suffix. Each
//! format owns one [`Namespace`] per scan: a `tera::Tera` instance holding
//! every template of that format, so that includes and layout inheritance
//! resolve by registry path within the format.
//!
//! Engines are tried in a caller-supplied order and the first that claims a
//! file wins, so stricter suffixes must come before catch-all ones.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tera::{Context, Tera};

use super::dependencies::rewrite_includes;
use super::filters::TemplateHelpers;
use crate::core::ViewError;
use crate::utils::is_hidden;

/// The output dialects templates can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// HTML pages and fragments; output is auto-escaped.
    Markup,
    /// JSON and other structured data.
    Data,
    /// Plain text and CSV.
    Text,
}

impl FormatKind {
    pub const ALL: [Self; 3] = [Self::Markup, Self::Data, Self::Text];

    /// Suffixes claimed by this format when none are configured.
    pub fn default_suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Markup => &[".html.tera"],
            Self::Data => &[".json.tera"],
            Self::Text => &[".text.tera", ".csv.tera"],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Data => "data",
            Self::Text => "text",
        }
    }

    /// Create an empty namespace for this format with the helpers registered.
    pub fn new_namespace(self, helpers: &TemplateHelpers) -> Namespace {
        let mut tera = Tera::default();
        match self {
            // Every template in the markup namespace is escaped, whatever
            // suffix the configuration gave it.
            Self::Markup => tera.autoescape_on(vec![""]),
            Self::Data | Self::Text => tera.autoescape_on(Vec::new()),
        }
        helpers.register(&mut tera);

        Namespace {
            kind: self,
            tera,
            names: HashSet::new(),
            pending: Vec::new(),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Suffix-based file claim for one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEngine {
    kind: FormatKind,
    suffixes: Vec<String>,
}

impl FormatEngine {
    /// Engine for `kind` claiming the format's default suffixes.
    pub fn new(kind: FormatKind) -> Self {
        Self::with_suffixes(kind, kind.default_suffixes().iter().copied())
    }

    pub fn with_suffixes<I, S>(kind: FormatKind, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn markup() -> Self {
        Self::new(FormatKind::Markup)
    }

    pub fn data() -> Self {
        Self::new(FormatKind::Data)
    }

    pub fn text() -> Self {
        Self::new(FormatKind::Text)
    }

    pub const fn kind(&self) -> FormatKind {
        self.kind
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Whether this engine claims the file at `path`. Dot files are never
    /// claimed.
    pub fn can_handle(&self, path: &str) -> bool {
        !is_hidden(path) && self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}

/// Default engine priority: data, markup, text.
pub fn default_engines() -> Vec<FormatEngine> {
    vec![FormatEngine::data(), FormatEngine::markup(), FormatEngine::text()]
}

/// The templates registered for one format during one scan.
///
/// Registration only captures text; [`Namespace::finish`] hands all captured
/// sources to tera at once so inheritance parents may be registered after
/// their children.
pub struct Namespace {
    kind: FormatKind,
    tera: Tera,
    names: HashSet<String>,
    pending: Vec<(String, String)>,
}

impl Namespace {
    pub const fn kind(&self) -> FormatKind {
        self.kind
    }

    pub fn contains(&self, path: &str) -> bool {
        self.names.contains(path)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Capture `source` under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::DuplicateTemplate`] if `path` was already
    /// registered in this namespace.
    pub fn register(&mut self, path: &str, source: &str) -> Result<(), ViewError> {
        if !self.names.insert(path.to_string()) {
            return Err(ViewError::DuplicateTemplate {
                path: path.to_string(),
            });
        }
        self.pending.push((path.to_string(), rewrite_includes(source).into_owned()));
        Ok(())
    }

    /// Parse every captured source.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateParse`] with tera's message (which names
    /// the offending template) if any source is not a valid template.
    pub fn finish(&mut self) -> Result<(), ViewError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        tracing::debug!("Parsing {} {} template(s)", pending.len(), self.kind);

        self.tera.add_raw_templates(pending).map_err(|e| ViewError::TemplateParse {
            format: self.kind,
            message: describe_tera_error(&e),
        })
    }

    /// Render the template registered as `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateNotFound`] if the path is not part of this
    /// namespace and [`ViewError::RenderExecution`] if tera fails.
    pub fn execute(&self, path: &str, context: &Context) -> Result<String, ViewError> {
        if !self.contains(path) {
            return Err(ViewError::TemplateNotFound {
                path: path.to_string(),
                suggestion: None,
            });
        }
        self.tera.render(path, context).map_err(|e| ViewError::RenderExecution {
            path: path.to_string(),
            message: describe_tera_error(&e),
        })
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("kind", &self.kind)
            .field("templates", &self.names.len())
            .finish_non_exhaustive()
    }
}

/// Flatten a tera error and its causes into one line.
///
/// Tera's top-level message is usually just "Failed to render 'x'"; the
/// useful part is further down the source chain.
pub(crate) fn describe_tera_error(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
