//! Configuration for viewscan.
//!
//! Settings are read from a TOML file, `viewscan.toml` in the working
//! directory by default. The location can be changed with `--config` or the
//! `VIEWSCAN_CONFIG` environment variable. Every field is optional.
//!
//! ```toml
//! # Directories scanned for templates, relative to this file
//! roots = ["src"]
//!
//! # Hide error details and skip reloading before each render
//! production = false
//!
//! # Longest cache key kept verbatim before it is replaced by its hash
//! max_cache_key_length = 250
//!
//! default_layout = "app/views/layout.html.tera"
//! error_template = "app/views/500.html.tera"
//! status_template_dir = "app/views"
//!
//! # Engines in priority order; the first whose suffix matches claims a file
//! [[engines]]
//! kind = "data"
//! suffixes = [".json.tera"]
//!
//! [[engines]]
//! kind = "markup"
//!
//! # Each list replaces the corresponding default
//! [sanitizer]
//! allowed_tags = ["p", "a", "em"]
//! allowed_attributes = ["href"]
//! ignored_tags = ["script", "style"]
//! ```
//!
//! A missing default file means defaults. An empty `default_layout` disables
//! the default layout.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::ViewError;
use crate::sanitize::{SanitizePolicy, SanitizerConfig};
use crate::templating::{
    DEFAULT_MAX_CACHE_KEY_LENGTH, FormatEngine, FormatKind, MIN_CACHE_KEY_LENGTH, RenderSettings,
    Scanner, TemplateHelpers, default_engines,
};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "viewscan.toml";

/// One `[[engines]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    pub kind: FormatKind,
    /// Suffixes claimed by the engine; the format's defaults when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffixes: Option<Vec<String>>,
}

impl EngineConfig {
    pub fn to_engine(&self) -> FormatEngine {
        match &self.suffixes {
            Some(suffixes) => FormatEngine::with_suffixes(self.kind, suffixes.iter().cloned()),
            None => FormatEngine::new(self.kind),
        }
    }
}

/// Contents of `viewscan.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub roots: Vec<PathBuf>,
    pub production: bool,
    pub max_cache_key_length: usize,
    pub default_layout: Option<String>,
    pub error_template: String,
    pub status_template_dir: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub engines: Vec<EngineConfig>,
    pub sanitizer: SanitizerConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        let settings = RenderSettings::default();
        Self {
            roots: vec![PathBuf::from("src")],
            production: settings.production,
            max_cache_key_length: DEFAULT_MAX_CACHE_KEY_LENGTH,
            default_layout: settings.default_layout,
            error_template: settings.error_template,
            status_template_dir: settings.status_template_dir,
            engines: Vec::new(),
            sanitizer: SanitizerConfig::default(),
        }
    }
}

impl ViewConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when `path` is
    /// `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// fails [`ViewConfig::validate`].
    pub fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(&path),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load from a specific file. Relative roots are resolved against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or
    /// fails [`ViewConfig::validate`].
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ViewError::Config {
            message: format!("{}: {}", path.display(), e.message()),
        })?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.roots = config
                .roots
                .into_iter()
                .map(|root| if root.is_relative() { base.join(root) } else { root })
                .collect();
        }

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Config`] for an empty root list, a key length
    /// below one digest, or an engine with no suffixes.
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.roots.is_empty() {
            return Err(config_error("at least one template root is required"));
        }
        if self.max_cache_key_length < MIN_CACHE_KEY_LENGTH {
            return Err(config_error(format!(
                "max_cache_key_length must be at least {MIN_CACHE_KEY_LENGTH}, got {}",
                self.max_cache_key_length
            )));
        }
        if let Some(engine) =
            self.engines.iter().find(|engine| engine.suffixes.as_ref().is_some_and(Vec::is_empty))
        {
            return Err(config_error(format!("engine '{}' has an empty suffix list", engine.kind)));
        }
        Ok(())
    }

    /// Configured engines in priority order, or the defaults.
    pub fn engines(&self) -> Vec<FormatEngine> {
        if self.engines.is_empty() {
            default_engines()
        } else {
            self.engines.iter().map(EngineConfig::to_engine).collect()
        }
    }

    pub fn sanitize_policy(&self) -> SanitizePolicy {
        self.sanitizer.to_policy()
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            production: self.production,
            default_layout: self.default_layout.clone().filter(|layout| !layout.is_empty()),
            error_template: self.error_template.clone(),
            status_template_dir: self.status_template_dir.clone(),
        }
    }
}

impl Scanner {
    /// Scanner over the configured roots with the configured engines,
    /// sanitizer policy and key length.
    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(config.roots.iter().cloned())
            .with_engines(config.engines())
            .with_helpers(TemplateHelpers::new(config.sanitize_policy(), config.production))
            .with_max_cache_key_length(config.max_cache_key_length)
    }
}

fn config_error(message: impl Into<String>) -> ViewError {
    ViewError::Config {
        message: message.into(),
    }
}
