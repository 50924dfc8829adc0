//! Template discovery, dependency tracking and rendering.
//!
//! # Overview
//!
//! Templates live in files under one or more roots and are addressed by their
//! root-relative path with `/` separators, e.g. `posts/views/show.html.tera`.
//! A scan produces a [`ViewGeneration`] holding:
//!
//! - a [`Registry`] of [`TemplateRecord`]s, one per file, across all formats
//! - one compiled [`Namespace`] per [`FormatKind`]
//!
//! Each file is claimed by the first [`FormatEngine`] in priority order whose
//! suffixes match it. The default engines are:
//!
//! | Format | Suffixes                  | Escaping |
//! |--------|---------------------------|----------|
//! | data   | `.json.tera`              | none     |
//! | markup | `.html.tera`              | HTML     |
//! | text   | `.text.tera`, `.csv.tera` | none     |
//!
//! # Includes
//!
//! A template includes another with
//!
//! ```text
//! {{ template "app/views/header.html.tera" . }}
//! ```
//!
//! Includes are resolved by registry path within the including template's
//! format. Including a path that does not exist renders nothing. Inheritance
//! with `{% extends %}` and `{% block %}` works as usual in tera.
//!
//! # Cache Keys
//!
//! Every record has a cache key derived from its path, its content and the
//! keys of the templates it includes. See [`cache_key`] for the derivation.
//!
//! # Reloading
//!
//! A [`ViewSet`] keeps the current generation and rebuilds it on
//! [`ViewSet::reload`]. Outside production mode every [`Renderer`] reloads
//! before rendering.
//!
//! # Examples
//!
//! ```rust,no_run
//! use viewscan::templating::{RenderSettings, Renderer, Scanner, ViewSet};
//!
//! # fn example() -> Result<(), viewscan::core::ViewError> {
//! let views = ViewSet::load(Scanner::new(["src"]), RenderSettings::default())?;
//! let page = Renderer::new(&views, "/posts/12").insert("id", &12).render();
//! println!("{} {}", page.status, page.body);
//! # Ok(())
//! # }
//! ```

pub mod cache_key;
pub mod dependencies;
pub mod engine;
pub mod filters;
pub mod record;
pub mod registry;
pub mod renderer;
pub mod scanner;
pub mod views;

pub use cache_key::{DEFAULT_MAX_CACHE_KEY_LENGTH, MIN_CACHE_KEY_LENGTH, base_key, content_hash};
pub use dependencies::{extract_includes, rewrite_includes};
pub use engine::{FormatEngine, FormatKind, Namespace, default_engines};
pub use filters::TemplateHelpers;
pub use record::{TemplateId, TemplateRecord};
pub use registry::{Registry, RegistryBuilder};
pub use renderer::{RenderSettings, RenderedPage, Renderer, status_text};
pub use scanner::{GenerationBuilder, Scanner};
pub use views::{ViewGeneration, ViewSet};
