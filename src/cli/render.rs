//! Render a single template from the command line.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use std::path::{Path, PathBuf};
use tera::Context;

use crate::config::ViewConfig;
use crate::templating::{Renderer, ViewSet};

/// Render a template, optionally into a layout, and print the body.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Registry path of the template, e.g. `posts/views/show.html.tera`
    #[arg(value_name = "TEMPLATE")]
    pub template: String,

    /// Layout to render the template into
    #[arg(long, conflicts_with = "no_layout")]
    pub layout: Option<String>,

    /// Print the template without any layout
    #[arg(long)]
    pub no_layout: bool,

    /// JSON file whose top-level object becomes the render context
    #[arg(long, value_name = "FILE")]
    pub context: Option<PathBuf>,

    /// Request path used to pick the default layout
    #[arg(long, default_value = "/")]
    pub path: String,
}

impl RenderCommand {
    /// # Errors
    ///
    /// Returns configuration, scan and render errors.
    pub fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let config = ViewConfig::load_with_optional(config_path)?;
        let context = match &self.context {
            Some(path) => load_context(path)?,
            None => Context::new(),
        };

        let views = ViewSet::from_config(&config)?;
        let mut renderer = Renderer::new(&views, &self.path).template(self.template).context(context);
        if self.no_layout {
            renderer = renderer.without_layout();
        } else if let Some(layout) = self.layout {
            renderer = renderer.layout(layout);
        }

        let page = renderer.try_render()?;
        tracing::info!("Rendered with status {} ({})", page.status, page.content_type);
        print!("{}", page.body);
        Ok(())
    }
}

/// Read a render context from a JSON object file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not JSON or is not an
/// object.
pub fn load_context(path: &Path) -> Result<Context> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse context file: {}", path.display()))?;

    if !value.is_object() {
        bail!("Context file {} must contain a JSON object", path.display());
    }
    Context::from_value(value).with_context(|| format!("Invalid context in {}", path.display()))
}
