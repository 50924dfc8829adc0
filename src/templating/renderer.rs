//! Per-request rendering with layouts, error pages and status pages.
//!
//! A [`Renderer`] is created for one request path. It picks a default
//! template and layout from the path, lets the caller adjust them through
//! builder methods, and renders the template into the layout:
//!
//! | Request path     | Default template                |
//! |------------------|---------------------------------|
//! | `/`              | `pages/views/home.html.tera`    |
//! | `/posts`         | `posts/views/index.html.tera`   |
//! | `/posts/123`     | `posts/views/show.html.tera`    |
//! | `/posts/create`  | `posts/views/create.html.tera`  |
//! | `/posts/12/edit` | `posts/views/edit.html.tera`    |
//!
//! Defaults are only chosen when the template exists. The layout is
//! `<pkg>/views/layout.html.tera` when present, otherwise the configured
//! default layout when present, otherwise none.
//!
//! [`Renderer::render`] never fails: any error becomes the configured error
//! template, or the built-in status page when that is missing or fails too.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Context;

use super::views::{ViewGeneration, ViewSet};
use crate::core::ViewError;

/// Suffix of the templates the renderer picks by convention.
const VIEW_SUFFIX: &str = ".html.tera";

/// Renderer behavior shared by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Hide error details and skip reloading before each render.
    pub production: bool,
    /// Layout used when the request's package has none of its own.
    pub default_layout: Option<String>,
    /// Template rendered when a render fails.
    pub error_template: String,
    /// Directory holding `<status>.html.tera` pages.
    pub status_template_dir: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            production: false,
            default_layout: Some("app/views/layout.html.tera".to_string()),
            error_template: "app/views/500.html.tera".to_string(),
            status_template_dir: "app/views".to_string(),
        }
    }
}

/// The outcome of a render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub status: u16,
    /// Full `Content-Type` header value.
    pub content_type: String,
    pub body: String,
}

impl RenderedPage {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: content_type_header("text/html"),
            body,
        }
    }
}

fn content_type_header(media_type: &str) -> String {
    format!("{media_type}; charset=utf-8")
}

/// Builder for one render.
pub struct Renderer<'a> {
    settings: &'a RenderSettings,
    generation: Arc<ViewGeneration>,
    pending_error: Option<ViewError>,
    request_path: String,
    template: Option<String>,
    layout: Option<String>,
    media_type: String,
    status: u16,
    context: Context,
    content_set: bool,
}

impl<'a> Renderer<'a> {
    /// Start a render for `request_path`.
    ///
    /// Outside production mode the view set is reloaded first. If that
    /// reload fails the render goes on against the previous generation and
    /// the reload error is reported as the render's error.
    pub fn new(views: &'a ViewSet, request_path: &str) -> Self {
        let (generation, pending_error) = views.refresh_for_render();
        let mut renderer = Self::for_generation(generation, views.settings(), request_path);
        renderer.pending_error = pending_error;
        renderer
    }

    /// Start a render against a fixed generation, without reloading.
    pub fn for_generation(generation: Arc<ViewGeneration>, settings: &'a RenderSettings, request_path: &str) -> Self {
        let request_path = clean_path(request_path);
        let (template, layout) = default_templates(&request_path, &generation, settings);

        Self {
            settings,
            generation,
            pending_error: None,
            request_path,
            template,
            layout,
            media_type: "text/html".to_string(),
            status: 200,
            context: Context::new(),
            content_set: false,
        }
    }

    #[must_use]
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// Render the template on its own.
    #[must_use]
    pub fn without_layout(mut self) -> Self {
        self.layout = None;
        self
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Media type of the response, e.g. `application/json`.
    #[must_use]
    pub fn content_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Use `content` as the page content, escaped. The template is skipped.
    #[must_use]
    pub fn text(mut self, content: &str) -> Self {
        self.context.insert("content", &tera::escape_html(content));
        self.content_set = true;
        self
    }

    /// Use `content` as the page content verbatim. The template is skipped.
    #[must_use]
    pub fn html(mut self, content: &str) -> Self {
        self.context.insert("content", content);
        self.content_set = true;
        self
    }

    /// Add one value to the render context.
    #[must_use]
    pub fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    /// Replace the whole render context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.content_set = context.contains_key("content");
        self.context = context;
        self
    }

    pub fn request_path(&self) -> &str {
        &self.request_path
    }

    pub fn selected_template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn selected_layout(&self) -> Option<&str> {
        self.layout.as_deref()
    }

    /// Render only the template, without layout.
    ///
    /// # Returns
    ///
    /// The rendered template, or an empty string if no template is selected.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateNotFound`] for an unknown template and
    /// [`ViewError::RenderExecution`] when it fails.
    pub fn render_to_string(&self) -> Result<String, ViewError> {
        match &self.template {
            Some(template) => self.generation.execute(template, &self.context),
            None => Ok(String::new()),
        }
    }

    /// Render the template into the layout.
    ///
    /// # Errors
    ///
    /// Returns the first error met: a failed development reload, a missing
    /// template or layout, or a failing template.
    pub fn try_render(mut self) -> Result<RenderedPage, ViewError> {
        let body = self.render_body()?;
        Ok(RenderedPage {
            status: self.status,
            content_type: content_type_header(&self.media_type),
            body,
        })
    }

    /// Render the template into the layout, falling back to the error page.
    pub fn render(mut self) -> RenderedPage {
        match self.render_body() {
            Ok(body) => RenderedPage {
                status: self.status,
                content_type: content_type_header(&self.media_type),
                body,
            },
            Err(e) => self.render_error(&e),
        }
    }

    /// Render the error page for `error` with status 500.
    ///
    /// The configured error template receives the render context, plus
    /// `error` outside production mode.
    pub fn render_error(self, error: &ViewError) -> RenderedPage {
        tracing::warn!("Rendering error page for {}: {}", self.request_path, error);

        let mut context = self.context.clone();
        if !self.settings.production {
            context.insert("error", &error.to_string());
        }

        let error_template = &self.settings.error_template;
        if self.generation.contains(error_template) {
            match self.generation.execute(error_template, &context) {
                Ok(body) => return RenderedPage::html(500, body),
                Err(e) => tracing::warn!("Error template failed: {}", e),
            }
        }

        self.status_page(500, Some(error))
    }

    /// Render the page for `status`.
    pub fn render_status(self, status: u16) -> RenderedPage {
        self.status_page(status, None)
    }

    fn render_body(&mut self) -> Result<String, ViewError> {
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }

        let mut context = self.context.clone();
        if !self.content_set
            && let Some(template) = &self.template
        {
            let content = self.generation.execute(template, &context)?;
            context.insert("content", &content);
        }

        match &self.layout {
            Some(layout) => self.generation.execute(layout, &context),
            None => match context.get("content") {
                None => Ok(String::new()),
                Some(tera::Value::String(content)) => Ok(content.clone()),
                Some(other) => Err(ViewError::RenderExecution {
                    path: self.template.clone().unwrap_or_else(|| self.request_path.clone()),
                    message: format!("content must be a string without a layout, found {other}"),
                }),
            },
        }
    }

    fn status_page(&self, status: u16, error: Option<&ViewError>) -> RenderedPage {
        let (title, message) = status_text(status);

        let template = format!("{}/{status}{VIEW_SUFFIX}", self.settings.status_template_dir);
        if self.generation.contains(&template) {
            let mut context = Context::new();
            context.insert("title", title);
            context.insert("message", message);
            context.insert("status", &status);
            match self.generation.execute(&template, &context) {
                Ok(body) => return RenderedPage::html(status, body),
                Err(e) => tracing::warn!("Status template {} failed: {}", template, e),
            }
        }

        let mut body = format!("<h1>{title}</h1><p>{message}</p><p>Status:{status}</p>");
        if !self.settings.production
            && let Some(error) = error
        {
            body.push_str(&format!("<pre>{}</pre>", tera::escape_html(&error.to_string())));
        }
        RenderedPage::html(status, body)
    }
}

/// Title and message of the built-in page for `status`.
pub fn status_text(status: u16) -> (&'static str, &'static str) {
    match status {
        401 | 403 => ("Unauthorized", "Sorry, you don't have permission to perform that action."),
        404 => (
            "Not Found",
            "Sorry, we couldn't find the requested page. If you think this was an error, please let us know.",
        ),
        418 => ("Teapot!", "I'm a little teapot, short and stout."),
        500 => ("Server Error", "Sorry, an error occurred. Please let us know."),
        _ => ("Oops", "Sorry, something went wrong, please let us know"),
    }
}

/// Lexically clean a request path: collapse separators, drop `.` segments
/// and resolve `..` without climbing above the root.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

fn default_templates(
    request_path: &str,
    generation: &ViewGeneration,
    settings: &RenderSettings,
) -> (Option<String>, Option<String>) {
    let default_layout = settings
        .default_layout
        .as_ref()
        .filter(|layout| generation.contains(layout))
        .cloned();

    if request_path == "/" {
        let home = format!("pages/views/home{VIEW_SUFFIX}");
        return (generation.contains(&home).then_some(home), default_layout);
    }

    let parts: Vec<&str> = request_path.trim_matches('/').split('/').collect();
    let (package, action) = match parts.as_slice() {
        [package] => (*package, "index"),
        [package, id] if id.chars().all(|c| c.is_ascii_digit()) => (*package, "show"),
        [package, action] | [package, _, action] => (*package, *action),
        _ => ("app", "index"),
    };

    let template = format!("{package}/views/{action}{VIEW_SUFFIX}");
    let template = generation.contains(&template).then_some(template);

    let layout = format!("{package}/views/layout{VIEW_SUFFIX}");
    let layout = if generation.contains(&layout) {
        Some(layout)
    } else {
        default_layout
    };

    (template, layout)
}
