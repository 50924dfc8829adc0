//! Error handling for viewscan
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`ViewError`]) for every failure the library can
//!    report, so callers can match on scan, lookup and render failures.
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and suggestions
//!    for the command-line front end.
//!
//! # Error Categories
//!
//! - **Scan errors** abort a (re)scan and leave the previously published
//!   generation in place: [`ViewError::ScanIo`], [`ViewError::Walk`],
//!   [`ViewError::DuplicateTemplate`], [`ViewError::TemplateParse`].
//! - **Render errors** are local to one render attempt and are turned into a
//!   fallback page at the render boundary: [`ViewError::TemplateNotFound`],
//!   [`ViewError::RenderExecution`].
//! - **Configuration errors**: [`ViewError::Config`].
//!
//! Malformed markup handed to the sanitizer is not an error at all; it is
//! reported through [`crate::sanitize::Sanitized::is_truncated`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use viewscan::core::{ViewError, user_friendly_error};
//!
//! fn lookup() -> Result<(), ViewError> {
//!     Err(ViewError::TemplateNotFound {
//!         path: "pages/views/show.html.tera".to_string(),
//!         suggestion: None,
//!     })
//! }
//!
//! if let Err(e) = lookup() {
//!     user_friendly_error(anyhow::Error::from(e)).display();
//! }
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::templating::FormatKind;

/// The main error type for viewscan operations.
#[derive(Error, Debug)]
pub enum ViewError {
    /// A template file or root directory could not be read during a scan.
    #[error("Failed to read template file {}", .path.display())]
    ScanIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed part way through a root.
    #[error("Failed to walk template directory {}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Two files resolved to the same registry path within one scan.
    #[error("Duplicate template: {path}")]
    DuplicateTemplate { path: String },

    /// The format engine rejected the templates of a namespace.
    #[error("Failed to parse {format} templates: {message}")]
    TemplateParse { format: FormatKind, message: String },

    /// A render asked for a path that is not in the registry.
    #[error("No such template found {path}")]
    TemplateNotFound {
        path: String,
        /// Closest registered path, if any is similar enough
        suggestion: Option<String>,
    },

    /// Executing a template failed (bad expression, missing variable, ...).
    #[error("Could not render template {path} - {message}")]
    RenderExecution { path: String, message: String },

    /// Configuration file missing required values or not valid TOML.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ViewError {
    /// Whether the error aborted a scan (as opposed to a single render).
    #[must_use]
    pub const fn is_scan_error(&self) -> bool {
        matches!(
            self,
            Self::ScanIo { .. }
                | Self::Walk { .. }
                | Self::DuplicateTemplate { .. }
                | Self::TemplateParse { .. }
        )
    }
}

/// Error wrapper carrying a user-facing message, details and a suggestion.
///
/// Used by the CLI to print errors; library code returns [`ViewError`].
#[derive(Debug)]
pub struct ErrorContext {
    /// The primary error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context for the given message with no suggestion or details.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colours.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where the
/// error is recognised.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(view_error) = error.downcast_ref::<ViewError>() {
        return create_error_context(view_error);
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ErrorContext::new(format!("{error:#}"))
                .with_suggestion("Check that the file or directory exists and the path is correct"),
            std::io::ErrorKind::PermissionDenied => ErrorContext::new(format!("{error:#}"))
                .with_suggestion("Check the file permissions of the template directory"),
            _ => ErrorContext::new(format!("{error:#}")),
        };
    }

    ErrorContext::new(format!("{error:#}"))
}

fn create_error_context(error: &ViewError) -> ErrorContext {
    let context = ErrorContext::new(error.to_string());
    match error {
        ViewError::ScanIo { source, .. } => context
            .with_details(source.to_string())
            .with_suggestion("Check that every configured root exists and is readable"),
        ViewError::Walk { source, .. } => context
            .with_details(source.to_string())
            .with_suggestion("Check the permissions of the directories below the template root"),
        ViewError::DuplicateTemplate { .. } => context
            .with_details("Two template roots contain a file with the same relative path")
            .with_suggestion("Rename one of the files or remove the overlapping root"),
        ViewError::TemplateParse { .. } => context
            .with_suggestion("Fix the template syntax; the message above names the template"),
        ViewError::TemplateNotFound { suggestion, .. } => match suggestion {
            Some(candidate) => context.with_suggestion(format!("Did you mean '{candidate}'?")),
            None => context.with_suggestion("Run 'viewscan scan' to list the registered templates"),
        },
        ViewError::RenderExecution { .. } => context.with_suggestion(
            "Check that the render context provides every variable the template uses",
        ),
        ViewError::Config { .. } => {
            context.with_suggestion("Check viewscan.toml or the file passed with --config")
        }
    }
}
