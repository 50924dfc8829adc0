//! Command-line interface for viewscan.
//!
//! # Commands
//!
//! - `scan` - Discover templates and print their formats, includes and cache keys
//! - `render` - Render one template, optionally into a layout
//! - `sanitize` - Filter markup from a file or stdin through the allow-list sanitizer
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: errors only
//! - `--config` / `-c`: path to `viewscan.toml` (also `VIEWSCAN_CONFIG`)
//!
//! Logging goes to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen by the flags.

mod render;
mod sanitize;
mod scan;

pub use render::RenderCommand;
pub use sanitize::SanitizeCommand;
pub use scan::{OutputFormat, ScanCommand};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default tracing filter; `None` means errors only.
    pub log_level: Option<String>,
    /// Configuration file given on the command line or in the environment.
    pub config_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "viewscan",
    about = "Discover, render and cache-key view templates",
    version,
    author,
    long_about = "viewscan scans template roots, tracks includes between templates, derives \
                  dependency-aware cache keys and renders templates into layouts."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, env = "VIEWSCAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan template roots and list every template
    Scan(ScanCommand),
    /// Render a template
    Render(RenderCommand),
    /// Sanitize markup from a file or stdin
    Sanitize(SanitizeCommand),
}

impl Cli {
    /// Install logging and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(config.log_level.as_deref());
        self.execute_with_config(config)
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command without touching logging.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Scan(cmd) => cmd.execute(config.config_path),
            Commands::Render(cmd) => cmd.execute(config.config_path),
            Commands::Sanitize(cmd) => cmd.execute(config.config_path),
        }
    }
}

/// Install the global tracing subscriber writing to stderr.
///
/// Does nothing if a subscriber is already installed.
pub fn init_logging(level: Option<&str>) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(level.unwrap_or("error")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
