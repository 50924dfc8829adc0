//! Sanitize markup from the command line.

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::PathBuf;

use crate::config::ViewConfig;
use crate::sanitize::{SanitizePolicy, Sanitizer};

/// Filter markup from a file or stdin and print the result.
#[derive(Args, Debug)]
pub struct SanitizeCommand {
    /// File to read; stdin when omitted
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Comma-separated tags to allow instead of the configured ones
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Comma-separated attributes to allow instead of the configured ones
    #[arg(long, value_delimiter = ',')]
    pub attrs: Option<Vec<String>>,

    /// Drop every tag and keep only text
    #[arg(long, conflicts_with_all = ["tags", "attrs"])]
    pub strip: bool,
}

impl SanitizeCommand {
    /// # Errors
    ///
    /// Returns configuration and input errors.
    pub fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let config = ViewConfig::load_with_optional(config_path)?;
        let input = self.read_input()?;

        let sanitized = Sanitizer::new(self.policy(config.sanitize_policy())).sanitize(&input);
        if let Some(reason) = sanitized.truncation_reason() {
            tracing::warn!("Output truncated: {}", reason);
        }
        print!("{sanitized}");
        Ok(())
    }

    /// `base` with this command's overrides applied.
    pub fn policy(&self, base: SanitizePolicy) -> SanitizePolicy {
        if self.strip {
            return base.with_allowed_tags(Vec::<String>::new()).with_allowed_attributes(Vec::<String>::new());
        }

        let mut policy = base;
        if let Some(tags) = &self.tags {
            policy = policy.with_allowed_tags(tags);
        }
        if let Some(attributes) = &self.attrs {
            policy = policy.with_allowed_attributes(attributes);
        }
        policy
    }

    fn read_input(&self) -> Result<String> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read markup from {}", path.display())),
            None => {
                let mut input = String::new();
                std::io::stdin().read_to_string(&mut input).context("Failed to read markup from stdin")?;
                Ok(input)
            }
        }
    }
}
