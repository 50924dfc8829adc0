//! List discovered templates.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::ViewConfig;
use crate::templating::{FormatKind, Scanner, TemplateRecord, ViewGeneration};

/// Output format for `scan`.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing.
    Text,
    /// One JSON array of templates.
    Json,
}

/// Scan template roots and list every template.
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Roots to scan instead of the configured ones
    #[arg(value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Output format: text or json
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// One template in the listing.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TemplateEntry<'a> {
    pub path: &'a str,
    pub format: FormatKind,
    pub dependencies: Vec<&'a str>,
    pub cache_key: &'a str,
}

impl ScanCommand {
    /// # Errors
    ///
    /// Returns configuration and scan errors.
    pub fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let mut config = ViewConfig::load_with_optional(config_path)?;
        if !self.roots.is_empty() {
            config.roots = self.roots;
        }

        let generation = Scanner::from_config(&config).scan(1)?;
        let entries = collect_entries(&generation);
        tracing::info!("Found {} template(s)", entries.len());

        match self.format {
            OutputFormat::Text => print!("{}", format_text(&entries)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        }
        Ok(())
    }
}

/// Listing entries sorted by path.
pub fn collect_entries(generation: &ViewGeneration) -> Vec<TemplateEntry<'_>> {
    let registry = generation.registry();
    registry
        .paths()
        .into_iter()
        .filter_map(|path| registry.id(path))
        .map(|id| {
            let record = registry.record(id);
            TemplateEntry {
                path: record.path(),
                format: record.format(),
                dependencies: registry.dependencies(record).map(TemplateRecord::path).collect(),
                cache_key: registry.cache_key(id),
            }
        })
        .collect()
}

fn format_text(entries: &[TemplateEntry<'_>]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "No templates found.".yellow());
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!("{} {}\n", entry.path.bold(), format!("[{}]", entry.format).as_str().cyan()));
        if !entry.dependencies.is_empty() {
            output.push_str(&format!("  includes: {}\n", entry.dependencies.join(", ")));
        }
        output.push_str(&format!("  key: {}\n", entry.cache_key.dimmed()));
    }
    output.push_str(&format!("\n{} template(s)\n", entries.len()));
    output
}
