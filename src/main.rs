//! viewscan CLI entry point
//!
//! Parses arguments, runs the selected command and prints errors with
//! details and suggestions:
//! - `scan` - List templates with their includes and cache keys
//! - `render` - Render a template into a layout
//! - `sanitize` - Filter markup through the allow-list sanitizer

use clap::Parser;
use viewscan::cli;
use viewscan::core::user_friendly_error;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(1);
    }
}
