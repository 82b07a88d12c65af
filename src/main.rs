//! Markpad - a terminal markdown editor built on a lazily loaded engine.
//!
//! # Usage
//!
//! ```bash
//! markpad notes.md
//! markpad --watch notes.md
//! markpad --read-only --engine-option status=true notes.md
//! markpad --html notes.md > notes.html
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use markpad::app::App;
use markpad::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use markpad::host::MemoryDocument;
use markpad::loader::{HttpFetcher, ResourceLoader};
use markpad::render::render_markdown;

/// A terminal markdown editor
#[derive(Parser, Debug)]
#[command(name = "markpad", version, about, long_about = None)]
struct Cli {
    /// Markdown file to edit (created on first save if missing)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Reload the editor when the file changes on disk
    #[arg(short, long)]
    watch: bool,

    /// Open without editing; toggle with Ctrl+R
    #[arg(long)]
    read_only: bool,

    /// Location of the engine bundle
    #[arg(long, value_name = "URL")]
    script_url: Option<String>,

    /// Location of the engine stylesheet
    #[arg(long, value_name = "URL")]
    style_url: Option<String>,

    /// Engine fetch timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Engine option as key=value (repeatable)
    #[arg(long = "engine-option", value_name = "KEY=VALUE")]
    engine_option: Vec<String>,

    /// Print FILE rendered as HTML and exit
    #[arg(long)]
    html: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            watch: self.watch,
            read_only: self.read_only,
            script_url: self.script_url.clone(),
            style_url: self.style_url.clone(),
            fetch_timeout_ms: self.timeout_ms,
            engine_options: self.engine_option.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    if cli.html {
        let text = std::fs::read_to_string(&cli.file)
            .with_context(|| format!("Failed to read {}", cli.file.display()))?;
        println!("{}", render_markdown(&text));
        return Ok(());
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let fetcher = Arc::new(HttpFetcher::new(effective.fetch_timeout()));
    let loader = ResourceLoader::new(fetcher, Arc::new(MemoryDocument::new()))
        .with_locations(effective.locations());

    let mut app = App::new(cli.file, Arc::new(loader))
        .with_watch(effective.watch)
        .with_read_only(effective.read_only)
        .with_options(effective.engine_options());

    app.run().context("Application error")
}
