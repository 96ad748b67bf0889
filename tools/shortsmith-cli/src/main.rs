//! Shortsmith CLI — batch-render vertical shorts from a plan and one media source.
//!
//! Usage:
//!   shortsmith render --plan <PLAN> --media <MEDIA>   Render every clip in a plan
//!   shortsmith validate <PLAN>                        Check a plan without rendering
//!   shortsmith probe <MEDIA>                          Show what a media file contains
//!   shortsmith check                                  Check tools and fonts

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shortsmith_common::config::AppConfig;

mod commands;
mod fonts;
mod source;

#[derive(Parser)]
#[command(
    name = "shortsmith",
    about = "Batch-render short vertical clips from a plan and one media source",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every clip in a plan
    Render(commands::render::RenderArgs),

    /// Parse a plan and report which clips would render
    Validate {
        /// Path to the plan JSON
        plan: PathBuf,
    },

    /// Probe a local media file
    Probe {
        /// Path to the media file
        media: PathBuf,
    },

    /// Check external tools and font discovery
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if cli.log_json {
        logging.json = true;
    }
    shortsmith_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Validate { plan } => commands::validate::run(plan),
        Commands::Probe { media } => commands::probe::run(media),
        Commands::Check => commands::check::run(&config),
    }
}
