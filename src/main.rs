mod cli;
mod config;
mod context;
mod enrichment;
mod error;
mod morphing;
mod preferences;
mod rules;
mod selector;
mod themes;

use std::path::PathBuf;
use clap::{Parser, Subcommand};

use preferences::Feedback;

#[derive(Parser)]
#[command(name = "aitheme", about = "Context-driven theme personalization engine")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default: platform config dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect a context snapshot and pick the best-matching theme
    Select {
        /// Skip geolocation/weather enrichment
        #[arg(long)]
        offline: bool,
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the collected context snapshot
    Context {
        /// Skip geolocation/weather enrichment
        #[arg(long)]
        offline: bool,
    },
    /// List the theme catalog
    Themes,
    /// Record a like/dislike/neutral signal for a theme
    Feedback {
        /// Theme identifier (see `themes`)
        theme_id: String,
        /// One of: like, dislike, neutral
        kind: Feedback,
    },
    /// Show visit history, preference scores and morph transitions
    History,
    /// Run the idle-gated autonomous morphing loop
    Morph {
        /// Seconds between morph checks
        #[arg(long)]
        interval: Option<u64>,
        /// Idle seconds before morphing resumes
        #[arg(long)]
        idle: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Select { offline, format } => {
            cli::handle_select(args.data_dir, offline, format).await
        }
        Commands::Context { offline } => cli::handle_context(args.data_dir, offline).await,
        Commands::Themes => cli::handle_themes(),
        Commands::Feedback { theme_id, kind } => {
            cli::handle_feedback(args.data_dir, theme_id, kind)
        }
        Commands::History => cli::handle_history(args.data_dir),
        Commands::Morph { interval, idle } => {
            cli::handle_morph(args.data_dir, interval, idle).await
        }
    }
}
