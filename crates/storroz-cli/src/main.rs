//! Storroz CLI - development harness for the social-graph core
//!
//! Seeds demo data through the service, persists snapshots, and runs
//! search and trending queries against them. The HTTP boundary layer
//! is a separate concern; this binary talks to the core directly.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "storroz")]
#[command(author = "Storroz Contributors")]
#[command(version)]
#[command(about = "Social-graph and engagement-indexing core", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Snapshot database path
    #[arg(short, long, global = true, default_value = ".storroz")]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed a demo graph and persist it
    Seed,

    /// Search the graph
    Search {
        /// What to search: users, posts, or hashtags
        #[arg(value_parser = ["users", "posts", "hashtags"])]
        kind: String,

        /// Search query
        query: String,

        /// Maximum results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show trending hashtags
    Trending {
        /// How many hashtags to rank
        #[arg(short, long, default_value = "10")]
        k: usize,
    },

    /// Show graph statistics
    Stats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Seed => commands::seed(&cli.db).await,
        Commands::Search { kind, query, limit } => {
            commands::search(&cli.db, &kind, &query, limit).await
        }
        Commands::Trending { k } => commands::trending(&cli.db, k).await,
        Commands::Stats => commands::stats(&cli.db).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
