//! lrucli - interactive shell over a fixed-capacity LRU cache

mod handler;
mod reply;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lrucache::LruCache;
use tracing::info;

use crate::handler::CommandHandler;

/// Replays the classic capacity-2 eviction walkthrough
const DEMO_SCRIPT: &str = "\
SET 1 1
SET 2 2
GET 1
# cache is full: 2 is least recently used and gets evicted
SET 3 3
GET 2
# 1 is now least recently used
SET 4 4
GET 1
GET 3
GET 4
";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of entries)
    #[arg(short, long, default_value_t = 2)]
    capacity: usize,

    /// Replay the built-in eviction demo and exit
    #[arg(long, conflicts_with = "script")]
    demo: bool,

    /// Read commands from a file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so replies on stdout stay scriptable
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let cache = LruCache::new(args.capacity).context("invalid --capacity")?;
    info!("Cache capacity: {}", args.capacity);

    let mut handler = CommandHandler::new(cache);
    let stdout = io::stdout().lock();

    if args.demo {
        info!("Running eviction demo");
        return handler.run(DEMO_SCRIPT.as_bytes(), stdout, true);
    }

    match args.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            info!("Reading commands from {}", path.display());
            handler.run(BufReader::new(file), stdout, false)
        }
        None => handler.run(io::stdin().lock(), stdout, false),
    }
}
