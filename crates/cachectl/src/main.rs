//! cachectl - drive an LRU or LFU cache from a command script

mod config;
mod demo;
mod handler;
mod reply;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use cachecore::Policy;
use clap::Parser;
use tracing::{info, warn};

use crate::config::{FileConfig, Settings};
use crate::handler::CommandHandler;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Eviction policy: lru or lfu
    #[arg(short, long)]
    policy: Option<Policy>,

    /// Cache capacity (number of items)
    #[arg(short, long, allow_negative_numbers = true)]
    capacity: Option<i64>,

    /// Command script to run instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// JSON config file with policy and capacity
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the built-in LRU/LFU walkthroughs and exit
    #[arg(long)]
    demo: bool,
}

fn main() -> Result<()> {
    // Replies go to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.demo {
        let passed = demo::run(&mut io::stdout().lock())?;
        std::process::exit(if passed { 0 } else { 1 });
    }

    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let settings = Settings::resolve(args.policy, args.capacity, file_config.as_ref())?;

    let cache = settings
        .policy
        .try_build(settings.capacity)
        .context("Failed to create cache")?;
    info!(
        "Starting cachectl v{} ({} policy, capacity {})",
        env!("CARGO_PKG_VERSION"),
        settings.policy,
        settings.capacity
    );

    let mut handler = CommandHandler::new(cache);
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let errors = match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            run_session(&mut handler, BufReader::new(file), &mut output)?
        }
        None => run_session(&mut handler, io::stdin().lock(), &mut output)?,
    };

    if errors > 0 {
        warn!("{} command(s) failed", errors);
    }
    Ok(())
}

/// Feed every input line to the handler and write its reply.
/// Returns the number of error replies.
fn run_session<R: BufRead, W: Write>(
    handler: &mut CommandHandler,
    input: R,
    output: &mut W,
) -> Result<usize> {
    let mut errors = 0;

    for line in input.lines() {
        let line = line.context("Failed to read command")?;
        if let Some(reply) = handler.handle(&line) {
            if reply.is_error() {
                warn!("{}: {}", line.trim(), reply);
                errors += 1;
            }
            writeln!(output, "{}", reply)?;
        }
    }

    output.flush()?;
    Ok(errors)
}
