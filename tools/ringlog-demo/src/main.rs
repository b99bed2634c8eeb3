//! ringlog-demo - Scripted sessions against the RingLog ring buffer
//!
//! Commands:
//! - `ringlog-demo messages` - Queue levelled debug records with overwrite, then drain
//! - `ringlog-demo partial` - Stream items with open/append/close, interleaving reads
//! - `ringlog-demo viz <items>...` - Enqueue the given strings and show occupancy
//!
//! Every step prints the occupancy view:
//!
//! ```text
//!            W
//! |=====|==========|~~~~~---------------------
//! R
//! ```

mod config;
mod harness;
mod message;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use ringlog::{viz, RingLog};

use crate::config::DemoConfig;
use crate::harness::{run_messages, run_partial, Harness};

#[derive(Parser, Debug)]
#[command(name = "ringlog-demo")]
#[command(version)]
#[command(about = "Scripted sessions against the RingLog ring buffer", long_about = None)]
struct Cli {
    /// TOML file with ring and message settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ring capacity in bytes (overrides the config file)
    #[arg(long, global = true)]
    capacity: Option<usize>,

    /// Columns in the occupancy view (overrides the config file)
    #[arg(long, global = true)]
    width: Option<usize>,

    /// Reject writes that need eviction instead of overwriting
    #[arg(long, global = true)]
    no_overwrite: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue debug records, then drain the survivors
    Messages {
        /// Longest message text kept per record, in bytes
        #[arg(long)]
        max_len: Option<usize>,
    },

    /// Stream items across several writes
    Partial,

    /// Enqueue the given strings and print the occupancy view
    Viz {
        /// Items to enqueue, oldest first
        items: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    log::info!(
        "Ring: {} bytes, overwrite {}",
        config.ring.capacity,
        if config.ring.allow_overwrite { "on" } else { "off" }
    );

    let stdout = io::stdout().lock();
    match cli.command {
        Commands::Messages { max_len } => {
            let max_len = max_len.unwrap_or(config.messages.max_len);
            let mut harness = Harness::new(&config.ring, stdout)?;
            let records = run_messages(&mut harness, max_len)?;
            println!("{} {} records survived", "✓".green(), records.len());
        }

        Commands::Partial => {
            let mut harness = Harness::new(&config.ring, stdout)?;
            let items = run_partial(&mut harness)?;
            println!("{} {} items read", "✓".green(), items.len());
        }

        Commands::Viz { items } => {
            show_items(&config, &items, stdout)?;
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DemoConfig> {
    let mut config = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };

    if let Some(capacity) = cli.capacity {
        config.ring.capacity = capacity;
    }
    if let Some(width) = cli.width {
        config.ring.width = width;
    }
    if cli.no_overwrite {
        config.ring.allow_overwrite = false;
    }
    Ok(config)
}

fn show_items<W: Write>(config: &DemoConfig, items: &[String], mut out: W) -> Result<()> {
    let mut ring = RingLog::with_capacity(config.ring.capacity)?;
    for item in items {
        match ring.enqueue(item.as_bytes(), config.ring.allow_overwrite) {
            Ok(0) => {}
            Ok(evicted) => log::info!("'{}' evicted {} item(s)", item, evicted),
            Err(err) => log::warn!("'{}' not stored: {}", item, err),
        }
    }

    writeln!(out, "{}", "Occupancy".bold())?;
    writeln!(out, "{}", viz::render(&ring, config.ring.width))?;
    writeln!(
        out,
        "{} items, {}/{} bytes used",
        ring.count(),
        ring.used(),
        ring.capacity()
    )?;
    Ok(())
}
