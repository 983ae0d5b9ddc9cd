//! Voltarget CLI - Command Line Pricing of Vol-Target Index Options
//!
//! This is the operational entry point for the voltarget pricing engine.
//!
//! # Commands
//!
//! - `voltarget price <request.toml>` - Price the trade, print premium, Greeks and diagnostics
//! - `voltarget manifest <request.toml>` - Print the reproducibility manifest
//! - `voltarget check <request.toml>` - Validate the request without pricing
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate only resolves a request and
//! calls `PricingEngine::price`; it holds no engine state between runs.
//! Logs go to stderr so stdout carries only the report.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::OutputFormat;
use config::Overrides;

/// Vol-target strategy index option pricer
#[derive(Parser)]
#[command(name = "voltarget")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a run request
    Price {
        /// Path to the TOML run request
        request: PathBuf,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the run manifest of a request
    Manifest {
        /// Path to the TOML run request
        request: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Validate a request without pricing it
    Check {
        /// Path to the TOML run request
        request: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Price {
            request,
            format,
            overrides,
        } => {
            let format: OutputFormat = format.parse()?;
            commands::price::run(&request, &overrides, format)?
        }
        Commands::Manifest { request, overrides } => commands::manifest::run(&request, &overrides)?,
        Commands::Check { request, overrides } => commands::check::run(&request, &overrides)?,
    }
    Ok(())
}
