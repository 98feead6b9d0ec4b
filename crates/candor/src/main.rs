// SPDX-FileCopyrightText: 2026 Candor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candor - refusal-detection and fallback-model middleware for Ollama.
//!
//! This is the binary entry point for the Candor CLI.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use candor_core::CandorError;
use clap::{Parser, Subcommand};

mod doctor;
mod run;

/// Candor - refusal-detection and fallback-model middleware for Ollama.
#[derive(Parser, Debug)]
#[command(name = "candor", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Guard a conversation: judge the final reply, swap models on refusal.
    Run {
        /// Primary model that produced (or will produce) the reply.
        #[arg(long)]
        model: String,

        /// Generate the primary reply first instead of expecting it as the
        /// conversation's final turn.
        #[arg(long)]
        generate: bool,

        /// Conversation JSON file (array of {role, content}); stdin if omitted.
        file: Option<PathBuf>,
    },
    /// Check configuration, host connectivity, and model availability.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective merged configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match candor_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            candor_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Run {
            model,
            generate,
            file,
        }) => run::run_guard(&config, &model, generate, file.as_deref()).await,
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, plain).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("candor: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("candor: {err}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber on stderr, honoring `RUST_LOG` when
/// set and falling back to the configured level otherwise.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders the effective configuration to stdout.
fn print_config(config: &candor_config::CandorConfig) -> Result<(), CandorError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| CandorError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
