//! Aura CLI
//!
//! Command-line interface for the Aura page controllers.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use aura::cli::commands;
use aura::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Aura v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Aura v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &aura::AuraConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Render {
            output,
            duration,
            stop_at,
            sample_rate,
            bit_depth,
            stereo,
            seed,
        } => commands::render(
            config,
            &output,
            duration,
            stop_at,
            sample_rate,
            bit_depth,
            stereo,
            seed,
        )
        .with_context(|| format!("rendering {}", output.display()))?,
        Commands::Carousel {
            slides,
            duration,
            hover_from,
            hover_until,
        } => commands::carousel(config, slides, duration, hover_from, hover_until)?,
        Commands::Stats { step } => commands::stats(config, step)?,
        Commands::Config { output } => commands::config(config, output.as_deref())?,
        #[cfg(feature = "device")]
        Commands::Play { seconds } => commands::play(config, seconds)?,
    }
    Ok(())
}
