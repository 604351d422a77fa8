//! CLI Module
//!
//! Command-line interface for rendering and simulating the page controllers.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aura - ambient soundscape and landing page controller simulator
#[derive(Parser, Debug)]
#[command(name = "aura")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the ambient soundscape offline to a WAV file
    #[command(name = "render")]
    Render {
        /// Output WAV path
        output: PathBuf,

        /// Total length of the render in seconds
        #[arg(short, long, default_value_t = 10.0)]
        duration: f64,

        /// Toggle the player off at this time (seconds) to render the fade-out
        #[arg(long)]
        stop_at: Option<f64>,

        /// Render sample rate in Hz
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,

        /// Bit depth: 16, 24 or 32
        #[arg(long, default_value_t = 24)]
        bit_depth: u16,

        /// Write two identical channels instead of one
        #[arg(long)]
        stereo: bool,

        /// Seed for detune and modulator randomization
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Simulate the carousel timeline and print slide changes
    #[command(name = "carousel")]
    Carousel {
        /// Number of slides
        #[arg(short, long, default_value_t = 4)]
        slides: usize,

        /// Simulated time in milliseconds
        #[arg(short, long, default_value_t = 30_000)]
        duration: u64,

        /// Pointer enters the carousel at this time (ms)
        #[arg(long)]
        hover_from: Option<u64>,

        /// Pointer leaves the carousel at this time (ms)
        #[arg(long)]
        hover_until: Option<u64>,
    },

    /// Simulate the stats counter animation
    #[command(name = "stats")]
    Stats {
        /// Print the labels every this many milliseconds
        #[arg(short, long, default_value_t = 250)]
        step: u64,
    },

    /// Print the effective configuration as JSON
    #[command(name = "config")]
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play the soundscape live through the default output device
    #[cfg(feature = "device")]
    #[command(name = "play")]
    Play {
        /// Seconds to play before fading out
        #[arg(short, long, default_value_t = 30.0)]
        seconds: f64,
    },
}
