//! Aura - Landing Page Controllers
//!
//! The interactive pieces of the Aura landing page as a library:
//! 1. Ambient Player - a layered, slowly modulated "zen" soundscape with
//!    fade-in and fade-out
//! 2. Auto Carousel - timed slide rotation with hover pause and indicators
//! 3. Stats Counters - count-up animation of the hero statistics
//!
//! # Architecture
//!
//! The host facilities are modelled explicitly so every behavior runs
//! deterministically:
//! - `ui::Document`: the element tree the controllers render into
//! - `engine::Scheduler`: virtual interval and timeout timers
//! - `engine::AudioContext`: the audio graph, implemented in software by
//!   `engine::SynthGraph` (and on a live device with the `device` feature)
//!
//! `page::Page` wires them together.

pub mod carousel;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod page;
pub mod player;
pub mod stats;
pub mod ui;

pub use carousel::AutoCarousel;
pub use config::AuraConfig;
pub use error::{AuraError, Result};
pub use page::{Page, PageEvent};
pub use player::{AmbientPlayer, PlayerState};
pub use stats::{format_number, StatsPanel};
