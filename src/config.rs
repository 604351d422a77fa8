//! Configuration
//!
//! Every tunable of the page controllers lives here. Defaults reproduce the
//! shipped landing page exactly; a JSON file may override any subset.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::Waveform;
use crate::error::{AuraError, Result};

// ============================================================================
// Player
// ============================================================================

/// One voice of the ambient palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    /// Base frequency in Hz
    pub frequency: f32,
    /// Layer gain in [0, 1]
    pub volume: f32,
    #[serde(default)]
    pub waveform: Waveform,
}

impl ToneSpec {
    pub fn sine(frequency: f32, volume: f32) -> Self {
        Self {
            frequency,
            volume,
            waveform: Waveform::Sine,
        }
    }
}

/// Ambient player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Tone palette, lowest voice first
    pub tones: Vec<ToneSpec>,
    /// Master volume reached at the end of the fade-in
    pub target_volume: f32,
    pub fade_in_secs: f64,
    pub fade_out_secs: f64,
    /// Detune is drawn uniformly from [-range, +range] cents
    pub detune_range_cents: f32,
    pub modulator_min_hz: f32,
    pub modulator_max_hz: f32,
    /// Peak frequency deviation applied by each modulator, in Hz
    pub modulator_depth_hz: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tones: vec![
                ToneSpec::sine(174.0, 0.15),   // root
                ToneSpec::sine(261.63, 0.12),  // C4
                ToneSpec::sine(329.63, 0.10),  // E4
                ToneSpec::sine(392.0, 0.08),   // G4
                ToneSpec::sine(523.25, 0.06),  // C5
            ],
            target_volume: 0.3,
            fade_in_secs: 2.0,
            fade_out_secs: 1.5,
            detune_range_cents: 5.0,
            modulator_min_hz: 0.1,
            modulator_max_hz: 0.3,
            modulator_depth_hz: 2.0,
        }
    }
}

impl PlayerConfig {
    /// Fade-out duration in whole milliseconds, for the stop timer
    pub fn fade_out_ms(&self) -> u64 {
        (self.fade_out_secs * 1000.0).round() as u64
    }

    fn validate(&self) -> Result<()> {
        if self.tones.is_empty() {
            return invalid("player.tones must not be empty");
        }
        for (i, tone) in self.tones.iter().enumerate() {
            if !(tone.frequency > 0.0 && tone.frequency.is_finite()) {
                return invalid(format!("player.tones[{}].frequency must be positive", i));
            }
            if !(0.0..=1.0).contains(&tone.volume) {
                return invalid(format!("player.tones[{}].volume must lie in [0, 1]", i));
            }
        }
        if !(0.0..=1.0).contains(&self.target_volume) {
            return invalid("player.target_volume must lie in [0, 1]");
        }
        if !(self.fade_in_secs > 0.0 && self.fade_out_secs > 0.0) {
            return invalid("player fade durations must be positive");
        }
        if !(self.detune_range_cents >= 0.0) {
            return invalid("player.detune_range_cents must not be negative");
        }
        if !(self.modulator_min_hz > 0.0 && self.modulator_min_hz <= self.modulator_max_hz) {
            return invalid("player modulator range must satisfy 0 < min <= max");
        }
        Ok(())
    }
}

// ============================================================================
// Carousel
// ============================================================================

/// Auto-carousel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Time each slide stays up before auto-advance
    pub autoplay_delay_ms: u64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay_delay_ms: 5000,
        }
    }
}

// ============================================================================
// Stats
// ============================================================================

/// What one stat slot shows once revealed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StatSpec {
    /// Count up from zero to `target`
    Animated { target: u64 },
    /// Show a fixed label immediately
    Fixed { label: String },
}

/// Stats counter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub duration_ms: u64,
    pub tick_ms: u64,
    pub counters: Vec<StatSpec>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            tick_ms: 16,
            counters: vec![
                StatSpec::Animated { target: 500_000 },
                StatSpec::Fixed {
                    label: "4.9".to_string(),
                },
                StatSpec::Animated { target: 10_000_000 },
            ],
        }
    }
}

// ============================================================================
// Top level
// ============================================================================

/// Complete page configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraConfig {
    pub player: PlayerConfig,
    pub carousel: CarouselConfig,
    pub stats: StatsConfig,
}

impl AuraConfig {
    /// Load and validate a JSON configuration file
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: AuraConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every section for values the controllers cannot honor
    pub fn validate(&self) -> Result<()> {
        self.player.validate()?;
        if self.carousel.autoplay_delay_ms == 0 {
            return invalid("carousel.autoplay_delay_ms must be positive");
        }
        if self.stats.tick_ms == 0 || self.stats.duration_ms < self.stats.tick_ms {
            return invalid("stats.tick_ms must be positive and no longer than stats.duration_ms");
        }
        Ok(())
    }
}

fn invalid<T>(reason: impl Into<String>) -> Result<T> {
    Err(AuraError::InvalidConfig {
        reason: reason.into(),
    })
}
