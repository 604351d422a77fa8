//! Audio Buffer
//!
//! Non-interleaved 32-bit float buffers produced by the offline renderer
//! and consumed by the WAV exporter and the level meters used in tests.

// ============================================================================
// Constants
// ============================================================================

/// Default render sample rate (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Threshold below which audio is considered silent (-80dBFS)
pub const SILENCE_THRESHOLD_DB: f32 = -80.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of an audio buffer in dB
///
/// Returns `f32::NEG_INFINITY` for empty or silent buffers.
pub fn calculate_rms(buffer: &AudioBuffer) -> f32 {
    let total_samples = buffer.num_channels() * buffer.len();
    if total_samples == 0 {
        return f32::NEG_INFINITY;
    }

    let sum_squares: f64 = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| (s as f64) * (s as f64))
        .sum();

    let rms = (sum_squares / total_samples as f64).sqrt() as f32;
    linear_to_db(rms)
}

/// Calculate the peak level of an audio buffer in dB
pub fn calculate_peak(buffer: &AudioBuffer) -> f32 {
    let peak = buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    linear_to_db(peak)
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Rendered audio, one `Vec<f32>` per channel
///
/// # Example
/// ```
/// use aura::engine::{AudioBuffer, ChannelLayout, DEFAULT_SAMPLE_RATE};
///
/// let buffer = AudioBuffer::new(DEFAULT_SAMPLE_RATE as usize, ChannelLayout::Stereo, DEFAULT_SAMPLE_RATE);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer with `num_samples` samples per channel
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Wrap mono samples, duplicating them across the requested layout
    pub fn from_mono(mono: Vec<f32>, layout: ChannelLayout, sample_rate: u32) -> Self {
        let samples = match layout {
            ChannelLayout::Mono => vec![mono],
            ChannelLayout::Stereo => vec![mono.clone(), mono],
        };
        Self {
            samples,
            sample_rate,
        }
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.num_channels();
        let num_samples = self.len();

        if num_channels == 0 || num_samples == 0 {
            return Vec::new();
        }

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }
        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.num_channels())
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// A slice of this buffer between two times, in seconds
    pub fn slice_secs(&self, start: f64, end: f64) -> AudioBuffer {
        let to_index = |t: f64| ((t.max(0.0) * self.sample_rate as f64) as usize).min(self.len());
        let (from, to) = (to_index(start), to_index(end));
        let to = to.max(from);
        AudioBuffer {
            samples: self
                .samples
                .iter()
                .map(|ch| ch[from..to].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// True when the RMS level is at or below -80dBFS
    pub fn is_silent(&self) -> bool {
        calculate_rms(self) <= SILENCE_THRESHOLD_DB
    }

    /// Check if all samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        self.samples
            .iter()
            .flat_map(|ch| ch.iter())
            .all(|s| s.is_finite())
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(0, ChannelLayout::Mono, DEFAULT_SAMPLE_RATE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_to_linear() {
        assert_relative_eq!(db_to_linear(0.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(db_to_linear(-20.0), 0.1, epsilon = 1e-6);
        assert!(db_to_linear(-120.0) < 1e-5);
    }

    #[test]
    fn test_linear_to_db() {
        assert_relative_eq!(linear_to_db(0.1), -20.0, epsilon = 1e-4);
        assert!(linear_to_db(0.0).is_infinite() && linear_to_db(0.0).is_sign_negative());
    }

    #[test]
    fn test_calculate_rms_silence() {
        let buffer = AudioBuffer::new(1000, ChannelLayout::Mono, DEFAULT_SAMPLE_RATE);
        assert!(calculate_rms(&buffer).is_infinite());
        assert!(buffer.is_silent());
    }

    #[test]
    fn test_calculate_rms_and_peak_of_dc() {
        let buffer = AudioBuffer::from_mono(vec![0.5; 1000], ChannelLayout::Stereo, 48000);
        assert_relative_eq!(calculate_rms(&buffer), linear_to_db(0.5), epsilon = 1e-3);
        assert_relative_eq!(calculate_peak(&buffer), linear_to_db(0.5), epsilon = 1e-3);
        assert!(!buffer.is_silent());
    }

    #[test]
    fn test_from_mono_stereo_interleaves_identical_channels() {
        let buffer = AudioBuffer::from_mono(vec![0.1, 0.2], ChannelLayout::Stereo, 48000);
        assert_eq!(buffer.channel_layout(), Some(ChannelLayout::Stereo));
        assert_eq!(buffer.to_interleaved(), vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_slice_secs_clamps_to_buffer() {
        let buffer = AudioBuffer::new(48000, ChannelLayout::Mono, 48000);
        assert_eq!(buffer.slice_secs(0.25, 0.5).len(), 12000);
        assert_eq!(buffer.slice_secs(0.75, 5.0).len(), 12000);
        assert!(buffer.slice_secs(2.0, 1.0).is_empty());
    }
}
