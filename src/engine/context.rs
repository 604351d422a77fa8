//! Host Audio Subsystem
//!
//! The `AudioContext` trait is the narrow surface the ambient player drives:
//! node creation, graph wiring, start/stop and parameter automation. An
//! `AudioBackend` knows how to open a context and is the only place where
//! "no audio on this host" can surface.

use std::fmt;

use crate::engine::graph::SynthGraph;
use crate::engine::param::AudioParam;
use crate::error::{AuraError, Result};

/// Handle to a node inside an audio context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index, used in error messages
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample the waveform at a phase in [0, 1)
    #[inline]
    pub fn sample(&self, phase: f64) -> f32 {
        let value = match self {
            Waveform::Sine => (std::f64::consts::TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
        };
        value as f32
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waveform::Sine => write!(f, "sine"),
            Waveform::Square => write!(f, "square"),
            Waveform::Sawtooth => write!(f, "sawtooth"),
            Waveform::Triangle => write!(f, "triangle"),
        }
    }
}

/// Automatable parameters exposed by graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Oscillator frequency in Hz
    Frequency,
    /// Oscillator detune in cents
    Detune,
    /// Gain node multiplier
    Gain,
}

/// Lifecycle state of an audio context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// Time is frozen and output is silent
    #[default]
    Suspended,
    /// Rendering normally
    Running,
    /// Released; no further rendering
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Suspended => write!(f, "suspended"),
            ContextState::Running => write!(f, "running"),
            ContextState::Closed => write!(f, "closed"),
        }
    }
}

/// Audio graph operations consumed by the ambient player
pub trait AudioContext {
    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Context time in seconds; only advances while running
    fn current_time(&self) -> f64;

    /// Current lifecycle state
    fn state(&self) -> ContextState;

    /// Resume a suspended context
    fn resume(&mut self) -> Result<()>;

    /// Suspend rendering; time stops advancing
    fn suspend(&mut self) -> Result<()>;

    /// The final output node
    fn destination(&self) -> NodeId;

    /// Create an oscillator (not yet started)
    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId;

    /// Create a gain node
    fn create_gain(&mut self, gain: f32) -> NodeId;

    /// Route the output of `source` into the input of `target`
    fn connect(&mut self, source: NodeId, target: NodeId) -> Result<()>;

    /// Route the output of `source` onto a parameter of `target`
    fn connect_param(&mut self, source: NodeId, target: NodeId, param: ParamKind) -> Result<()>;

    /// Remove every connection touching `node` and release it
    fn disconnect(&mut self, node: NodeId) -> Result<()>;

    /// Start an oscillator at `when` (context seconds)
    fn start(&mut self, node: NodeId, when: f64) -> Result<()>;

    /// Stop an oscillator at `when`; a second stop fails with `AlreadyStopped`
    fn stop(&mut self, node: NodeId, when: f64) -> Result<()>;

    /// Edit a parameter's automation timeline; the closure receives the
    /// current context time
    fn automate(
        &mut self,
        node: NodeId,
        param: ParamKind,
        edit: &mut dyn FnMut(&mut AudioParam, f64),
    ) -> Result<()>;

    /// Parameter value at the current context time
    fn param_value(&self, node: NodeId, param: ParamKind) -> Result<f32>;

    /// Let `seconds` of context time elapse. Offline contexts render here;
    /// device contexts are clocked by the output stream and ignore it.
    fn advance(&mut self, seconds: f64);

    /// Number of oscillators that are started and not yet stopped
    fn active_oscillators(&self) -> usize;

    /// Number of live nodes, including the destination
    fn node_count(&self) -> usize;
}

/// Something that can open an audio context on this host
pub trait AudioBackend {
    /// Context type produced by this backend
    type Context: AudioContext;

    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;

    /// Open a new context, or fail with `AudioUnavailable`
    fn open(&self) -> Result<Self::Context>;
}

// ============================================================================
// Offline Backend
// ============================================================================

/// Renders into memory at a fixed sample rate
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    /// Render sample rate in Hz
    pub sample_rate: u32,
    /// Keep rendered samples for later export
    pub capture: bool,
}

impl OfflineBackend {
    /// Backend that keeps time but discards output
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            capture: false,
        }
    }

    /// Backend that records everything it renders
    pub fn capturing(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            capture: true,
        }
    }
}

impl Default for OfflineBackend {
    fn default() -> Self {
        Self::new(crate::engine::DEFAULT_SAMPLE_RATE)
    }
}

impl AudioBackend for OfflineBackend {
    type Context = SynthGraph;

    fn name(&self) -> &'static str {
        "offline"
    }

    fn open(&self) -> Result<SynthGraph> {
        if self.sample_rate == 0 {
            return Err(AuraError::AudioUnavailable {
                reason: "sample rate must be positive".to_string(),
            });
        }
        let mut graph = SynthGraph::new(self.sample_rate);
        if self.capture {
            graph.enable_capture();
        }
        graph.resume()?;
        Ok(graph)
    }
}

// ============================================================================
// Unavailable Backend
// ============================================================================

/// A host without any audio capability
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for UnavailableBackend {
    fn default() -> Self {
        Self::new("host provides no audio subsystem")
    }
}

impl AudioBackend for UnavailableBackend {
    type Context = SynthGraph;

    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn open(&self) -> Result<SynthGraph> {
        Err(AuraError::AudioUnavailable {
            reason: self.reason.clone(),
        })
    }
}
