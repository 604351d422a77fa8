//! Audio Engine Module
//!
//! The host facilities the page controllers consume:
//! - Audio buffers and WAV export
//! - Parameter automation timelines
//! - The audio context trait and its software synthesis graph
//! - A virtual millisecond timer scheduler

pub mod buffer;
pub mod context;
#[cfg(feature = "device")]
pub mod device;
pub mod graph;
pub mod io;
pub mod param;
pub mod scheduler;

pub use buffer::{
    calculate_peak, calculate_rms, db_to_linear, linear_to_db, AudioBuffer, ChannelLayout,
    DEFAULT_SAMPLE_RATE,
};
pub use context::{
    AudioBackend, AudioContext, ContextState, NodeId, OfflineBackend, ParamKind,
    UnavailableBackend, Waveform,
};
#[cfg(feature = "device")]
pub use device::{DeviceBackend, SharedGraph};
pub use graph::SynthGraph;
pub use io::{export_audio, ExportFormat};
pub use param::{AudioParam, AutomationEvent};
pub use scheduler::{FiredTimer, Scheduler, TimerHandle};
