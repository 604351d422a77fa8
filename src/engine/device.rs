//! Live output through the default audio device
//!
//! The synthesis graph is shared between the control side (the player) and
//! the cpal output callback. The callback pulls frames from the graph, so
//! context time is clocked by the device and `advance` does nothing.

use std::sync::{Arc, Mutex, MutexGuard};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{debug, error, info};

use crate::engine::context::{
    AudioBackend, AudioContext, ContextState, NodeId, ParamKind, Waveform,
};
use crate::engine::graph::SynthGraph;
use crate::engine::param::AudioParam;
use crate::error::{AuraError, Result};

fn unavailable(reason: impl std::fmt::Display) -> AuraError {
    AuraError::AudioUnavailable {
        reason: reason.to_string(),
    }
}

/// Opens contexts on the host's default output device
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceBackend;

impl AudioBackend for DeviceBackend {
    type Context = SharedGraph;

    fn name(&self) -> &'static str {
        "device"
    }

    fn open(&self) -> Result<SharedGraph> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| unavailable("no audio output device available"))?;
        let config = device
            .default_output_config()
            .map_err(|e| unavailable(format!("failed to get default output config: {}", e)))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(unavailable(format!(
                "unsupported sample format: {:?}",
                config.sample_format()
            )));
        }

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let graph = Arc::new(Mutex::new(SynthGraph::new(sample_rate)));

        let render_graph = Arc::clone(&graph);
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut graph = render_graph.lock().unwrap_or_else(|e| e.into_inner());
                    graph.render_into(data, channels);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| unavailable(format!("failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| unavailable(format!("failed to play audio stream: {}", e)))?;

        info!("Audio device opened: {} Hz, {} channels", sample_rate, channels);

        let mut shared = SharedGraph {
            graph,
            _stream: stream,
        };
        shared.resume()?;
        Ok(shared)
    }
}

/// A `SynthGraph` rendered by a live output stream
pub struct SharedGraph {
    graph: Arc<Mutex<SynthGraph>>,
    /// Kept alive for as long as the context exists
    _stream: cpal::Stream,
}

impl SharedGraph {
    fn lock(&self) -> MutexGuard<'_, SynthGraph> {
        self.graph.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for SharedGraph {
    fn drop(&mut self) {
        self.lock().close();
        debug!("Audio device closed");
    }
}

impl AudioContext for SharedGraph {
    fn sample_rate(&self) -> u32 {
        self.lock().sample_rate()
    }

    fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    fn state(&self) -> ContextState {
        self.lock().state()
    }

    fn resume(&mut self) -> Result<()> {
        self.lock().resume()
    }

    fn suspend(&mut self) -> Result<()> {
        self.lock().suspend()
    }

    fn destination(&self) -> NodeId {
        self.lock().destination()
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId {
        self.lock().create_oscillator(waveform, frequency)
    }

    fn create_gain(&mut self, gain: f32) -> NodeId {
        self.lock().create_gain(gain)
    }

    fn connect(&mut self, source: NodeId, target: NodeId) -> Result<()> {
        self.lock().connect(source, target)
    }

    fn connect_param(&mut self, source: NodeId, target: NodeId, param: ParamKind) -> Result<()> {
        self.lock().connect_param(source, target, param)
    }

    fn disconnect(&mut self, node: NodeId) -> Result<()> {
        self.lock().disconnect(node)
    }

    fn start(&mut self, node: NodeId, when: f64) -> Result<()> {
        self.lock().start(node, when)
    }

    fn stop(&mut self, node: NodeId, when: f64) -> Result<()> {
        self.lock().stop(node, when)
    }

    fn automate(
        &mut self,
        node: NodeId,
        param: ParamKind,
        edit: &mut dyn FnMut(&mut AudioParam, f64),
    ) -> Result<()> {
        self.lock().automate(node, param, edit)
    }

    fn param_value(&self, node: NodeId, param: ParamKind) -> Result<f32> {
        self.lock().param_value(node, param)
    }

    fn advance(&mut self, _seconds: f64) {}

    fn active_oscillators(&self) -> usize {
        self.lock().active_oscillators()
    }

    fn node_count(&self) -> usize {
        self.lock().node_count()
    }
}
