//! Software Synthesis Graph
//!
//! `SynthGraph` is the in-process implementation of `AudioContext`: an arena
//! of oscillator, gain and destination nodes rendered one sample at a time.
//! Connections onto a parameter add the source signal to the parameter's
//! own value at audio rate, which is how the player's slow modulators bend
//! each layer's pitch.

use log::debug;

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::engine::context::{AudioContext, ContextState, NodeId, ParamKind, Waveform};
use crate::engine::param::AudioParam;
use crate::error::{AuraError, Result};

/// Frames rendered between automation clean-ups
const COLLAPSE_INTERVAL_FRAMES: u64 = 1024;

/// Slot 0 is always the destination
const DESTINATION: NodeId = NodeId(0);

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone)]
struct OscillatorNode {
    waveform: Waveform,
    frequency: AudioParam,
    detune: AudioParam,
    /// Normalized phase in [0, 1)
    phase: f64,
    start_time: Option<f64>,
    stop_time: Option<f64>,
}

impl OscillatorNode {
    fn is_sounding(&self, time: f64) -> bool {
        match self.start_time {
            Some(start) => start <= time && self.stop_time.map_or(true, |stop| time < stop),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Destination,
    Oscillator(OscillatorNode),
    Gain { gain: AudioParam },
}

impl Node {
    fn kind_name(&self) -> &'static str {
        match self {
            Node::Destination => "destination",
            Node::Oscillator(_) => "oscillator",
            Node::Gain { .. } => "gain",
        }
    }

    fn accepts_input(&self) -> bool {
        !matches!(self, Node::Oscillator(_))
    }

    fn param(&self, kind: ParamKind) -> Option<&AudioParam> {
        match (self, kind) {
            (Node::Oscillator(osc), ParamKind::Frequency) => Some(&osc.frequency),
            (Node::Oscillator(osc), ParamKind::Detune) => Some(&osc.detune),
            (Node::Gain { gain }, ParamKind::Gain) => Some(gain),
            _ => None,
        }
    }

    fn param_mut(&mut self, kind: ParamKind) -> Option<&mut AudioParam> {
        match (self, kind) {
            (Node::Oscillator(osc), ParamKind::Frequency) => Some(&mut osc.frequency),
            (Node::Oscillator(osc), ParamKind::Detune) => Some(&mut osc.detune),
            (Node::Gain { gain }, ParamKind::Gain) => Some(gain),
            _ => None,
        }
    }

    fn params_mut(&mut self) -> Vec<&mut AudioParam> {
        match self {
            Node::Destination => Vec::new(),
            Node::Oscillator(osc) => vec![&mut osc.frequency, &mut osc.detune],
            Node::Gain { gain } => vec![gain],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Connection {
    source: NodeId,
    target: NodeId,
    /// `None` for the node input, `Some` for a parameter input
    param: Option<ParamKind>,
}

/// Per-sample evaluation state of a node
#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Pending,
    Visiting,
    Done(f32),
}

// ============================================================================
// Synth Graph
// ============================================================================

/// In-process audio graph renderer
///
/// # Example
/// ```
/// use aura::engine::{AudioContext, OfflineBackend, AudioBackend, Waveform};
///
/// let mut ctx = OfflineBackend::capturing(8000).open().unwrap();
/// let osc = ctx.create_oscillator(Waveform::Sine, 440.0);
/// let out = ctx.destination();
/// ctx.connect(osc, out).unwrap();
/// ctx.start(osc, 0.0).unwrap();
/// ctx.advance(0.5);
/// assert_eq!(ctx.take_capture().len(), 4000);
/// ```
#[derive(Debug, Clone)]
pub struct SynthGraph {
    sample_rate: u32,
    state: ContextState,
    nodes: Vec<Option<Node>>,
    connections: Vec<Connection>,
    /// Incoming connections per node, rebuilt when the topology changes
    inputs: Vec<Vec<(NodeId, Option<ParamKind>)>>,
    topology_dirty: bool,
    frames_rendered: u64,
    /// Context time requested through `advance`, kept fractional so that
    /// repeated short advances do not drift
    scheduled_time: f64,
    capture: Option<Vec<f32>>,
    slots: Vec<Slot>,
    increments: Vec<f64>,
}

impl SynthGraph {
    /// Create a suspended graph containing only the destination
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            state: ContextState::Suspended,
            nodes: vec![Some(Node::Destination)],
            connections: Vec::new(),
            inputs: Vec::new(),
            topology_dirty: true,
            frames_rendered: 0,
            scheduled_time: 0.0,
            capture: None,
            slots: Vec::new(),
            increments: Vec::new(),
        }
    }

    /// Start recording rendered output
    pub fn enable_capture(&mut self) {
        if self.capture.is_none() {
            self.capture = Some(Vec::new());
        }
    }

    /// Whether rendered output is being recorded
    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Drain everything captured so far into a mono buffer
    pub fn take_capture(&mut self) -> AudioBuffer {
        let samples = self
            .capture
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default();
        AudioBuffer::from_mono(samples, ChannelLayout::Mono, self.sample_rate)
    }

    /// Total frames rendered since creation
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Close the graph; it renders silence from now on
    pub fn close(&mut self) {
        self.state = ContextState::Closed;
        self.nodes.truncate(1);
        self.connections.clear();
        self.topology_dirty = true;
    }

    /// Render `out.len() / channels` frames, writing the same sample to
    /// every channel of each frame
    pub fn render_into(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        if self.state != ContextState::Running {
            out.iter_mut().for_each(|s| *s = 0.0);
            return;
        }

        for frame in out.chunks_mut(channels) {
            let sample = self.render_frame();
            frame.iter_mut().for_each(|s| *s = sample);
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .and_then(|n| n.as_ref())
            .ok_or(AuraError::UnknownNode { node: id.0 })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(|n| n.as_mut())
            .ok_or(AuraError::UnknownNode { node: id.0 })
    }

    fn oscillator_mut(&mut self, id: NodeId) -> Result<&mut OscillatorNode> {
        match self.node_mut(id)? {
            Node::Oscillator(osc) => Ok(osc),
            other => Err(AuraError::InvalidConnection {
                reason: format!("{} is a {}, not an oscillator", id, other.kind_name()),
            }),
        }
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        // Reuse released slots so long sessions do not grow the arena
        let id = match self.nodes.iter().skip(1).position(|n| n.is_none()) {
            Some(free) => {
                self.nodes[free + 1] = Some(node);
                NodeId(free + 1)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        self.topology_dirty = true;
        id
    }

    fn rebuild_inputs(&mut self) {
        self.inputs = vec![Vec::new(); self.nodes.len()];
        for c in &self.connections {
            self.inputs[c.target.0].push((c.source, c.param));
        }
        self.slots = vec![Slot::Pending; self.nodes.len()];
        self.increments = vec![0.0; self.nodes.len()];
        self.topology_dirty = false;
    }

    fn time_of_frame(&self, frame: u64) -> f64 {
        frame as f64 / self.sample_rate as f64
    }

    fn render_frame(&mut self) -> f32 {
        if self.topology_dirty {
            self.rebuild_inputs();
        }

        let time = self.time_of_frame(self.frames_rendered);
        let mut slots = std::mem::take(&mut self.slots);
        let mut increments = std::mem::take(&mut self.increments);
        slots.iter_mut().for_each(|s| *s = Slot::Pending);
        increments.iter_mut().for_each(|i| *i = 0.0);

        let sample = self.evaluate(DESTINATION, time, &mut slots, &mut increments);

        for (node, inc) in self.nodes.iter_mut().zip(increments.iter()) {
            if let Some(Node::Oscillator(osc)) = node {
                if *inc != 0.0 {
                    osc.phase = (osc.phase + inc).rem_euclid(1.0);
                }
            }
        }

        self.slots = slots;
        self.increments = increments;
        self.frames_rendered += 1;

        if self.frames_rendered % COLLAPSE_INTERVAL_FRAMES == 0 {
            let now = self.time_of_frame(self.frames_rendered);
            for node in self.nodes.iter_mut().flatten() {
                for param in node.params_mut() {
                    param.collapse_before(now);
                }
            }
        }

        sample
    }

    fn evaluate(&self, id: NodeId, time: f64, slots: &mut [Slot], increments: &mut [f64]) -> f32 {
        match slots[id.0] {
            Slot::Done(value) => return value,
            // Feedback loops contribute silence
            Slot::Visiting => return 0.0,
            Slot::Pending => {}
        }
        slots[id.0] = Slot::Visiting;

        let mut input_sum = 0.0_f32;
        let mut frequency_mod = 0.0_f32;
        let mut detune_mod = 0.0_f32;
        let mut gain_mod = 0.0_f32;
        for &(source, param) in &self.inputs[id.0] {
            let value = self.evaluate(source, time, slots, increments);
            match param {
                None => input_sum += value,
                Some(ParamKind::Frequency) => frequency_mod += value,
                Some(ParamKind::Detune) => detune_mod += value,
                Some(ParamKind::Gain) => gain_mod += value,
            }
        }

        let output = match &self.nodes[id.0] {
            Some(Node::Destination) => input_sum,
            Some(Node::Gain { gain }) => input_sum * (gain.value_at(time) + gain_mod),
            Some(Node::Oscillator(osc)) => {
                if osc.is_sounding(time) {
                    let frequency = osc.frequency.value_at(time) + frequency_mod;
                    let cents = osc.detune.value_at(time) + detune_mod;
                    let effective = frequency as f64 * 2f64.powf(cents as f64 / 1200.0);
                    increments[id.0] = effective / self.sample_rate as f64;
                    osc.waveform.sample(osc.phase)
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        slots[id.0] = Slot::Done(output);
        output
    }
}

impl AudioContext for SynthGraph {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.time_of_frame(self.frames_rendered)
    }

    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<()> {
        match self.state {
            ContextState::Closed => Err(AuraError::AudioUnavailable {
                reason: "audio context is closed".to_string(),
            }),
            _ => {
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    fn suspend(&mut self) -> Result<()> {
        match self.state {
            ContextState::Closed => Err(AuraError::AudioUnavailable {
                reason: "audio context is closed".to_string(),
            }),
            _ => {
                self.state = ContextState::Suspended;
                Ok(())
            }
        }
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId {
        self.add_node(Node::Oscillator(OscillatorNode {
            waveform,
            frequency: AudioParam::new(frequency),
            detune: AudioParam::new(0.0),
            phase: 0.0,
            start_time: None,
            stop_time: None,
        }))
    }

    fn create_gain(&mut self, gain: f32) -> NodeId {
        self.add_node(Node::Gain {
            gain: AudioParam::new(gain),
        })
    }

    fn connect(&mut self, source: NodeId, target: NodeId) -> Result<()> {
        self.node(source)?;
        let target_node = self.node(target)?;
        if !target_node.accepts_input() {
            return Err(AuraError::InvalidConnection {
                reason: format!("{} ({}) has no input", target, target_node.kind_name()),
            });
        }
        if source == DESTINATION {
            return Err(AuraError::InvalidConnection {
                reason: "the destination has no output".to_string(),
            });
        }
        self.connections.push(Connection {
            source,
            target,
            param: None,
        });
        self.topology_dirty = true;
        Ok(())
    }

    fn connect_param(&mut self, source: NodeId, target: NodeId, param: ParamKind) -> Result<()> {
        self.node(source)?;
        let target_node = self.node(target)?;
        if target_node.param(param).is_none() {
            return Err(AuraError::InvalidConnection {
                reason: format!("{} ({}) has no {:?} parameter", target, target_node.kind_name(), param),
            });
        }
        self.connections.push(Connection {
            source,
            target,
            param: Some(param),
        });
        self.topology_dirty = true;
        Ok(())
    }

    fn disconnect(&mut self, node: NodeId) -> Result<()> {
        if node == DESTINATION {
            return Err(AuraError::InvalidConnection {
                reason: "the destination cannot be released".to_string(),
            });
        }
        self.node(node)?;
        self.connections
            .retain(|c| c.source != node && c.target != node);
        self.nodes[node.0] = None;
        self.topology_dirty = true;
        Ok(())
    }

    fn start(&mut self, node: NodeId, when: f64) -> Result<()> {
        let osc = self.oscillator_mut(node)?;
        if osc.start_time.is_none() {
            osc.start_time = Some(when);
        } else {
            debug!("{} already started", node);
        }
        Ok(())
    }

    fn stop(&mut self, node: NodeId, when: f64) -> Result<()> {
        let osc = self.oscillator_mut(node)?;
        if osc.stop_time.is_some() {
            return Err(AuraError::AlreadyStopped { node: node.0 });
        }
        osc.stop_time = Some(when);
        Ok(())
    }

    fn automate(
        &mut self,
        node: NodeId,
        param: ParamKind,
        edit: &mut dyn FnMut(&mut AudioParam, f64),
    ) -> Result<()> {
        let now = self.current_time();
        let target = self.node_mut(node)?;
        let kind_name = target.kind_name();
        match target.param_mut(param) {
            Some(p) => {
                edit(p, now);
                Ok(())
            }
            None => Err(AuraError::InvalidConnection {
                reason: format!("{} ({}) has no {:?} parameter", node, kind_name, param),
            }),
        }
    }

    fn param_value(&self, node: NodeId, param: ParamKind) -> Result<f32> {
        let target = self.node(node)?;
        target
            .param(param)
            .map(|p| p.value_at(self.current_time()))
            .ok_or_else(|| AuraError::InvalidConnection {
                reason: format!("{} ({}) has no {:?} parameter", node, target.kind_name(), param),
            })
    }

    fn advance(&mut self, seconds: f64) {
        if self.state != ContextState::Running || seconds <= 0.0 {
            return;
        }
        self.scheduled_time += seconds;
        let target_frame = (self.scheduled_time * self.sample_rate as f64).round() as u64;
        let frames = target_frame.saturating_sub(self.frames_rendered) as usize;
        if frames == 0 {
            return;
        }

        match self.capture.take() {
            Some(mut captured) => {
                let start = captured.len();
                captured.resize(start + frames, 0.0);
                self.render_into(&mut captured[start..], 1);
                self.capture = Some(captured);
            }
            None if self.active_oscillators() == 0 => {
                // Nothing audible and nothing recorded: only the clock moves
                self.frames_rendered += frames as u64;
            }
            None => {
                let mut scratch = vec![0.0_f32; frames];
                self.render_into(&mut scratch, 1);
            }
        }
    }

    fn active_oscillators(&self) -> usize {
        let now = self.current_time();
        self.nodes
            .iter()
            .flatten()
            .filter(|n| match n {
                Node::Oscillator(osc) => {
                    osc.start_time.is_some() && osc.stop_time.map_or(true, |stop| now < stop)
                }
                _ => false,
            })
            .count()
    }

    fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }
}
