//! Tone layers
//!
//! A layer is one voice of the soundscape:
//!
//! ```text
//!   modulator -> modulator gain (depth Hz) -> oscillator.frequency
//!   oscillator -> layer gain (volume) -> master
//! ```

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;

use crate::config::{PlayerConfig, ToneSpec};
use crate::engine::{AudioContext, AudioParam, NodeId, ParamKind, Waveform};
use crate::error::{AuraError, Result};

/// Graph nodes owned by one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerNodes {
    pub oscillator: NodeId,
    pub gain: NodeId,
    pub modulator: NodeId,
    pub modulator_gain: NodeId,
}

impl LayerNodes {
    /// Nodes that were started and must be stopped
    pub fn sources(&self) -> [NodeId; 2] {
        [self.oscillator, self.modulator]
    }

    /// Every node of the layer, sources first
    pub fn all(&self) -> [NodeId; 4] {
        [self.oscillator, self.modulator, self.gain, self.modulator_gain]
    }

    /// Stop both sources at the current time and release every node
    ///
    /// Sources that were already stopped are skipped; other failures are
    /// logged and the teardown carries on.
    pub fn release<C: AudioContext + ?Sized>(&self, ctx: &mut C) {
        let now = ctx.current_time();
        for source in self.sources() {
            match ctx.stop(source, now) {
                Ok(()) => {}
                Err(AuraError::AlreadyStopped { .. }) => {
                    debug!("[PLAYER] {} was already stopped", source);
                }
                Err(e) => warn!("[PLAYER] Failed to stop {}: {}", source, e),
            }
        }
        for node in self.all() {
            if let Err(e) = ctx.disconnect(node) {
                warn!("[PLAYER] Failed to release {}: {}", node, e);
            }
        }
    }
}

/// One sounding voice and the random parameters it was built with
#[derive(Debug, Clone, PartialEq)]
pub struct ToneLayer {
    pub frequency: f32,
    pub waveform: Waveform,
    pub volume: f32,
    pub detune_cents: f32,
    pub modulator_frequency: f32,
    pub nodes: LayerNodes,
}

impl ToneLayer {
    /// Create, wire and start a layer feeding `master`
    pub fn build<C: AudioContext + ?Sized>(
        ctx: &mut C,
        master: NodeId,
        tone: &ToneSpec,
        config: &PlayerConfig,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let range = config.detune_range_cents;
        let detune_cents = rng.random_range(-range..=range);
        let modulator_frequency =
            rng.random_range(config.modulator_min_hz..=config.modulator_max_hz);

        let nodes = LayerNodes {
            oscillator: ctx.create_oscillator(tone.waveform, tone.frequency),
            gain: ctx.create_gain(tone.volume),
            modulator: ctx.create_oscillator(Waveform::Sine, modulator_frequency),
            modulator_gain: ctx.create_gain(config.modulator_depth_hz),
        };
        if let Err(e) = Self::wire(&mut *ctx, master, &nodes, detune_cents) {
            nodes.release(ctx);
            return Err(e);
        }

        Ok(Self {
            frequency: tone.frequency,
            waveform: tone.waveform,
            volume: tone.volume,
            detune_cents,
            modulator_frequency,
            nodes,
        })
    }

    fn wire<C: AudioContext + ?Sized>(
        ctx: &mut C,
        master: NodeId,
        nodes: &LayerNodes,
        detune_cents: f32,
    ) -> Result<()> {
        ctx.automate(nodes.oscillator, ParamKind::Detune, &mut |p: &mut AudioParam, _: f64| {
            p.set_value(detune_cents)
        })?;
        ctx.connect(nodes.oscillator, nodes.gain)?;
        ctx.connect(nodes.gain, master)?;
        ctx.connect(nodes.modulator, nodes.modulator_gain)?;
        ctx.connect_param(nodes.modulator_gain, nodes.oscillator, ParamKind::Frequency)?;

        let now = ctx.current_time();
        ctx.start(nodes.oscillator, now)?;
        ctx.start(nodes.modulator, now)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AudioBackend, OfflineBackend};
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn test_build_wires_and_starts_both_sources() {
        let mut ctx = OfflineBackend::new(8000).open().unwrap();
        let master = ctx.create_gain(1.0);
        let dest = ctx.destination();
        ctx.connect(master, dest).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let config = PlayerConfig::default();
        let layer =
            ToneLayer::build(&mut ctx, master, &config.tones[0], &config, &mut rng).unwrap();

        assert_eq!(ctx.active_oscillators(), 2);
        assert_eq!(ctx.node_count(), 6);
        assert_relative_eq!(
            ctx.param_value(layer.nodes.oscillator, ParamKind::Detune).unwrap(),
            layer.detune_cents
        );
        assert_relative_eq!(
            ctx.param_value(layer.nodes.gain, ParamKind::Gain).unwrap(),
            0.15
        );
        assert_relative_eq!(
            ctx.param_value(layer.nodes.modulator_gain, ParamKind::Gain).unwrap(),
            2.0
        );
        assert_relative_eq!(
            ctx.param_value(layer.nodes.modulator, ParamKind::Frequency).unwrap(),
            layer.modulator_frequency
        );
    }

    #[test]
    fn test_zero_detune_range_gives_zero_detune() {
        let mut ctx = OfflineBackend::new(8000).open().unwrap();
        let master = ctx.create_gain(1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let config = PlayerConfig {
            detune_range_cents: 0.0,
            ..PlayerConfig::default()
        };
        let layer =
            ToneLayer::build(&mut ctx, master, &config.tones[1], &config, &mut rng).unwrap();
        assert_eq!(layer.detune_cents, 0.0);
    }
}
