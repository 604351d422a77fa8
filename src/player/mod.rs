//! Ambient Player
//!
//! Synthesizes the layered "zen" soundscape and fades it in and out. The
//! audio context is opened lazily on the first `play()` and reused for the
//! lifetime of the player; layers are rebuilt on every `play()` and torn
//! down on every `stop()`.
//!
//! # Example
//! ```
//! use aura::config::PlayerConfig;
//! use aura::engine::{OfflineBackend, Scheduler};
//! use aura::player::AmbientPlayer;
//!
//! let mut scheduler = Scheduler::new();
//! let mut player = AmbientPlayer::new(OfflineBackend::default(), PlayerConfig::default());
//! player.toggle(&mut scheduler).unwrap();
//! assert!(player.is_playing());
//! assert_eq!(player.layers().len(), 5);
//! ```

pub mod layer;
pub mod state;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::PlayerConfig;
use crate::engine::{
    AudioBackend, AudioContext, AudioParam, ContextState, NodeId, ParamKind, Scheduler,
    TimerHandle,
};
use crate::error::{AuraError, Result};

pub use layer::{LayerNodes, ToneLayer};
pub use state::PlayerState;

/// Play/stop controller for the ambient soundscape
pub struct AmbientPlayer<B: AudioBackend> {
    backend: B,
    config: PlayerConfig,
    rng: StdRng,
    context: Option<B::Context>,
    master: Option<NodeId>,
    layers: Vec<ToneLayer>,
    state: PlayerState,
    /// Stop scheduled at the end of a fade-out
    pending_stop: Option<TimerHandle>,
}

impl<B: AudioBackend> AmbientPlayer<B> {
    /// Player seeded from the operating system
    pub fn new(backend: B, config: PlayerConfig) -> Self {
        Self::with_rng(backend, config, StdRng::from_os_rng())
    }

    /// Player with an explicit random source, for reproducible renders
    pub fn with_rng(backend: B, config: PlayerConfig, rng: StdRng) -> Self {
        Self {
            backend,
            config,
            rng,
            context: None,
            master: None,
            layers: Vec::new(),
            state: PlayerState::Idle,
            pending_stop: None,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// True only while Playing; a fade-out in progress counts as stopped
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Layers of the current (or fading) soundscape
    pub fn layers(&self) -> &[ToneLayer] {
        &self.layers
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn pending_stop(&self) -> Option<TimerHandle> {
        self.pending_stop
    }

    /// The audio context, once the first `play()` opened it
    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut B::Context> {
        self.context.as_mut()
    }

    /// Master gain at the current context time (0 before the first play)
    pub fn master_volume(&self) -> f32 {
        match (&self.context, self.master) {
            (Some(ctx), Some(master)) => ctx.param_value(master, ParamKind::Gain).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Start if stopped or fading out, fade out if playing
    ///
    /// # Errors
    /// * `AudioUnavailable` - the host cannot open an audio context
    pub fn toggle(&mut self, scheduler: &mut Scheduler) -> Result<()> {
        match self.state {
            PlayerState::Playing => self.fade_out(scheduler),
            PlayerState::Idle | PlayerState::FadingOut => self.play(scheduler),
        }
    }

    /// Build a fresh soundscape and fade it in
    ///
    /// No-op while already Playing. During a fade-out the pending stop is
    /// cancelled, the fading layers are swapped for new ones and the master
    /// ramps back up from its current level at the fade-in rate.
    pub fn play(&mut self, scheduler: &mut Scheduler) -> Result<()> {
        let start_level = match self.state {
            PlayerState::Playing => {
                debug!("[PLAYER] Already playing");
                return Ok(());
            }
            PlayerState::FadingOut => {
                let level = self.master_volume();
                debug!("[PLAYER] Restarting during fade-out at level {:.3}", level);
                self.stop(scheduler);
                level
            }
            PlayerState::Idle => 0.0,
        };

        let target = self.config.target_volume;
        let fade_in = self.fade_in_from(start_level);

        let master = self.ensure_context()?;
        let Some(ctx) = self.context.as_mut() else {
            return Err(AuraError::AudioUnavailable {
                reason: "audio context was not created".to_string(),
            });
        };

        if ctx.state() == ContextState::Suspended {
            ctx.resume()?;
        }

        let mut layers = Vec::with_capacity(self.config.tones.len());
        let mut built = Ok(());
        for tone in &self.config.tones {
            match ToneLayer::build(&mut *ctx, master, tone, &self.config, &mut self.rng) {
                Ok(layer) => {
                    debug!(
                        "[PLAYER] layer {:.2} Hz, detune {:+.2} cents, modulator {:.3} Hz",
                        layer.frequency, layer.detune_cents, layer.modulator_frequency
                    );
                    layers.push(layer);
                }
                Err(e) => {
                    built = Err(e);
                    break;
                }
            }
        }

        if built.is_ok() {
            built = ctx.automate(master, ParamKind::Gain, &mut |p: &mut AudioParam, now: f64| {
                p.cancel_scheduled_values(now);
                p.set_value_at_time(start_level, now);
                if fade_in > 0.0 {
                    p.linear_ramp_to_value_at_time(target, now + fade_in);
                } else {
                    p.set_value_at_time(target, now);
                }
            });
        }

        self.layers = layers;
        if let Err(e) = built {
            warn!(
                "[PLAYER] Play failed, releasing {} built layers: {}",
                self.layers.len(),
                e
            );
            self.stop(scheduler);
            return Err(e);
        }

        self.state = PlayerState::Playing;
        info!(
            "[PLAYER] Playing {} layers, fading in over {:.1}s",
            self.layers.len(),
            fade_in
        );
        Ok(())
    }

    /// Time to ramp from `level` to the target at the full fade-in rate
    fn fade_in_from(&self, level: f32) -> f64 {
        let target = self.config.target_volume;
        if target <= 0.0 || level >= target {
            return 0.0;
        }
        self.config.fade_in_secs * f64::from((target - level) / target)
    }

    /// Ramp the master to silence and schedule `stop()` for the end of the
    /// ramp. Only acts while Playing.
    pub fn fade_out(&mut self, scheduler: &mut Scheduler) -> Result<()> {
        if self.state != PlayerState::Playing {
            debug!("[PLAYER] Fade-out ignored in state {}", self.state);
            return Ok(());
        }
        let (Some(ctx), Some(master)) = (self.context.as_mut(), self.master) else {
            return Ok(());
        };

        let duration = self.config.fade_out_secs;
        ctx.automate(master, ParamKind::Gain, &mut |p: &mut AudioParam, now: f64| {
            let current = p.value_at(now);
            p.cancel_scheduled_values(now);
            p.set_value_at_time(current, now);
            p.linear_ramp_to_value_at_time(0.0, now + duration);
        })?;

        self.pending_stop = Some(scheduler.set_timeout(self.config.fade_out_ms()));
        self.state = PlayerState::FadingOut;
        info!("[PLAYER] Fading out over {:.1}s", duration);
        Ok(())
    }

    /// Stop and release every oscillator immediately
    ///
    /// Oscillators that were already stopped are skipped silently. Any
    /// pending fade-out stop is cancelled.
    pub fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(handle) = self.pending_stop.take() {
            scheduler.clear(handle);
        }

        if let Some(ctx) = self.context.as_mut() {
            for layer in &self.layers {
                layer.nodes.release(&mut *ctx);
            }
        }

        if !self.layers.is_empty() {
            info!("[PLAYER] Stopped {} layers", self.layers.len());
        }
        self.layers.clear();
        self.state = PlayerState::Idle;
    }

    /// Handle a fired timer; returns false if it belongs to someone else
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut Scheduler) -> bool {
        if self.pending_stop != Some(handle) {
            return false;
        }
        self.pending_stop = None;
        self.stop(scheduler);
        true
    }

    /// Let context time elapse (offline contexts render here)
    pub fn advance(&mut self, seconds: f64) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.advance(seconds);
        }
    }

    fn ensure_context(&mut self) -> Result<NodeId> {
        if let (Some(_), Some(master)) = (&self.context, self.master) {
            return Ok(master);
        }

        let mut ctx = self.backend.open()?;
        let master = ctx.create_gain(0.0);
        let destination = ctx.destination();
        ctx.connect(master, destination)?;
        info!(
            "[PLAYER] Opened {} audio context at {} Hz",
            self.backend.name(),
            ctx.sample_rate()
        );

        self.context = Some(ctx);
        self.master = Some(master);
        Ok(master)
    }
}
