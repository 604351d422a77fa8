//! Ambient Player Tests
//!
//! Play/stop lifecycle, fade envelopes, randomized layer parameters and the
//! rendered audio.

use approx::assert_relative_eq;
use aura::config::PlayerConfig;
use aura::engine::{calculate_rms, AudioContext, OfflineBackend, Scheduler};
use aura::{AmbientPlayer, PlayerState};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn player(seed: u64) -> AmbientPlayer<OfflineBackend> {
    AmbientPlayer::with_rng(
        OfflineBackend::capturing(8000),
        PlayerConfig::default(),
        StdRng::seed_from_u64(seed),
    )
}

/// Drive timers and audio together, the way the page does
fn run(player: &mut AmbientPlayer<OfflineBackend>, scheduler: &mut Scheduler, until_ms: u64) {
    let mut synced = scheduler.now_ms();
    while let Some(fired) = scheduler.pop_due(until_ms) {
        player.advance((fired.at_ms - synced) as f64 / 1000.0);
        synced = fired.at_ms;
        player.on_timer(fired.handle, scheduler);
    }
    player.advance((until_ms - synced) as f64 / 1000.0);
    scheduler.advance_to(until_ms);
}

// === Lifecycle ===

#[test]
fn test_play_and_stop_are_immediate() {
    let mut scheduler = Scheduler::new();
    let mut p = player(1);

    p.play(&mut scheduler).unwrap();
    assert!(p.is_playing());
    assert_eq!(p.layers().len(), 5);
    assert_eq!(p.context().unwrap().active_oscillators(), 10);

    p.stop(&mut scheduler);
    assert!(!p.is_playing());
    assert!(p.layers().is_empty());
    assert_eq!(p.context().unwrap().active_oscillators(), 0);
}

#[test]
fn test_double_toggle_ends_stopped_after_fade() {
    let mut scheduler = Scheduler::new();
    let mut p = player(2);
    p.toggle(&mut scheduler).unwrap();
    p.toggle(&mut scheduler).unwrap();
    assert!(!p.is_playing());
    assert_eq!(p.state(), PlayerState::FadingOut);

    run(&mut p, &mut scheduler, 1499);
    assert_eq!(p.layers().len(), 5);

    run(&mut p, &mut scheduler, 1500);
    assert_eq!(p.state(), PlayerState::Idle);
    assert!(p.layers().is_empty());
    assert_eq!(scheduler.active_count(), 0);
}

#[test]
fn test_repeated_toggles_leave_one_pending_stop_at_most() {
    let mut scheduler = Scheduler::new();
    let mut p = player(3);
    for i in 0..7 {
        p.toggle(&mut scheduler).unwrap();
        run(&mut p, &mut scheduler, (i + 1) * 300);
        assert!(scheduler.active_count() <= 1);
    }
    // Odd number of toggles: playing
    assert!(p.is_playing());
    assert_eq!(p.context().unwrap().active_oscillators(), 10);
}

#[test]
fn test_layers_are_rebuilt_on_every_play() {
    let mut scheduler = Scheduler::new();
    let mut p = player(4);
    p.play(&mut scheduler).unwrap();
    let first: Vec<f32> = p.layers().iter().map(|l| l.detune_cents).collect();
    p.stop(&mut scheduler);
    p.play(&mut scheduler).unwrap();
    let second: Vec<f32> = p.layers().iter().map(|l| l.detune_cents).collect();
    assert_ne!(first, second);
}

// === Layer parameters ===

#[test]
fn test_layer_palette_and_random_ranges() {
    let mut scheduler = Scheduler::new();
    for seed in 0..20 {
        let mut p = player(seed);
        p.play(&mut scheduler).unwrap();

        let freqs: Vec<f32> = p.layers().iter().map(|l| l.frequency).collect();
        assert_eq!(freqs, vec![174.0, 261.63, 329.63, 392.0, 523.25]);
        for layer in p.layers() {
            assert!((-5.0..=5.0).contains(&layer.detune_cents));
            assert!((0.1..=0.3).contains(&layer.modulator_frequency));
        }
        p.stop(&mut scheduler);
    }
}

#[test]
fn test_same_seed_same_soundscape() {
    let mut scheduler = Scheduler::new();
    let mut a = player(99);
    let mut b = player(99);
    a.play(&mut scheduler).unwrap();
    b.play(&mut scheduler).unwrap();
    assert_eq!(a.layers(), b.layers());
}

// === Envelopes ===

#[test]
fn test_fade_in_envelope() {
    let mut scheduler = Scheduler::new();
    let mut p = player(5);
    p.play(&mut scheduler).unwrap();
    assert_relative_eq!(p.master_volume(), 0.0);

    run(&mut p, &mut scheduler, 500);
    assert_relative_eq!(p.master_volume(), 0.075, epsilon = 1e-3);
    run(&mut p, &mut scheduler, 1000);
    assert_relative_eq!(p.master_volume(), 0.15, epsilon = 1e-3);
    run(&mut p, &mut scheduler, 2000);
    assert_relative_eq!(p.master_volume(), 0.3, epsilon = 1e-4);
    run(&mut p, &mut scheduler, 6000);
    assert_relative_eq!(p.master_volume(), 0.3, epsilon = 1e-6);
}

#[test]
fn test_fade_out_starts_from_current_level() {
    let mut scheduler = Scheduler::new();
    let mut p = player(6);
    p.toggle(&mut scheduler).unwrap();
    run(&mut p, &mut scheduler, 1000);

    // Interrupt the fade-in halfway
    p.toggle(&mut scheduler).unwrap();
    assert_relative_eq!(p.master_volume(), 0.15, epsilon = 1e-3);

    let mut previous = p.master_volume();
    for t in (1100..=2500).step_by(100) {
        run(&mut p, &mut scheduler, t);
        let level = p.master_volume();
        assert!(level <= previous + 1e-6);
        previous = level;
    }
    assert_relative_eq!(previous, 0.0, epsilon = 1e-6);
}

#[test]
fn test_fade_out_is_linear() {
    let mut scheduler = Scheduler::new();
    let mut p = player(7);
    p.toggle(&mut scheduler).unwrap();
    run(&mut p, &mut scheduler, 3000);
    p.toggle(&mut scheduler).unwrap();

    for (t, expected) in [(3300, 0.24), (3750, 0.15), (4200, 0.06)] {
        run(&mut p, &mut scheduler, t);
        assert_relative_eq!(p.master_volume(), expected, epsilon = 1e-3);
    }
}

// === Rendered audio ===

#[test]
fn test_rendered_audio_follows_the_player() {
    let mut scheduler = Scheduler::new();
    let mut p = player(9);

    p.play(&mut scheduler).unwrap();
    run(&mut p, &mut scheduler, 3000);
    let playing = p.context_mut().unwrap().take_capture();
    assert_eq!(playing.len(), 24_000);
    assert!(!playing.is_silent());
    assert!(playing.is_finite());

    // The steady state sits well above silence
    let steady = playing.slice_secs(2.0, 3.0);
    assert!(calculate_rms(&steady) > -40.0);

    p.toggle(&mut scheduler).unwrap();
    run(&mut p, &mut scheduler, 6000);
    let after = p.context_mut().unwrap().take_capture();
    let tail = after.slice_secs(1.6, 3.0);
    assert!(tail.is_silent());
}

#[test]
fn test_no_layers_render_silence() {
    let mut p = player(10);
    let mut scheduler = Scheduler::new();
    p.play(&mut scheduler).unwrap();
    p.stop(&mut scheduler);
    p.context_mut().unwrap().take_capture();

    run(&mut p, &mut scheduler, 1000);
    let out = p.context_mut().unwrap().take_capture();
    assert_eq!(out.len(), 8000);
    assert!(out.is_silent());
}
