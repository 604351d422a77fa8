//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::AuraConfig;
use crate::engine::{
    calculate_peak, calculate_rms, export_audio, AudioBackend, AudioBuffer, ChannelLayout,
    ExportFormat, OfflineBackend, UnavailableBackend,
};
use crate::error::{AuraError, Result};
use crate::page::{Page, PageEvent};
use crate::ui::landing_page;

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

/// Load the configuration file, or fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AuraConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration: {}", path.display());
            AuraConfig::load(path)
        }
        None => Ok(AuraConfig::default()),
    }
}

/// Render the soundscape offline and export it as WAV.
#[allow(clippy::too_many_arguments)]
pub fn render(
    config: &AuraConfig,
    output: &Path,
    duration: f64,
    stop_at: Option<f64>,
    sample_rate: u32,
    bit_depth: u16,
    stereo: bool,
    seed: Option<u64>,
) -> Result<()> {
    if !(duration > 0.0) {
        return Err(AuraError::InvalidConfig {
            reason: "render duration must be positive".to_string(),
        });
    }
    if sample_rate == 0 {
        return Err(AuraError::InvalidConfig {
            reason: "sample rate must be positive".to_string(),
        });
    }
    info!("Rendering {:.1}s at {} Hz", duration, sample_rate);

    let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let mut page = Page::with_rng(
        landing_page(1),
        OfflineBackend::capturing(sample_rate),
        config,
        rng,
    )?;
    page.dispatch(PageEvent::MusicButtonClick)?;
    if !page.player().is_playing() {
        return Err(AuraError::AudioUnavailable {
            reason: "the offline renderer did not start".to_string(),
        });
    }

    for (i, layer) in page.player().layers().iter().enumerate() {
        println!(
            "Layer {}: {:>7.2} Hz  vol {:.2}  detune {:+.2} cents  modulator {:.3} Hz",
            i, layer.frequency, layer.volume, layer.detune_cents, layer.modulator_frequency
        );
    }

    let total_ms = secs_to_ms(duration);
    if let Some(stop_at) = stop_at {
        page.advance_to(secs_to_ms(stop_at).min(total_ms));
        page.dispatch(PageEvent::MusicButtonClick)?;
        println!("Fade-out started at {:.2}s", page.now_ms() as f64 / 1000.0);
    }
    page.advance_to(total_ms);

    let captured = page
        .player_mut()
        .context_mut()
        .map(|ctx| ctx.take_capture())
        .unwrap_or_else(|| AudioBuffer::new(0, ChannelLayout::Mono, sample_rate));
    let layout = if stereo {
        ChannelLayout::Stereo
    } else {
        ChannelLayout::Mono
    };
    let buffer = AudioBuffer::from_mono(captured.channel(0).to_vec(), layout, sample_rate);

    export_audio(&buffer, output, ExportFormat::new(bit_depth))?;

    println!("Rendered: {}", output.display());
    println!("Duration: {:.2}s", buffer.duration_secs());
    println!("Peak: {:.1} dBFS", calculate_peak(&buffer));
    println!("RMS: {:.1} dBFS", calculate_rms(&buffer));
    Ok(())
}

fn run_until<B: AudioBackend>(page: &mut Page<B>, target_ms: u64, last: &mut Option<usize>) {
    while let Some(due) = page.scheduler().next_due_ms().filter(|&d| d <= target_ms) {
        page.advance_to(due);
        let current = page.carousel().current();
        if current != *last {
            if let Some(index) = current {
                println!("{:>8} ms  slide {}", page.now_ms(), index);
            }
            *last = current;
        }
    }
    page.advance_to(target_ms);
}

/// Simulate the carousel and print every slide change.
pub fn carousel(
    config: &AuraConfig,
    slides: usize,
    duration: u64,
    hover_from: Option<u64>,
    hover_until: Option<u64>,
) -> Result<()> {
    let mut page = Page::new(landing_page(slides), UnavailableBackend::default(), config)?;
    if slides == 0 {
        println!("No slides: autoplay never starts");
        return Ok(());
    }

    let mut events: Vec<(u64, PageEvent)> = [
        hover_from.map(|t| (t, PageEvent::CarouselMouseEnter)),
        hover_until.map(|t| (t, PageEvent::CarouselMouseLeave)),
    ]
    .into_iter()
    .flatten()
    .filter(|(t, _)| *t <= duration)
    .collect();
    events.sort_by_key(|(t, _)| *t);

    let mut last = page.carousel().current();
    println!("{:>8} ms  slide 0", 0);
    for (at, event) in events {
        run_until(&mut page, at, &mut last);
        page.dispatch(event)?;
        println!("{:>8} ms  {:?}", at, event);
    }
    run_until(&mut page, duration, &mut last);

    println!(
        "Final slide after {} ms: {}",
        duration,
        page.carousel().current_index()
    );
    Ok(())
}

/// Simulate the stats counters from reveal to completion.
pub fn stats(config: &AuraConfig, step: u64) -> Result<()> {
    let step = step.max(1);
    let mut page = Page::new(landing_page(1), UnavailableBackend::default(), config)?;
    page.dispatch(PageEvent::StatsVisible)?;

    loop {
        let labels: Vec<String> = page
            .stats_view()
            .numbers
            .iter()
            .map(|&slot| page.document().text(slot).to_string())
            .collect();
        println!("{:>6} ms  {}", page.now_ms(), labels.join("  |  "));

        if !page.stats().is_animating() {
            break;
        }
        page.advance(step);
    }
    Ok(())
}

/// Print or save the effective configuration.
pub fn config(config: &AuraConfig, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Configuration written: {}", path.display());
        }
        None => println!("{}", config.to_json()?),
    }
    Ok(())
}

/// Play live for `seconds`, then fade out and wait for the stop.
#[cfg(feature = "device")]
pub fn play(config: &AuraConfig, seconds: f64) -> Result<()> {
    use std::time::{Duration, Instant};

    use crate::engine::DeviceBackend;

    let mut page = Page::new(landing_page(1), DeviceBackend, config)?;
    page.dispatch(PageEvent::MusicButtonClick)?;
    if !page.player().is_playing() {
        return Err(AuraError::AudioUnavailable {
            reason: "the output device could not be opened".to_string(),
        });
    }
    println!("Playing for {:.1}s (Ctrl+C to abort)", seconds);

    let started = Instant::now();
    let stop_ms = secs_to_ms(seconds);
    let mut fading = false;
    loop {
        std::thread::sleep(Duration::from_millis(20));
        page.advance_to(started.elapsed().as_millis() as u64);

        if !fading && page.now_ms() >= stop_ms {
            page.dispatch(PageEvent::MusicButtonClick)?;
            fading = true;
            println!("Fading out...");
        }
        if fading && page.player().layers().is_empty() {
            break;
        }
    }
    println!("Stopped");
    Ok(())
}
