//! Live recording with waveform visualization.
//!
//! Drives the write-mode visualizer: captures audio, derives one metering
//! level per tick, and paints the accumulating bar chart until the user
//! stops. Supports external stop via SIGUSR1 signal.

use crate::config::WavebarConfig;
use crate::recording::{AudioCapture, InputCommand, WaveTui};
use crate::viz::{BarLayout, Mode, Visualizer};
use std::path::PathBuf;
use std::time::Instant;

/// Records audio with real-time bar-chart visualization.
///
/// Levels accumulate left to right; once the screen is full, each completed
/// bar cluster scrolls the chart one slot. Space pauses capture, 'r' clears
/// the chart, 'q'/Escape stops. With `-o`, the take is saved as a 16-bit
/// mono WAV file on exit.
pub async fn handle_record(output: Option<PathBuf>) -> Result<(), anyhow::Error> {
    tracing::info!("=== wavebar recorder started ===");

    let config = WavebarConfig::load().map_err(|err| {
        tracing::error!("Failed to load configuration: {err}");
        anyhow::anyhow!(
            "Configuration error: {err}\n\nPlease check your ~/.config/wavebar/wavebar.toml file and try again."
        )
    })?;

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, reference_level={}dBFS, group_size={}",
        config.audio.device,
        config.audio.sample_rate,
        config.audio.reference_level_db,
        config.viz.group_size
    );

    let mut capture = AudioCapture::new(
        config.audio.sample_rate,
        config.audio.device.clone(),
        config.audio.reference_level_db,
    );

    capture.start().map_err(|e| {
        tracing::error!("Failed to start capture: {}", e);
        anyhow::anyhow!("Recording error: {e}\n\nPlease check your audio configuration and try again.")
    })?;
    let sample_rate = capture.sample_rate();

    let mut tui = WaveTui::new(config.viz.single_stick)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    let layout = BarLayout {
        bar_width: config.viz.bar_width,
        spacing: config.viz.bar_spacing,
    };
    let tick_interval = config.viz.tick_interval();
    let mut viz = match Visualizer::new(
        Mode::Write,
        layout,
        tui.width()?,
        config.viz.group_size,
        tick_interval,
    ) {
        Ok(viz) => viz,
        Err(e) => {
            tui.cleanup().ok();
            return Err(anyhow::anyhow!("Visualizer setup failed: {e}"));
        }
    };

    let term = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, term.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    tracing::debug!(
        "Entering recording loop. Press 'q'/Escape to stop, Space to pause, 'r' to clear."
    );

    let mut last_level: Option<Instant> = None;
    let mut last_render = Instant::now();

    let loop_result: Result<(), anyhow::Error> = loop {
        if term.load(std::sync::atomic::Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: stopping via external trigger");
            break Ok(());
        }

        match tui.handle_input() {
            Ok(InputCommand::Continue) => {}
            Ok(InputCommand::Quit) => break Ok(()),
            Ok(InputCommand::TogglePause) => {
                capture.toggle_pause();
                // Drop the push cadence anchor so the first level after a
                // resume does not span the paused gap.
                last_level = None;
            }
            Ok(InputCommand::Reset) => {
                tracing::debug!("Clearing bar chart");
                viz.reset();
            }
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                break Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        let now = Instant::now();

        if let Ok(width) = tui.width() {
            viz.set_width(width);
        }

        if !capture.is_paused()
            && last_level.is_none_or(|at| now.duration_since(at) >= tick_interval)
        {
            if let Err(e) = viz.push_level(capture.level(), now) {
                break Err(anyhow::anyhow!("Level append failed: {e}"));
            }
            last_level = Some(now);
        }

        viz.tick(now);

        if viz.take_dirty() || now.duration_since(last_render) >= tick_interval {
            let recorded =
                std::time::Duration::from_secs_f32(capture.sample_count() as f32 / sample_rate as f32);
            if let Err(e) = tui.render(&viz, recorded, capture.is_paused()) {
                break Err(anyhow::anyhow!("Render failed: {e}"));
            }
            viz.frame_presented();
            last_render = now;
        }
    };

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;
    capture.stop();
    loop_result?;

    if let Some(path) = output {
        capture.save_wav(&path)?;
        println!("Recording saved to {}", path.display());
    }

    tracing::info!("=== wavebar recorder exited successfully ===");
    Ok(())
}
