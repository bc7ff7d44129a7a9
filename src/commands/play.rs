//! Playback visualization of a prerecorded WAV file.
//!
//! Drives the read-mode visualizer: decodes the file into a fixed level
//! array, fits it to the screen, and sweeps the progress highlight across
//! the bars over the take's duration.

use crate::config::WavebarConfig;
use crate::playback;
use crate::recording::{InputCommand, WaveTui};
use crate::viz::{BarLayout, Mode, Visualizer};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Sweeps the progress highlight across the decoded waveform of `file`.
///
/// Space pauses/resumes the sweep, 'r' restarts it from the beginning,
/// 'q'/Escape stops early (the sweep paints full-width once, then exits).
pub async fn handle_play(file: PathBuf, buckets: usize) -> Result<(), anyhow::Error> {
    tracing::info!("=== wavebar playback started: {} ===", file.display());

    let config = WavebarConfig::load().map_err(|err| {
        tracing::error!("Failed to load configuration: {err}");
        anyhow::anyhow!(
            "Configuration error: {err}\n\nPlease check your ~/.config/wavebar/wavebar.toml file and try again."
        )
    })?;

    let data = playback::load_levels(&file, buckets)?;
    let duration = data.duration;

    let mut tui = WaveTui::new(config.viz.single_stick)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    let layout = BarLayout {
        bar_width: config.viz.bar_width,
        spacing: config.viz.bar_spacing,
    };
    let loop_result = play_loop(
        &mut tui,
        layout,
        config.viz.tick_interval(),
        data.levels,
        duration,
    );

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;
    loop_result?;

    tracing::info!("=== wavebar playback exited successfully ===");
    Ok(())
}

fn play_loop(
    tui: &mut WaveTui,
    layout: BarLayout,
    tick_interval: Duration,
    levels: Vec<f32>,
    duration: Duration,
) -> Result<(), anyhow::Error> {
    let mut viz = Visualizer::new(Mode::Read, layout, tui.width()?, 1, tick_interval)
        .map_err(|e| anyhow::anyhow!("Visualizer setup failed: {e}"))?;

    viz.set_levels(levels.clone())
        .map_err(|e| anyhow::anyhow!("Failed to load levels: {e}"))?;
    viz.play(duration, Instant::now())
        .map_err(|e| anyhow::anyhow!("Failed to start playback: {e}"))?;

    tracing::debug!(
        "Entering playback loop: {:.2}s take. Press 'q'/Escape to stop, Space to pause.",
        duration.as_secs_f64()
    );

    loop {
        match tui.handle_input() {
            Ok(InputCommand::Continue) => {}
            Ok(InputCommand::Quit) => {
                tracing::debug!("Stopping playback early");
                viz.stop();
            }
            Ok(InputCommand::TogglePause) => {
                let now = Instant::now();
                if viz.is_playing() {
                    viz.pause(now)
                        .map_err(|e| anyhow::anyhow!("Pause failed: {e}"))?;
                } else {
                    viz.play(duration, now)
                        .map_err(|e| anyhow::anyhow!("Resume failed: {e}"))?;
                }
            }
            Ok(InputCommand::Reset) => {
                tracing::debug!("Restarting sweep");
                let now = Instant::now();
                viz.set_levels(levels.clone())
                    .map_err(|e| anyhow::anyhow!("Failed to reload levels: {e}"))?;
                viz.play(duration, now)
                    .map_err(|e| anyhow::anyhow!("Restart failed: {e}"))?;
            }
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        let now = Instant::now();

        if let Ok(width) = tui.width() {
            viz.set_width(width);
        }

        viz.tick(now);

        if viz.take_dirty() {
            let fraction = viz.progress().unwrap_or(1.0);
            let elapsed = duration.mul_f32(fraction.clamp(0.0, 1.0));
            let paused = !viz.is_playing();
            tui.render(&viz, elapsed, paused)
                .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
            viz.frame_presented();
        }

        // The sweep clears once the final full-width frame was painted.
        if viz.progress().is_none() {
            break;
        }
    }

    Ok(())
}
