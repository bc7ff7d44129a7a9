//! Prerecorded audio loading for playback visualization.
//!
//! Decodes a WAV file into normalized mono samples and reduces them to the
//! fixed-size level array the read-mode visualization consumes. This is the
//! `render(target_samples)` collaborator of the visualization core: one
//! level per bucket, RMS within the bucket, normalized against the loudest
//! bucket in the file.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::time::Duration;

/// Decoded playback data: metering levels plus the take's duration.
#[derive(Debug)]
pub struct PlaybackData {
    pub levels: Vec<f32>,
    pub duration: Duration,
}

/// Loads a WAV file and reduces it to `target_samples` metering levels.
///
/// # Errors
/// - If the file cannot be opened or is not a readable WAV
/// - If the sample format is unsupported
pub fn load_levels(path: &Path, target_samples: usize) -> Result<PlaybackData> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let spec = reader.spec();

    tracing::debug!(
        "Decoding {}: {}Hz, {} channels, {:?} {} bit",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.sample_format,
        spec.bits_per_sample
    );

    // Normalize to f32 in [-1, 1] regardless of the on-disk format.
    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    if raw.is_empty() {
        return Err(anyhow!("Audio file contains no samples: {}", path.display()));
    }

    // Mix down to mono by averaging channels.
    let channels = spec.channels.max(1) as usize;
    let mono: Vec<f32> = raw
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    let duration = Duration::from_secs_f64(mono.len() as f64 / spec.sample_rate as f64);
    let levels = reduce_to_levels(&mono, target_samples);

    tracing::info!(
        "Loaded {}: {:.2}s, {} levels",
        path.display(),
        duration.as_secs_f64(),
        levels.len()
    );

    Ok(PlaybackData { levels, duration })
}

/// Reduces mono samples to at most `target` levels, one per bucket.
///
/// Each bucket is the RMS of its span of samples, normalized so the loudest
/// bucket maps to 1.0. A silent file produces all-zero levels.
pub fn reduce_to_levels(samples: &[f32], target: usize) -> Vec<f32> {
    if samples.is_empty() || target == 0 {
        return Vec::new();
    }

    let bucket_size = (samples.len() / target).max(1);
    let mut levels: Vec<f32> = samples
        .chunks(bucket_size)
        .take(target)
        .map(|bucket| {
            let mean_square =
                bucket.iter().map(|s| s * s).sum::<f32>() / bucket.len() as f32;
            mean_square.sqrt()
        })
        .collect();

    let peak = levels.iter().cloned().fold(0.0f32, f32::max);
    if peak > 0.0 {
        for level in levels.iter_mut() {
            *level /= peak;
        }
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_no_levels() {
        assert!(reduce_to_levels(&[], 100).is_empty());
        assert!(reduce_to_levels(&[0.5], 0).is_empty());
    }

    #[test]
    fn produces_at_most_target_levels() {
        let samples = vec![0.5f32; 48000];
        assert_eq!(reduce_to_levels(&samples, 100).len(), 100);

        // Fewer samples than buckets: one level per sample.
        let short = vec![0.5f32; 7];
        assert_eq!(reduce_to_levels(&short, 100).len(), 7);
    }

    #[test]
    fn loudest_bucket_normalizes_to_one() {
        let mut samples = vec![0.1f32; 1000];
        samples.extend(vec![0.8f32; 1000]);
        let levels = reduce_to_levels(&samples, 10);

        let peak = levels.iter().cloned().fold(0.0f32, f32::max);
        assert!((peak - 1.0).abs() < 1e-6);
        assert!(levels.iter().all(|&l| (0.0..=1.0).contains(&l)));
    }

    #[test]
    fn silence_stays_at_zero() {
        let samples = vec![0.0f32; 4000];
        let levels = reduce_to_levels(&samples, 10);
        assert!(levels.iter().all(|&l| l == 0.0));
    }

    #[test]
    fn quieter_buckets_meter_lower() {
        let mut samples = vec![0.2f32; 2000];
        samples.extend(vec![1.0f32; 2000]);
        let levels = reduce_to_levels(&samples, 4);
        assert!(levels[0] < levels[3]);
    }
}
