//! Bulk level resampling.
//!
//! Fits an arbitrary-length array of metering levels into a fixed number of
//! display buckets. Downsampling averages contiguous runs of source samples
//! so noisy input is smoothed; upsampling takes exact source values at
//! integral positions and linearly interpolates between neighbors at
//! fractional ones. The asymmetry is intentional: averaging a run when
//! shrinking, filling gaps when stretching.

/// Fits `source` into exactly `buckets` output values.
///
/// An empty source (or a zero bucket count) produces an empty result.
/// Every output value lies within the min/max bounds of the source.
pub fn fit_to_buckets(source: &[f32], buckets: usize) -> Vec<f32> {
    if source.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let n = source.len();
    let mut fitted = Vec::with_capacity(buckets);

    if buckets > n {
        // Upsampling: spread the source endpoint-to-endpoint across the
        // bucket range. Integral positions map straight to source samples,
        // fractional positions interpolate.
        for index in 0..buckets {
            let position = if buckets == 1 {
                0.0
            } else {
                index as f32 * (n - 1) as f32 / (buckets - 1) as f32
            };
            let low = position.floor() as usize;
            let high = (position.ceil() as usize).min(n - 1);

            let value = if high > low {
                source[low] + (position - low as f32) * (source[high] - source[low])
            } else {
                source[low]
            };
            fitted.push(value);
        }
    } else {
        // Downsampling (or equal length): each bucket averages the run of
        // source samples newly traversed since the previous bucket. Runs
        // are contiguous and non-overlapping; the first bucket may cover
        // just index 0.
        let mut last_position = 0usize;
        for index in 0..buckets {
            let position = (index as f32 / buckets as f32 * n as f32).floor() as usize;
            let start = if index == 0 { 0 } else { last_position + 1 };
            let run = &source[start.min(position)..=position];

            let sum: f32 = run.iter().sum();
            fitted.push(sum / run.len() as f32);

            last_position = position;
        }
    }

    fitted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-4, "expected {expected:?}, got {actual:?}");
        }
    }

    #[test]
    fn empty_source_produces_empty_output() {
        assert!(fit_to_buckets(&[], 10).is_empty());
        assert!(fit_to_buckets(&[0.5], 0).is_empty());
    }

    #[test]
    fn upsampling_interpolates_between_endpoints() {
        let fitted = fit_to_buckets(&[0.0, 1.0], 4);
        assert_close(&fitted, &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn upsampling_hits_source_values_at_integral_positions() {
        let fitted = fit_to_buckets(&[0.2, 0.8, 0.4], 5);
        assert_close(&fitted, &[0.2, 0.5, 0.8, 0.6, 0.4]);
    }

    #[test]
    fn downsampling_averages_contiguous_runs() {
        // Buckets cover indices {0}, {1,2}, {3,4} and {5,6}.
        let source = [0.1, 0.2, 0.4, 0.6, 0.8, 1.0, 0.0, 0.5];
        let fitted = fit_to_buckets(&source, 4);
        assert_close(&fitted, &[0.1, 0.3, 0.7, 0.5]);
    }

    #[test]
    fn equal_length_is_identity() {
        let source = [0.3, 0.9, 0.1, 0.7];
        let fitted = fit_to_buckets(&source, 4);
        assert_close(&fitted, &source);
    }

    #[test]
    fn output_length_always_matches_bucket_count() {
        let source: Vec<f32> = (0..57).map(|i| (i % 10) as f32 / 10.0).collect();
        for buckets in 1..=80 {
            assert_eq!(fit_to_buckets(&source, buckets).len(), buckets);
        }
    }

    #[test]
    fn output_stays_within_source_bounds() {
        let source = [0.05, 0.95, 0.3, 0.6, 0.2, 0.85];
        let min = 0.05f32;
        let max = 0.95f32;
        for buckets in [1, 2, 3, 6, 13, 40] {
            for value in fit_to_buckets(&source, buckets) {
                assert!(value >= min - 1e-6 && value <= max + 1e-6);
            }
        }
    }

    #[test]
    fn resampling_is_idempotent_at_fixed_bucket_count() {
        let source: Vec<f32> = (0..31).map(|i| ((i * 7) % 11) as f32 / 11.0).collect();
        for buckets in [4, 10, 31, 64] {
            let once = fit_to_buckets(&source, buckets);
            let twice = fit_to_buckets(&once, buckets);
            assert_close(&twice, &once);
        }
    }

    #[test]
    fn single_bucket_covers_only_the_leading_run() {
        // Bucket boundaries are floor(i/B * N), so the sole bucket ends at
        // source index 0.
        let fitted = fit_to_buckets(&[0.4, 0.5, 1.0], 1);
        assert_close(&fitted, &[0.4]);
    }
}
