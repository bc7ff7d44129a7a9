//! Raw metering level storage and incremental grouping.
//!
//! Holds the append-only buffer of raw levels recorded in write mode plus
//! the derived clustered view sized by the grouping factor. The clustered
//! view is recomputed from scratch on every append; the buffer is capped to
//! what fits on screen, so the recompute stays cheap.

use super::VizError;

/// Append-only store of raw levels with a derived clustered view.
#[derive(Debug)]
pub struct LevelBuffer {
    raw: Vec<f32>,
    clustered: Vec<f32>,
    group_size: usize,
}

impl LevelBuffer {
    /// Creates an empty buffer with the given grouping factor.
    ///
    /// # Errors
    /// - `InvalidGroupSize` if `group_size` is zero
    pub fn new(group_size: usize) -> Result<Self, VizError> {
        if group_size == 0 {
            return Err(VizError::InvalidGroupSize(group_size));
        }
        Ok(Self {
            raw: Vec::new(),
            clustered: Vec::new(),
            group_size,
        })
    }

    /// Appends one raw level and recomputes the clustered view.
    ///
    /// With a grouping factor of 1 the clustered view stays empty and the
    /// raw buffer is displayed directly.
    pub fn push(&mut self, level: f32) {
        self.raw.push(level);
        if self.group_size > 1 {
            self.clustered = cluster(&self.raw, self.group_size);
        }
    }

    /// Replaces the clustered view with an externally supplied array
    /// (read-mode bulk load).
    pub fn set_clustered(&mut self, levels: Vec<f32>) {
        self.clustered = levels;
    }

    /// Levels to display: the clustered view when it is non-empty,
    /// otherwise the raw buffer.
    pub fn current(&self) -> &[f32] {
        if self.clustered.is_empty() {
            &self.raw
        } else {
            &self.clustered
        }
    }

    /// Number of raw samples appended so far.
    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// True when the raw count sits exactly on a grouping boundary, i.e.
    /// the latest append completed a cluster.
    pub fn on_group_boundary(&self) -> bool {
        self.raw.len() % self.group_size == 0
    }

    /// Clears both the raw buffer and the clustered view.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.clustered.clear();
    }
}

/// Reduces `levels` to `ceil(len / group_size)` arithmetic means.
///
/// Each complete group of `group_size` consecutive samples contributes one
/// entry; a trailing partial group contributes the mean of its remainder.
pub fn cluster(levels: &[f32], group_size: usize) -> Vec<f32> {
    debug_assert!(group_size >= 1);
    levels
        .chunks(group_size)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_group_size_is_rejected() {
        assert_eq!(
            LevelBuffer::new(0).unwrap_err(),
            VizError::InvalidGroupSize(0)
        );
    }

    #[test]
    fn clusters_pairs_into_means() {
        let clustered = cluster(&[0.2, 0.4, 0.6, 0.8], 2);
        assert_eq!(clustered.len(), 2);
        assert!((clustered[0] - 0.3).abs() < 1e-6);
        assert!((clustered[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn partial_trailing_group_averages_its_remainder() {
        let clustered = cluster(&[0.0, 1.0, 0.5], 2);
        assert_eq!(clustered.len(), 2);
        assert!((clustered[0] - 0.5).abs() < 1e-6);
        assert!((clustered[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cluster_count_is_ceil_of_len_over_group() {
        for len in 0..40usize {
            let levels = vec![0.5; len];
            for group in 1..=8usize {
                assert_eq!(cluster(&levels, group).len(), len.div_ceil(group));
            }
        }
    }

    #[test]
    fn group_weighted_mean_equals_raw_mean() {
        let levels: Vec<f32> = (0..23).map(|i| ((i * 13) % 17) as f32 / 17.0).collect();
        let raw_mean = levels.iter().sum::<f32>() / levels.len() as f32;

        for group in 1..=7usize {
            let clustered = cluster(&levels, group);
            let weighted_sum: f32 = clustered
                .iter()
                .zip(levels.chunks(group))
                .map(|(mean, chunk)| mean * chunk.len() as f32)
                .sum();
            let weighted_mean = weighted_sum / levels.len() as f32;
            assert!((weighted_mean - raw_mean).abs() < 1e-4);
        }
    }

    #[test]
    fn group_size_one_displays_raw_levels_directly() {
        let mut buffer = LevelBuffer::new(1).unwrap();
        buffer.push(0.3);
        buffer.push(0.9);
        assert_eq!(buffer.current(), &[0.3, 0.9]);
    }

    #[test]
    fn clustered_view_tracks_appends() {
        let mut buffer = LevelBuffer::new(2).unwrap();
        buffer.push(0.2);
        assert_eq!(buffer.current(), &[0.2]);
        buffer.push(0.4);
        buffer.push(0.6);
        buffer.push(0.8);
        let current = buffer.current().to_vec();
        assert_eq!(current.len(), 2);
        assert!((current[0] - 0.3).abs() < 1e-6);
        assert!((current[1] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn reset_restores_the_initial_empty_state() {
        let mut buffer = LevelBuffer::new(3).unwrap();
        for i in 0..10 {
            buffer.push(i as f32 / 10.0);
        }
        buffer.reset();
        assert_eq!(buffer.raw_len(), 0);
        assert!(buffer.current().is_empty());

        buffer.push(0.5);
        assert_eq!(buffer.current(), &[0.5]);
    }

    #[test]
    fn boundary_detection_follows_the_grouping_factor() {
        let mut buffer = LevelBuffer::new(3).unwrap();
        buffer.push(0.1);
        assert!(!buffer.on_group_boundary());
        buffer.push(0.1);
        assert!(!buffer.on_group_boundary());
        buffer.push(0.1);
        assert!(buffer.on_group_boundary());
    }
}
