//! Waveform visualization core.
//!
//! UI-free engine behind the bar-chart waveform display. Continuously
//! downsamples incoming metering levels into a bar array that fits the
//! available width (write mode), fits prerecorded level arrays to the
//! screen and sweeps a progress fraction across them (read mode), and
//! animates the bar scroll that bridges clustering recomputes.
//!
//! Everything here is single-threaded and event-driven: mutations happen in
//! response to discrete calls (`push_level`, `tick`, key handling) delivered
//! serially by the command loops. Periodic behavior is frame-polled with an
//! injected [`Instant`], and every mutation marks the visualizer dirty so
//! the presentation layer knows a repaint is due.

pub mod clock;
pub mod error;
pub mod levels;
pub mod resample;
pub mod scroll;

use std::fmt;
use std::ops::Range;
use std::time::{Duration, Instant};

pub use clock::{ClockTick, ProgressClock, DEFAULT_TICK_INTERVAL};
pub use error::VizError;
pub use levels::LevelBuffer;
pub use resample::fit_to_buckets;
pub use scroll::ScrollAnimator;

/// Whether the visualizer accumulates live levels or replays a fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Recording: bars accumulate in real time via [`Visualizer::push_level`].
    Write,
    /// Playback: a fixed level array is displayed and a progress sweep
    /// moves across it.
    Read,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// Per-bar display geometry, in fractional terminal columns.
#[derive(Debug, Clone, Copy)]
pub struct BarLayout {
    pub bar_width: f32,
    pub spacing: f32,
}

impl BarLayout {
    /// Horizontal distance from one bar to the next.
    pub fn advance(&self) -> f32 {
        self.bar_width + self.spacing
    }

    /// Number of bars that fit into `width` columns.
    pub fn max_bars(&self, width: f32) -> usize {
        if self.advance() <= 0.0 {
            return 0;
        }
        (width / self.advance()).floor() as usize
    }
}

/// Playback sweep state.
#[derive(Debug)]
enum Sweep {
    /// No playback in progress and no sweep painted.
    Inactive,
    /// Levels loaded, sweep parked at zero awaiting `play`.
    Armed,
    /// Clock running (or paused) and driving the fraction.
    Active(ProgressClock),
    /// Stopped or completed: one final full-width paint is owed before the
    /// sweep clears.
    Final,
}

/// The waveform visualization engine.
///
/// Owns the level buffer, the clustered display array, the scroll offset and
/// the playback sweep; exposes exactly the state the presentation layer
/// needs each frame.
#[derive(Debug)]
pub struct Visualizer {
    mode: Mode,
    layout: BarLayout,
    max_bars: usize,
    levels: LevelBuffer,
    /// Read-mode source array, kept so geometry changes can refit it.
    source: Vec<f32>,
    scroll: ScrollAnimator,
    sweep: Sweep,
    fraction: f32,
    tick_interval: Duration,
    last_push: Option<Instant>,
    dirty: bool,
}

impl Visualizer {
    /// Creates a visualizer for the given mode and display geometry.
    ///
    /// # Errors
    /// - `InvalidGroupSize` if `group_size` is zero
    pub fn new(
        mode: Mode,
        layout: BarLayout,
        width: f32,
        group_size: usize,
        tick_interval: Duration,
    ) -> Result<Self, VizError> {
        Ok(Self {
            mode,
            layout,
            max_bars: layout.max_bars(width),
            levels: LevelBuffer::new(group_size)?,
            source: Vec::new(),
            scroll: ScrollAnimator::new(),
            sweep: Sweep::Inactive,
            fraction: 0.0,
            tick_interval,
            last_push: None,
            dirty: true,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn layout(&self) -> BarLayout {
        self.layout
    }

    /// Bars that fit the current display width.
    pub fn max_bars(&self) -> usize {
        self.max_bars
    }

    /// Recomputes the bucket capacity for a new display width. In read mode
    /// the loaded levels are refitted to the new capacity.
    pub fn set_width(&mut self, width: f32) {
        let max_bars = self.layout.max_bars(width);
        if max_bars == self.max_bars {
            return;
        }
        self.max_bars = max_bars;
        if !self.source.is_empty() {
            self.levels
                .set_clustered(fit_to_buckets(&self.source, self.max_bars));
        }
        self.mark_dirty();
    }

    /// Levels to display: clustered when available, raw otherwise.
    pub fn levels(&self) -> &[f32] {
        self.levels.current()
    }

    /// Index range of the bars that fit on screen (the tail of the array).
    pub fn visible_range(&self) -> Range<usize> {
        let len = self.levels.current().len();
        len.saturating_sub(self.max_bars)..len
    }

    /// Transient horizontal displacement applied to bars while scrolling.
    pub fn scroll_offset(&self) -> f32 {
        self.scroll.offset()
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_animating()
    }

    /// Playback fraction in `[0, 1]`, or `None` when no sweep is active.
    pub fn progress(&self) -> Option<f32> {
        match self.sweep {
            Sweep::Inactive => None,
            Sweep::Armed => Some(0.0),
            Sweep::Active(_) => Some(self.fraction),
            Sweep::Final => Some(1.0),
        }
    }

    /// True while the playback clock is running (not paused).
    pub fn is_playing(&self) -> bool {
        matches!(&self.sweep, Sweep::Active(clock) if clock.is_running())
    }

    /// Consumes the dirty flag; true means the display state changed since
    /// the last call and a repaint is due.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // --- write mode ---

    /// Appends one raw metering level.
    ///
    /// Recomputes the clustered view, and when the append completed a
    /// cluster while the bars already overflow the visible capacity, starts
    /// a scroll swing spanning the time one cluster takes to fill.
    ///
    /// # Errors
    /// - `ModeViolation` when called in read mode
    pub fn push_level(&mut self, level: f32, now: Instant) -> Result<(), VizError> {
        if self.mode != Mode::Write {
            return Err(VizError::ModeViolation {
                required: Mode::Write,
                actual: self.mode,
            });
        }

        self.scroll.cancel();

        let delta = self.last_push.map(|at| now.duration_since(at));
        self.last_push = Some(now);

        self.levels.push(level);
        self.mark_dirty();

        let overflows = self.levels.current().len() > self.max_bars;
        if overflows && self.levels.on_group_boundary() {
            if let Some(delta) = delta.filter(|d| !d.is_zero()) {
                let span = delta * self.levels.group_size() as u32;
                self.scroll.begin(now, span, self.layout.advance());
            }
        }

        Ok(())
    }

    // --- read mode ---

    /// Loads a prerecorded level array and fits it to the display width.
    /// Parks the sweep at zero.
    ///
    /// # Errors
    /// - `ModeViolation` when called in write mode
    pub fn set_levels(&mut self, levels: Vec<f32>) -> Result<(), VizError> {
        if self.mode != Mode::Read {
            return Err(VizError::ModeViolation {
                required: Mode::Read,
                actual: self.mode,
            });
        }

        let fitted = fit_to_buckets(&levels, self.max_bars);
        self.source = levels;
        self.levels.set_clustered(fitted);
        self.sweep = Sweep::Armed;
        self.fraction = 0.0;
        self.mark_dirty();
        Ok(())
    }

    /// Starts the playback sweep over `duration`, or resumes a paused one.
    ///
    /// # Errors
    /// - `ModeViolation` when called in write mode
    /// - `NoLevels` when no levels have been loaded
    pub fn play(&mut self, duration: Duration, now: Instant) -> Result<(), VizError> {
        if self.mode != Mode::Read {
            return Err(VizError::ModeViolation {
                required: Mode::Read,
                actual: self.mode,
            });
        }
        if self.levels.current().is_empty() {
            return Err(VizError::NoLevels);
        }

        match &mut self.sweep {
            Sweep::Active(clock) => clock.resume(now),
            _ => {
                self.sweep = Sweep::Active(ProgressClock::start(
                    duration,
                    self.tick_interval,
                    now,
                ));
                self.fraction = 0.0;
            }
        }
        self.mark_dirty();
        Ok(())
    }

    /// Pauses the playback sweep, freezing the fraction.
    ///
    /// # Errors
    /// - `NotPlaying` when no sweep is running
    pub fn pause(&mut self, now: Instant) -> Result<(), VizError> {
        match &mut self.sweep {
            Sweep::Active(clock) => {
                clock.pause(now)?;
                self.mark_dirty();
                Ok(())
            }
            _ => Err(VizError::NotPlaying),
        }
    }

    /// Stops playback and cancels the scroll animation. The sweep reports
    /// 1.0 until the presentation acknowledges the final paint via
    /// [`Visualizer::frame_presented`].
    pub fn stop(&mut self) {
        self.scroll.cancel();
        self.sweep = Sweep::Final;
        self.mark_dirty();
    }

    /// Acknowledges a painted frame. Clears a finished sweep back to "no
    /// active progress".
    pub fn frame_presented(&mut self) {
        if matches!(self.sweep, Sweep::Final) {
            self.sweep = Sweep::Inactive;
            self.mark_dirty();
        }
    }

    // --- shared ---

    /// Advances frame-polled state: scroll steps and clock emissions.
    pub fn tick(&mut self, now: Instant) {
        if self.scroll.tick(now) {
            self.mark_dirty();
        }

        if let Sweep::Active(clock) = &mut self.sweep {
            match clock.tick(now) {
                ClockTick::Waiting => {}
                ClockTick::Progress(fraction) => {
                    self.fraction = fraction;
                    self.mark_dirty();
                }
                ClockTick::Completed => self.stop(),
            }
        }
    }

    /// Clears all recorded and loaded state, cancelling any in-flight
    /// animation and sweep. The visualizer behaves like a freshly
    /// constructed instance afterwards.
    pub fn reset(&mut self) {
        self.scroll.cancel();
        self.sweep = Sweep::Inactive;
        self.levels.reset();
        self.source.clear();
        self.fraction = 0.0;
        self.last_push = None;
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    fn layout() -> BarLayout {
        BarLayout {
            bar_width: 2.0,
            spacing: 1.0,
        }
    }

    fn writer(width: f32, group_size: usize) -> Visualizer {
        Visualizer::new(Mode::Write, layout(), width, group_size, TICK).unwrap()
    }

    fn reader(width: f32) -> Visualizer {
        Visualizer::new(Mode::Read, layout(), width, 1, TICK).unwrap()
    }

    #[test]
    fn bucket_capacity_derives_from_geometry() {
        // 30 columns / (2 + 1) per bar = 10 bars.
        assert_eq!(writer(30.0, 1).max_bars(), 10);
        assert_eq!(writer(31.9, 1).max_bars(), 10);
        assert_eq!(writer(33.0, 1).max_bars(), 11);
    }

    #[test]
    fn append_in_read_mode_is_a_mode_violation() {
        let mut viz = reader(30.0);
        assert_eq!(
            viz.push_level(0.5, Instant::now()),
            Err(VizError::ModeViolation {
                required: Mode::Write,
                actual: Mode::Read,
            })
        );
    }

    #[test]
    fn play_in_write_mode_is_a_mode_violation() {
        let mut viz = writer(30.0, 1);
        assert_eq!(
            viz.play(Duration::from_secs(1), Instant::now()),
            Err(VizError::ModeViolation {
                required: Mode::Read,
                actual: Mode::Write,
            })
        );
    }

    #[test]
    fn play_without_levels_is_rejected() {
        let mut viz = reader(30.0);
        assert_eq!(
            viz.play(Duration::from_secs(1), Instant::now()),
            Err(VizError::NoLevels)
        );
    }

    #[test]
    fn pause_without_playing_is_rejected() {
        let mut viz = reader(30.0);
        assert_eq!(viz.pause(Instant::now()), Err(VizError::NotPlaying));
    }

    #[test]
    fn visible_window_is_capped_and_overflow_starts_a_scroll() {
        let mut viz = writer(30.0, 1); // 10 visible bars
        let start = Instant::now();

        for i in 0..100 {
            let now = start + Duration::from_millis(50 * i as u64);
            viz.push_level((i % 10) as f32 / 10.0, now).unwrap();
            let range = viz.visible_range();
            assert!(range.len() <= 10);
        }
        assert_eq!(viz.levels().len(), 100);
        assert_eq!(viz.visible_range(), 90..100);

        // The 101st sample overflows the capacity on a group boundary and
        // a known inter-sample delta exists, so a swing begins.
        let now = start + Duration::from_millis(50 * 100);
        viz.push_level(0.5, now).unwrap();
        assert!(viz.is_scrolling());
        assert_eq!(viz.scroll_offset(), 0.0);
    }

    #[test]
    fn first_append_has_no_delta_and_does_not_scroll() {
        let mut viz = writer(3.0, 1); // capacity of a single bar
        viz.push_level(0.4, Instant::now()).unwrap();
        assert!(!viz.is_scrolling());
    }

    #[test]
    fn scroll_only_triggers_on_cluster_boundaries() {
        let mut viz = writer(6.0, 3); // 2 visible bars, clusters of 3
        let start = Instant::now();

        // 9 raw samples -> 3 clusters, one more than fits.
        for i in 0..9 {
            viz.push_level(0.5, start + Duration::from_millis(40 * i))
                .unwrap();
        }
        assert!(viz.is_scrolling());

        // Mid-cluster appends cancel the swing and do not start a new one.
        viz.push_level(0.5, start + Duration::from_millis(400))
            .unwrap();
        assert!(!viz.is_scrolling());
        assert_eq!(viz.scroll_offset(), 0.0);
    }

    #[test]
    fn ticking_the_scroll_moves_and_completes() {
        let mut viz = writer(6.0, 1);
        let start = Instant::now();
        for i in 0..3 {
            viz.push_level(0.5, start + Duration::from_millis(100 * i))
                .unwrap();
        }
        assert!(viz.is_scrolling());
        viz.take_dirty();

        // Swing spans one inter-sample delta (100 ms); halfway through,
        // some steps have applied.
        viz.tick(start + Duration::from_millis(250));
        assert!(viz.take_dirty());
        assert!(viz.scroll_offset() < 0.0);

        viz.tick(start + Duration::from_millis(400));
        assert!(!viz.is_scrolling());
        assert_eq!(viz.scroll_offset(), 0.0);
    }

    #[test]
    fn playback_sweep_advances_and_completes() {
        let mut viz = reader(30.0);
        let start = Instant::now();
        viz.set_levels(vec![0.2, 0.8, 0.5]).unwrap();
        assert_eq!(viz.progress(), Some(0.0));

        viz.play(Duration::from_millis(500), start).unwrap();
        viz.tick(start + Duration::from_millis(250));
        let halfway = viz.progress().unwrap();
        assert!((0.4..0.6).contains(&halfway), "{halfway}");

        // Completion forces a final full-width paint...
        viz.tick(start + Duration::from_millis(600));
        assert_eq!(viz.progress(), Some(1.0));

        // ...which clears once the frame is acknowledged.
        viz.frame_presented();
        assert_eq!(viz.progress(), None);
    }

    #[test]
    fn pause_freezes_the_fraction() {
        let mut viz = reader(30.0);
        let start = Instant::now();
        viz.set_levels(vec![0.5; 20]).unwrap();
        viz.play(Duration::from_secs(1), start).unwrap();

        viz.tick(start + Duration::from_millis(300));
        let before = viz.progress().unwrap();
        viz.pause(start + Duration::from_millis(300)).unwrap();

        viz.tick(start + Duration::from_secs(30));
        assert_eq!(viz.progress(), Some(before));

        // play() resumes from the frozen point.
        viz.play(Duration::from_secs(1), start + Duration::from_secs(30))
            .unwrap();
        assert!(viz.is_playing());
    }

    #[test]
    fn stop_forces_full_sweep_then_clears() {
        let mut viz = reader(30.0);
        let start = Instant::now();
        viz.set_levels(vec![0.5; 5]).unwrap();
        viz.play(Duration::from_secs(10), start).unwrap();

        viz.stop();
        assert_eq!(viz.progress(), Some(1.0));
        viz.frame_presented();
        assert_eq!(viz.progress(), None);
        viz.frame_presented();
        assert_eq!(viz.progress(), None);
    }

    #[test]
    fn read_mode_levels_are_fitted_to_the_screen() {
        let mut viz = reader(30.0); // 10 buckets
        let source: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        viz.set_levels(source).unwrap();
        assert_eq!(viz.levels().len(), 10);
        assert_eq!(viz.visible_range(), 0..10);
    }

    #[test]
    fn width_change_refits_loaded_levels() {
        let mut viz = reader(30.0);
        viz.set_levels((0..100).map(|i| i as f32 / 100.0).collect())
            .unwrap();
        viz.set_width(60.0); // 20 buckets now
        assert_eq!(viz.levels().len(), 20);
    }

    #[test]
    fn reset_behaves_like_a_fresh_instance() {
        let mut viz = writer(30.0, 2);
        let start = Instant::now();
        for i in 0..50 {
            viz.push_level(0.7, start + Duration::from_millis(30 * i))
                .unwrap();
        }
        viz.reset();

        let mut fresh = writer(30.0, 2);
        viz.take_dirty();
        fresh.take_dirty();

        let at = start + Duration::from_secs(5);
        viz.push_level(0.3, at).unwrap();
        fresh.push_level(0.3, at).unwrap();

        assert_eq!(viz.levels(), fresh.levels());
        assert_eq!(viz.scroll_offset(), fresh.scroll_offset());
        assert_eq!(viz.progress(), fresh.progress());
        assert_eq!(viz.is_scrolling(), fresh.is_scrolling());
    }

    #[test]
    fn every_mutation_marks_the_visualizer_dirty() {
        let mut viz = writer(30.0, 1);
        assert!(viz.take_dirty()); // construction paints once
        assert!(!viz.take_dirty());

        viz.push_level(0.5, Instant::now()).unwrap();
        assert!(viz.take_dirty());

        viz.reset();
        assert!(viz.take_dirty());
    }
}
