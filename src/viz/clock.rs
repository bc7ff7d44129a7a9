//! Playback progress clock.
//!
//! A restartable, pausable elapsed-time tracker that drives the playback
//! sweep. The clock is frame-polled: the event loop calls [`ProgressClock::tick`]
//! with the current instant and the clock gates emission on its interval,
//! so no background timer exists and cancellation is simply dropping the
//! clock. Elapsed time accumulates across pauses.

use std::time::{Duration, Instant};

use super::VizError;

/// Default emission interval, one progress update every 50 ms.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of polling the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockTick {
    /// Paused, or the next emission is not due yet.
    Waiting,
    /// Elapsed fraction of the target duration, in `[0, 1)`.
    Progress(f32),
    /// Elapsed time reached the target duration; the clock is spent.
    Completed,
}

/// Pausable elapsed-time timer emitting periodic progress fractions.
#[derive(Debug)]
pub struct ProgressClock {
    duration: Duration,
    interval: Duration,
    /// Elapsed time banked across previous running stretches.
    banked: Duration,
    /// Set while running; `None` while paused.
    running_since: Option<Instant>,
    /// Elapsed value at which the last emission happened.
    last_emit: Duration,
}

impl ProgressClock {
    /// Creates a clock for the given target duration and starts it.
    ///
    /// The first emission is due one interval after start; starting never
    /// fires immediately.
    pub fn start(duration: Duration, interval: Duration, now: Instant) -> Self {
        Self {
            duration,
            interval,
            banked: Duration::ZERO,
            running_since: Some(now),
            last_emit: Duration::ZERO,
        }
    }

    /// Resumes a paused clock. Resuming an already running clock simply
    /// continues it.
    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Freezes elapsed time.
    ///
    /// # Errors
    /// - `NotPlaying` if the clock is not currently running
    pub fn pause(&mut self, now: Instant) -> Result<(), VizError> {
        let since = self.running_since.take().ok_or(VizError::NotPlaying)?;
        self.banked += now.duration_since(since);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Total elapsed time, excluding paused stretches.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.running_since {
            Some(since) => self.banked + now.duration_since(since),
            None => self.banked,
        }
    }

    /// Polls the clock.
    ///
    /// Emits at most one `Progress` per interval. Once elapsed time reaches
    /// the target duration, emits `Completed`; the caller is expected to
    /// discard the clock.
    pub fn tick(&mut self, now: Instant) -> ClockTick {
        if self.running_since.is_none() {
            return ClockTick::Waiting;
        }

        let elapsed = self.elapsed(now);
        if elapsed >= self.duration {
            return ClockTick::Completed;
        }
        if elapsed < self.last_emit + self.interval {
            return ClockTick::Waiting;
        }

        self.last_emit = elapsed;
        ClockTick::Progress(elapsed.as_secs_f32() / self.duration.as_secs_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    /// Polls the clock every millisecond of simulated time and collects
    /// emitted fractions until completion.
    fn run_to_completion(duration: Duration) -> Vec<f32> {
        let start = Instant::now();
        let mut clock = ProgressClock::start(duration, INTERVAL, start);
        let mut fractions = Vec::new();

        for ms in 0.. {
            let now = start + Duration::from_millis(ms);
            match clock.tick(now) {
                ClockTick::Waiting => {}
                ClockTick::Progress(fraction) => fractions.push(fraction),
                ClockTick::Completed => break,
            }
        }
        fractions
    }

    #[test]
    fn does_not_fire_immediately_on_start() {
        let start = Instant::now();
        let mut clock = ProgressClock::start(Duration::from_secs(1), INTERVAL, start);
        assert_eq!(clock.tick(start), ClockTick::Waiting);
    }

    #[test]
    fn emits_floor_of_duration_over_interval_ticks() {
        let fractions = run_to_completion(Duration::from_millis(500));
        // floor(500/50) = 10, minus the completion boundary tick; allow +-1.
        assert!((9..=10).contains(&fractions.len()), "{}", fractions.len());
    }

    #[test]
    fn fractions_are_monotonic_and_below_one() {
        let fractions = run_to_completion(Duration::from_millis(400));
        assert!(!fractions.is_empty());
        for pair in fractions.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(fractions.iter().all(|f| (0.0..1.0).contains(f)));
    }

    #[test]
    fn paused_interval_does_not_count_toward_elapsed() {
        let start = Instant::now();
        let mut clock = ProgressClock::start(Duration::from_secs(10), INTERVAL, start);

        let at_pause = start + Duration::from_millis(300);
        clock.pause(at_pause).unwrap();

        // A long wall-clock gap while paused changes nothing.
        let after_gap = at_pause + Duration::from_secs(60);
        assert_eq!(clock.elapsed(after_gap), Duration::from_millis(300));
        assert_eq!(clock.tick(after_gap), ClockTick::Waiting);

        clock.resume(after_gap);
        let later = after_gap + Duration::from_millis(200);
        assert_eq!(clock.elapsed(later), Duration::from_millis(500));
    }

    #[test]
    fn pause_when_not_running_is_an_error() {
        let start = Instant::now();
        let mut clock = ProgressClock::start(Duration::from_secs(1), INTERVAL, start);
        clock.pause(start + INTERVAL).unwrap();
        assert_eq!(clock.pause(start + INTERVAL), Err(VizError::NotPlaying));
    }

    #[test]
    fn resume_while_running_continues_without_reset() {
        let start = Instant::now();
        let mut clock = ProgressClock::start(Duration::from_secs(1), INTERVAL, start);
        let mid = start + Duration::from_millis(120);
        clock.resume(mid);
        assert_eq!(clock.elapsed(mid), Duration::from_millis(120));
    }

    #[test]
    fn completes_once_duration_is_reached() {
        let start = Instant::now();
        let mut clock = ProgressClock::start(Duration::from_millis(100), INTERVAL, start);
        let past_end = start + Duration::from_millis(100);
        assert_eq!(clock.tick(past_end), ClockTick::Completed);
    }
}
