//! Bar scroll animation for write mode.
//!
//! When the bar buffer outgrows the visible capacity, older bars are pushed
//! left by one bar advance (width + spacing) in a fixed number of discrete
//! steps before the next clustering pass snaps them into place. Like the
//! progress clock this is frame-polled; cancellation drops the animation
//! state and is idempotent.

use std::time::{Duration, Instant};

/// Number of discrete steps in one scroll swing.
pub const SCROLL_STEPS: u32 = 20;

#[derive(Debug)]
struct Animation {
    /// Offset decrement applied per step.
    step: f32,
    /// Total swing; the animation ends once the offset reaches `-swing`.
    swing: f32,
    interval: Duration,
    next_step: Instant,
}

/// Computes the transient horizontal offset applied to bars during
/// high-frequency appends.
#[derive(Debug, Default)]
pub struct ScrollAnimator {
    offset: f32,
    animation: Option<Animation>,
}

impl ScrollAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current horizontal displacement, always in `[-swing, 0]`.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Cancels any running animation and zeroes the offset. Safe to call
    /// when nothing is animating.
    pub fn cancel(&mut self) {
        self.animation = None;
        self.offset = 0.0;
    }

    /// Starts a push-left swing of `bar_advance` spread over `span`.
    ///
    /// A running animation is cancelled (and the offset zeroed) first.
    /// A zero span cannot be animated and leaves the animator idle.
    pub fn begin(&mut self, now: Instant, span: Duration, bar_advance: f32) {
        self.cancel();
        if span.is_zero() || bar_advance <= 0.0 {
            return;
        }

        let interval = span / SCROLL_STEPS;
        self.animation = Some(Animation {
            step: bar_advance / SCROLL_STEPS as f32,
            swing: bar_advance,
            interval,
            next_step: now + interval,
        });
    }

    /// Applies all steps that have come due. Returns true when the offset
    /// changed. On reaching the full swing the animation self-cancels and
    /// the offset snaps back to zero, ready for the re-clustered bars.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Some(animation) = self.animation.as_mut() {
            if now < animation.next_step {
                break;
            }

            self.offset -= animation.step;
            animation.next_step += animation.interval;
            changed = true;

            if self.offset <= -animation.swing {
                self.animation = None;
                self.offset = 0.0;
            }
        }

        changed
    }
}
