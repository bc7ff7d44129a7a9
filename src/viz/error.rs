//! Typed failures for misuse of the visualization core.
//!
//! These represent programmer errors (wrong mode, wrong lifecycle order),
//! not runtime conditions. Callers are expected to treat them as fatal
//! during development; in a correctly wired application none of them are
//! reachable.

use thiserror::Error;

use super::Mode;

/// Precondition violations raised by the visualization core.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizError {
    /// An operation was invoked while the visualizer is in the wrong mode,
    /// e.g. appending levels during playback.
    #[error("operation requires {required} mode but visualizer is in {actual} mode")]
    ModeViolation {
        /// Mode the operation requires.
        required: Mode,
        /// Mode the visualizer is actually in.
        actual: Mode,
    },

    /// `pause` was called while no playback sweep is running.
    #[error("cannot pause: playback is not running")]
    NotPlaying,

    /// Playback was requested before any levels were loaded.
    #[error("cannot play: no levels loaded")]
    NoLevels,

    /// The grouping factor must be at least 1.
    #[error("invalid group size {0}: must be at least 1")]
    InvalidGroupSize(usize),
}
