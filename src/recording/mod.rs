//! Audio recording feature for wavebar.
//!
//! Provides audio capture, metering, and the terminal bar display used by
//! both the record and play loops.

pub mod audio;
pub mod ui;

pub use audio::AudioCapture;
pub use ui::{InputCommand, WaveTui};
