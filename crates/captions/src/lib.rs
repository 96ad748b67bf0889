//! Shortsmith Captions
//!
//! SRT caption tracks planned alongside each clip:
//! - **Parsing:** block splitting and cue extraction
//! - **Reflow:** re-wrapping cue text to the output frame width
//! - **Generation:** SRT output from structured cues
//!
//! Timing is never modified; only the text lines of well-formed cues change.

pub mod srt;

pub use srt::*;
