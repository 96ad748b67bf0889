//! Shortsmith Render Engine
//!
//! Turns a probed source and a plan into finished shorts.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source ── probe ──┬── video source ── trim/letterbox ── encode ── frame ── thumb.jpg
//!                   │
//!                   └── audio source ── title card ── loop + waveform ── encode
//!                                           │
//!                                           └──────────────────────────────── thumb.jpg
//! plan.srt ── reflow ── .srt (optionally burned into the picture)
//!
//! per-clip records ── manifest.csv
//! ```

pub mod batch;
pub mod clip;
pub mod ffmpeg;
pub mod filters;
pub mod graph;
pub mod probe;

pub use batch::*;
pub use clip::*;
pub use ffmpeg::*;
pub use filters::*;
pub use probe::*;
