//! Shortsmith Text Layout
//!
//! Everything that turns strings into pixels:
//! - **Shaping:** Arabic-script reshaping and bidi reordering for RTL text
//! - **Fonts:** font loading and exact advance-width measurement
//! - **Wrapping:** greedy word wrap against a pixel budget
//! - **Thumbnails:** auto-shrinking, centered title cards
//!
//! Fitting decisions always use measured widths, never character counts.

pub mod font;
pub mod shaping;
pub mod thumbnail;
pub mod wrap;

pub use font::*;
pub use shaping::*;
pub use thumbnail::*;
pub use wrap::*;
