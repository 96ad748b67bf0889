//! Shortsmith Plan Model
//!
//! Defines the data contracts shared by every stage of the pipeline:
//! - **Plan:** the ordered list of clip descriptors read from JSON
//! - **Target:** output geometry, margins and thumbnail styling
//! - **Naming:** deterministic output file names derived from a clip
//! - **Record:** per-clip result rows and the CSV manifest
//!
//! Times are plain `f64` seconds relative to the start of the source media.

pub mod naming;
pub mod plan;
pub mod record;
pub mod target;

pub use naming::*;
pub use plan::*;
pub use record::*;
pub use target::*;
