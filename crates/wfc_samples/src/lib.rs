//! Sample-facing side of the solver.
//!
//! This crate provides:
//! - Tileset loading (tiles, weights, colors, neighbor rules) into a propagator
//! - The samples file describing what to generate
//! - PNG and text rendering of solved grids
//! - Run timing statistics

pub mod error;
pub mod render;
pub mod samples;
pub mod tileset;
pub mod timings;
mod xml;

pub use error::LoadError;
pub use render::{render_2d, save_png, text_output};
pub use samples::{load_samples, parse_samples, SampleConfig};
pub use tileset::{parse_color, Tile, Tileset};
pub use timings::{RunTimings, SampleReport};
