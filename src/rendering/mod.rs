//! # Rendering Module
//!
//! Text rendering of generated grids for tooling and debugging. Each tile
//! kind maps to one fixed ASCII glyph.

pub mod ascii;

pub use ascii::*;
