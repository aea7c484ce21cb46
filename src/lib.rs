//! # Strata
//!
//! Deterministic procedural terrain and dungeon generation.
//!
//! ## Architecture Overview
//!
//! Strata turns an integer seed plus a small parameter set into a fully specified
//! 2D tile grid. The crate is organised around a few key concepts:
//!
//! - **Grid**: the tile taxonomy, the bounds-safe grid container and flood-fill tools
//! - **Generators**: five single-biome algorithms (BSP rooms, cellular caves, mazes,
//!   Poisson-disc forests, subdivided cities) behind one `Generator` contract
//! - **Composition**: Voronoi partitioning, per-region generation and transition blending
//! - **Stitching**: multi-level dungeons joined by aligned stairways
//! - **Rendering**: fixed ASCII glyphs for tooling and debugging
//!
//! ## Determinism
//!
//! Every generation call owns a private random stream derived from its seed. The same
//! seed and parameters always produce the same grid, room list and stair coordinates.

pub mod generation;
pub mod grid;
pub mod rendering;

pub use generation::*;
pub use grid::*;
pub use rendering::*;

/// Core error type for the Strata generation engine.
#[derive(thiserror::Error, Debug)]
pub enum StrataError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Dimensions or tunables are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A composite region could not be generated
    #[error("Region {region} ({generator}) failed: {source}")]
    RegionFailed {
        region: usize,
        generator: &'static str,
        #[source]
        source: Box<StrataError>,
    },

    /// Generated grid does not meet its quality bar
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Stairs could not be placed between two levels
    #[error("Cannot connect level {upper} to level {lower}: {reason}")]
    Connectivity {
        upper: usize,
        lower: usize,
        reason: String,
    },
}

/// Result type used throughout the Strata codebase.
pub type StrataResult<T> = Result<T, StrataError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Generation limits and defaults.
pub mod config {
    /// Default map width in tiles
    pub const DEFAULT_WIDTH: u32 = 80;

    /// Default map height in tiles
    pub const DEFAULT_HEIGHT: u32 = 40;

    /// Largest dimension accepted by the general generators
    pub const MAX_DIMENSION: u32 = 10_000;

    /// Largest dimension accepted by the biome-aware generators (forest, city)
    pub const MAX_BIOME_DIMENSION: u32 = 1_000;

    /// Smallest composite map width
    pub const MIN_COMPOSITE_WIDTH: u32 = 60;

    /// Smallest composite map height
    pub const MIN_COMPOSITE_HEIGHT: u32 = 40;

    /// Largest composite map dimension
    pub const MAX_COMPOSITE_DIMENSION: u32 = 500;

    /// Smallest sub-grid generated for one composite region
    pub const MIN_REGION_WIDTH: u32 = 20;

    /// Smallest sub-grid generated for one composite region
    pub const MIN_REGION_HEIGHT: u32 = 15;

    /// Maximum number of stitched levels
    pub const MAX_LEVELS: usize = 20;

    /// Connected regions at or below this size are culled instead of joined
    pub const SMALL_REGION_TILES: usize = 10;
}
