/*
 * Error Module
 *
 * Construction-time configuration errors. Degenerate vectors at runtime are
 * handled where they occur; broken invariants panic.
 */

use thiserror::Error;

/// Errors raised while building a proximity database or obstacle geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlockError {
    /// Every grid axis needs at least one division.
    #[error("invalid grid divisions ({x}, {y}, {z}): every axis needs at least one division")]
    InvalidDivisions { x: i32, y: i32, z: i32 },

    /// Grid extents must be finite and strictly positive.
    #[error("invalid grid size ({x}, {y}, {z}): extents must be finite and positive")]
    InvalidGridSize { x: f32, y: f32, z: f32 },

    /// Rectangle endpoints coincide or are vertically stacked.
    #[error("degenerate obstacle: segment from {start:?} to {end:?} has no horizontal extent")]
    DegenerateObstacle { start: [f32; 3], end: [f32; 3] },

    /// Box footprint must be finite and strictly positive.
    #[error("invalid box dimensions {width} x {depth}")]
    InvalidBoxDimensions { width: f32, depth: f32 },
}

pub type Result<T> = std::result::Result<T, FlockError>;
