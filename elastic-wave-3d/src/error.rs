//! Error types for simulation setup and I/O.
//!
//! The propagation kernels themselves never fail; errors only surface while
//! building a run or reading/writing files.

use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Grid dimensions or spacings that cannot describe a run.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// Non-physical material parameters.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// Source cell (or one of its dipole neighbours) outside the grid.
    #[error("source at ({0}, {1}, {2}) is outside the grid")]
    SourceOutOfBounds(usize, usize, usize),

    #[error("receiver {index} at ({i}, {j}, {k}) is outside the grid")]
    ReceiverOutOfBounds {
        index: usize,
        i: i64,
        j: i64,
        k: i64,
    },

    /// Malformed legacy VTK input.
    #[error("vtk parse error on line {line}: {message}")]
    Vtk { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
