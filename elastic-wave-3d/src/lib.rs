//! 3D isotropic elastic wave propagation on a staggered grid.
//!
//! Velocities and stresses are advanced with a leapfrog velocity-stress
//! scheme using 8th-order spatial derivatives. Each step runs a fixed
//! schedule of derivative and update stages (see [`schedule::SCHEDULE`]);
//! every stage is parallelised over z-slabs with rayon.

pub mod config;
pub mod differentiators;
pub mod error;
pub mod field;
pub mod grid;
pub mod hooks;
pub mod kernels;
pub mod materials;
pub mod receivers;
pub mod schedule;
pub mod simulation;
pub mod source;
pub mod visualisation;
pub mod vtk;
pub mod wavefield;

/// Floating-point type of every field, material and source array.
pub type Real = f32;

pub use error::{Error, Result};
pub use field::Field3;
pub use grid::Grid;
pub use hooks::{KernelTimer, StageHook};
pub use materials::MaterialModel;
pub use simulation::{RunSummary, Simulation, SimulationParams};
pub use source::{PointSource, SourceKind, Wavelet};
pub use wavefield::{Component, Energy, Wavefield};
