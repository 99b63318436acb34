//! Ghost-expanded 3D scalar arrays.
//!
//! Every array in a run shares one flattening: `i + j*nx + k*nx*ny`, x
//! fastest, then y, then z. The backing `Array3` is stored with shape
//! `(nz, ny, nx)` in standard layout, which gives exactly that order, so
//! `field[(i, j, k)]` and `array()[[k, j, i]]` address the same cell.

use ndarray::Array3;
use std::ops::{Index, IndexMut};

use crate::grid::Grid;
use crate::Real;

#[derive(Clone, Debug, PartialEq)]
pub struct Field3 {
    data: Array3<Real>,
}

impl Field3 {
    /// Zero-filled field of `nx * ny * nz` cells.
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Self {
        Field3 {
            data: Array3::zeros((nz, ny, nx)),
        }
    }

    /// Field covering the ghost-expanded extent of `grid`.
    pub fn for_grid(grid: &Grid) -> Self {
        Self::zeros(grid.nx_ghost, grid.ny_ghost, grid.nz_ghost)
    }

    pub fn from_fn<F>(nx: usize, ny: usize, nz: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, usize) -> Real,
    {
        Field3 {
            data: Array3::from_shape_fn((nz, ny, nx), |(k, j, i)| f(i, j, k)),
        }
    }

    /// `(nx, ny, nz)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        let (nz, ny, nx) = self.data.dim();
        (nx, ny, nz)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flattened position of `(i, j, k)`.
    #[inline]
    pub fn linear_index(&self, i: usize, j: usize, k: usize) -> usize {
        let (nx, ny, _) = self.dims();
        i + j * nx + k * nx * ny
    }

    /// Inverse of [`Field3::linear_index`].
    pub fn unflatten(&self, n: usize) -> (usize, usize, usize) {
        let (nx, ny, _) = self.dims();
        (n % nx, (n / nx) % ny, n / (nx * ny))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Real {
        self.data[[k, j, i]]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: Real) {
        self.data[[k, j, i]] = value;
    }

    #[inline]
    pub fn add(&mut self, i: usize, j: usize, k: usize, value: Real) {
        self.data[[k, j, i]] += value;
    }

    pub fn fill(&mut self, value: Real) {
        self.data.fill(value);
    }

    /// Underlying array, indexed `[[k, j, i]]`.
    pub fn array(&self) -> &Array3<Real> {
        &self.data
    }

    pub fn array_mut(&mut self) -> &mut Array3<Real> {
        &mut self.data
    }

    /// Values in flattening order.
    pub fn iter(&self) -> impl Iterator<Item = &Real> {
        self.data.iter()
    }

    pub fn max_abs(&self) -> Real {
        self.data.iter().fold(0.0, |acc: Real, v| acc.max(v.abs()))
    }
}

impl Index<(usize, usize, usize)> for Field3 {
    type Output = Real;

    #[inline]
    fn index(&self, (i, j, k): (usize, usize, usize)) -> &Real {
        &self.data[[k, j, i]]
    }
}

impl IndexMut<(usize, usize, usize)> for Field3 {
    #[inline]
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut Real {
        &mut self.data[[k, j, i]]
    }
}
