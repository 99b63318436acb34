use crate::differentiators::Axis;
use crate::error::{Error, Result};
use crate::Real;

/// Geometry and timing of one run. Built once, never changed afterwards.
///
/// `n*` describe the physical interior, `n*_ghost` the allocated extent
/// including the ghost border on both sides of every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub nt: usize,
    pub ghost_border: usize,
    pub dx: Real,
    pub dy: Real,
    pub dz: Real,
    pub dt: Real,
    pub nx_ghost: usize,
    pub ny_ghost: usize,
    pub nz_ghost: usize,
}

impl Grid {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nx: usize,
        ny: usize,
        nz: usize,
        nt: usize,
        ghost_border: usize,
        dz: Real,
        dx: Real,
        dy: Real,
        dt: Real,
    ) -> Self {
        Grid {
            nx,
            ny,
            nz,
            nt,
            ghost_border,
            dx,
            dy,
            dz,
            dt,
            nx_ghost: nx + 2 * ghost_border,
            ny_ghost: ny + 2 * ghost_border,
            nz_ghost: nz + 2 * ghost_border,
        }
    }

    /// Same as [`Grid::new`] but refuses empty axes and non-positive steps.
    #[allow(clippy::too_many_arguments)]
    pub fn checked(
        nx: usize,
        ny: usize,
        nz: usize,
        nt: usize,
        ghost_border: usize,
        dz: Real,
        dx: Real,
        dy: Real,
        dt: Real,
    ) -> Result<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(Error::InvalidGrid(format!(
                "dimensions must be positive (nx={nx}, ny={ny}, nz={nz})"
            )));
        }
        if dx <= 0.0 || dy <= 0.0 || dz <= 0.0 || dt <= 0.0 {
            return Err(Error::InvalidGrid(format!(
                "spacings must be positive (dx={dx}, dy={dy}, dz={dz}, dt={dt})"
            )));
        }
        Ok(Self::new(nx, ny, nz, nt, ghost_border, dz, dx, dy, dt))
    }

    /// Allocated extent as `(nx_ghost, ny_ghost, nz_ghost)`.
    pub fn ghost_dims(&self) -> (usize, usize, usize) {
        (self.nx_ghost, self.ny_ghost, self.nz_ghost)
    }

    pub fn interior_dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Number of allocated cells per array.
    pub fn cells(&self) -> usize {
        self.nx_ghost * self.ny_ghost * self.nz_ghost
    }

    pub fn interior_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn spacing(&self, axis: Axis) -> Real {
        match axis {
            Axis::X => self.dx,
            Axis::Y => self.dy,
            Axis::Z => self.dz,
        }
    }

    /// Differentiator scale factor for an axis (`1/dx`, `1/dy` or `1/dz`).
    pub fn inverse_spacing(&self, axis: Axis) -> Real {
        1.0 / self.spacing(axis)
    }

    pub fn extent(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.nx_ghost,
            Axis::Y => self.ny_ghost,
            Axis::Z => self.nz_ghost,
        }
    }

    /// Centre cell of the ghost-expanded grid, the default source position.
    pub fn centre(&self) -> [usize; 3] {
        [self.nx_ghost / 2, self.ny_ghost / 2, self.nz_ghost / 2]
    }

    pub fn in_bounds(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.nx_ghost && j < self.ny_ghost && k < self.nz_ghost
    }

    /// Physical coordinates of a cell, measured from the ghost-grid origin.
    pub fn coords(&self, i: usize, j: usize, k: usize) -> [Real; 3] {
        [
            i as Real * self.dx,
            j as Real * self.dy,
            k as Real * self.dz,
        ]
    }

    pub fn total_time(&self) -> f64 {
        self.nt as f64 * self.dt as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_dims_add_border_on_both_sides() {
        let grid = Grid::new(32, 16, 8, 10, 4, 10.0, 5.0, 2.5, 0.001);
        assert_eq!(grid.ghost_dims(), (40, 24, 16));
        assert_eq!(grid.interior_dims(), (32, 16, 8));
        assert_eq!(grid.cells(), 40 * 24 * 16);
        assert_eq!(grid.interior_cells(), 32 * 16 * 8);
    }

    #[test]
    fn spacing_argument_order_is_z_x_y() {
        let grid = Grid::new(4, 4, 4, 1, 0, 1.0, 2.0, 3.0, 0.5);
        assert_eq!(grid.dz, 1.0);
        assert_eq!(grid.dx, 2.0);
        assert_eq!(grid.dy, 3.0);
        assert_eq!(grid.inverse_spacing(Axis::X), 0.5);
    }

    #[test]
    fn centre_uses_ghost_extent() {
        let grid = Grid::new(32, 32, 32, 10, 2, 10.0, 10.0, 10.0, 0.001);
        assert_eq!(grid.centre(), [18, 18, 18]);
        assert!(grid.in_bounds(35, 35, 35));
        assert!(!grid.in_bounds(36, 0, 0));
    }

    #[test]
    fn checked_rejects_degenerate_input() {
        assert!(Grid::checked(0, 4, 4, 1, 0, 1.0, 1.0, 1.0, 0.1).is_err());
        assert!(Grid::checked(4, 4, 4, 1, 0, 1.0, -1.0, 1.0, 0.1).is_err());
        assert!(Grid::checked(4, 4, 4, 0, 0, 1.0, 1.0, 1.0, 0.1).is_ok());
    }
}
