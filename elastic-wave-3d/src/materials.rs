use crate::error::{Error, Result};
use crate::field::Field3;
use crate::grid::Grid;
use crate::Real;

/// Which parameter array a staged `input` model is loaded into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialParameter {
    Rho,
    Lambda,
    Mu,
}

pub struct MaterialModel {
    // Ghost-expanded, read-only once time stepping starts
    pub rho: Field3,
    pub lambda: Field3,
    pub mu: Field3,

    // Interior-sized staging buffer for non-uniform models
    pub input: Field3,

    ghost_border: usize,
}

impl MaterialModel {
    /// All arrays zero-initialised.
    pub fn new(grid: &Grid) -> Self {
        Self {
            rho: Field3::for_grid(grid),
            lambda: Field3::for_grid(grid),
            mu: Field3::for_grid(grid),
            input: Field3::zeros(grid.nx, grid.ny, grid.nz),
            ghost_border: grid.ghost_border,
        }
    }

    /// Homogeneous solid built from density and wave speeds.
    pub fn uniform(grid: &Grid, rho: Real, vp: Real, vs: Real) -> Self {
        let mut model = Self::new(grid);
        model.set_uniform(rho, vp, vs);
        model
    }

    /// Fills every cell, ghost border included, with the same medium.
    ///
    /// `mu = rho * vs^2`, `lambda = rho * vp^2 - 2 * mu`.
    pub fn set_uniform(&mut self, rho: Real, vp: Real, vs: Real) {
        let (mu, lambda) = lame_parameters(rho, vp, vs);
        self.rho.fill(rho);
        self.lambda.fill(lambda);
        self.mu.fill(mu);
    }

    /// Copies the staged `input` array into the interior of `target` and
    /// extends the outermost interior values across the ghost border.
    pub fn load_input(&mut self, target: MaterialParameter) {
        let g = self.ghost_border;
        let (nx, ny, nz) = self.input.dims();
        let input = &self.input;
        let field = match target {
            MaterialParameter::Rho => &mut self.rho,
            MaterialParameter::Lambda => &mut self.lambda,
            MaterialParameter::Mu => &mut self.mu,
        };
        if nx == 0 || ny == 0 || nz == 0 {
            return;
        }

        let (gx, gy, gz) = field.dims();
        // Clamp ghost cells to the nearest interior cell
        let clamp = |c: usize, n: usize| c.saturating_sub(g).min(n - 1);
        for k in 0..gz {
            for j in 0..gy {
                for i in 0..gx {
                    field[(i, j, k)] = input[(clamp(i, nx), clamp(j, ny), clamp(k, nz))];
                }
            }
        }
    }

    /// Checks that every cell describes a physical solid.
    pub fn validate(&self) -> Result<()> {
        for ((rho, lambda), mu) in self.rho.iter().zip(self.lambda.iter()).zip(self.mu.iter()) {
            if *rho <= 0.0 {
                return Err(Error::InvalidMaterial(format!("density must be positive, got {rho}")));
            }
            if *mu < 0.0 || *lambda + 2.0 * *mu <= 0.0 {
                return Err(Error::InvalidMaterial(format!(
                    "non-physical Lamé parameters (lambda={lambda}, mu={mu})"
                )));
            }
        }
        Ok(())
    }

    /// Maximum P-wave speed, `sqrt((lambda + 2 mu) / rho)`, over cells with
    /// positive density.
    pub fn max_vp(&self) -> Real {
        let mut vp_max: Real = 0.0;
        for ((rho, lambda), mu) in self.rho.iter().zip(self.lambda.iter()).zip(self.mu.iter()) {
            if *rho > 0.0 {
                let vp = ((lambda + 2.0 * mu) / rho).sqrt();
                if vp > vp_max {
                    vp_max = vp;
                }
            }
        }
        vp_max
    }
}

/// `(mu, lambda)` for density `rho` and wave speeds `vp`, `vs`.
pub fn lame_parameters(rho: Real, vp: Real, vs: Real) -> (Real, Real) {
    let mu = rho * vs * vs;
    let lambda = vp * vp * rho - 2.0 * mu;
    (mu, lambda)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(6, 5, 4, 1, 2, 10.0, 10.0, 10.0, 0.001)
    }

    #[test]
    fn new_model_is_zeroed_with_interior_input() {
        let model = MaterialModel::new(&grid());
        assert_eq!(model.rho.dims(), (10, 9, 8));
        assert_eq!(model.input.dims(), (6, 5, 4));
        assert_eq!(model.rho.max_abs(), 0.0);
        assert_eq!(model.mu.max_abs(), 0.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn uniform_model_matches_lame_relations() {
        let model = MaterialModel::uniform(&grid(), 1000.0, 2200.0, 1000.0);
        assert!(model.rho.iter().all(|&v| v == 1000.0));
        assert!(model.mu.iter().all(|&v| v == 1.0e9));
        assert!(model.lambda.iter().all(|&v| v == 2.84e9));
        assert!(model.validate().is_ok());
        assert_relative_eq!(model.max_vp(), 2200.0, max_relative = 1e-6);
    }

    #[test]
    fn load_input_fills_interior_and_extends_edges() {
        let g = grid();
        let mut model = MaterialModel::uniform(&g, 1000.0, 2200.0, 1000.0);
        model.input = Field3::from_fn(6, 5, 4, |i, j, k| 2000.0 + (i + 10 * j + 100 * k) as Real);
        model.load_input(MaterialParameter::Rho);

        // Interior cell maps straight across the border offset
        assert_eq!(model.rho[(2 + 3, 2 + 1, 2 + 2)], 2000.0 + 3.0 + 10.0 + 200.0);
        // Ghost corners replicate the nearest interior corner
        assert_eq!(model.rho[(0, 0, 0)], 2000.0);
        assert_eq!(model.rho[(9, 8, 7)], 2000.0 + 5.0 + 40.0 + 300.0);
        // Other parameters untouched
        assert!(model.mu.iter().all(|&v| v == 1.0e9));
    }

    #[test]
    fn validate_rejects_negative_density() {
        let mut model = MaterialModel::uniform(&grid(), 1000.0, 2200.0, 1000.0);
        model.rho[(1, 1, 1)] = -1.0;
        assert!(matches!(model.validate(), Err(Error::InvalidMaterial(_))));
    }
}
