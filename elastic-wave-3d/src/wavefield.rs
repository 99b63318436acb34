use crate::field::Field3;
use crate::grid::Grid;
use crate::materials::MaterialModel;

/// One of the nine physical wavefield components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Sxx,
    Syy,
    Szz,
    Sxy,
    Syz,
    Sxz,
    Vx,
    Vy,
    Vz,
}

impl Component {
    pub const ALL: [Component; 9] = [
        Component::Sxx,
        Component::Syy,
        Component::Szz,
        Component::Sxy,
        Component::Syz,
        Component::Sxz,
        Component::Vx,
        Component::Vy,
        Component::Vz,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Component::Sxx => "sxx",
            Component::Syy => "syy",
            Component::Szz => "szz",
            Component::Sxy => "sxy",
            Component::Syz => "syz",
            Component::Sxz => "sxz",
            Component::Vx => "vx",
            Component::Vy => "vy",
            Component::Vz => "vz",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Index into the three shared derivative buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScratchSlot {
    Del1,
    Del2,
    Del3,
}

impl ScratchSlot {
    pub fn index(self) -> usize {
        match self {
            ScratchSlot::Del1 => 0,
            ScratchSlot::Del2 => 1,
            ScratchSlot::Del3 => 2,
        }
    }
}

pub struct Wavefield {
    // Stresses
    pub sxx: Field3,
    pub syy: Field3,
    pub szz: Field3,
    pub sxy: Field3,
    pub syz: Field3,
    pub sxz: Field3,

    // Particle velocities
    pub vx: Field3,
    pub vy: Field3,
    pub vz: Field3,

    /// `del1`, `del2`, `del3`: derivative buffers reused by every stage.
    pub scratch: [Field3; 3],
}

impl Wavefield {
    /// All twelve arrays zero-filled on the ghost-expanded grid.
    pub fn new(grid: &Grid) -> Self {
        let zeros = || Field3::for_grid(grid);
        Wavefield {
            sxx: zeros(),
            syy: zeros(),
            szz: zeros(),
            sxy: zeros(),
            syz: zeros(),
            sxz: zeros(),
            vx: zeros(),
            vy: zeros(),
            vz: zeros(),
            scratch: [zeros(), zeros(), zeros()],
        }
    }

    pub fn zero(&mut self) {
        for c in Component::ALL {
            self.component_mut(c).fill(0.0);
        }
        for s in &mut self.scratch {
            s.fill(0.0);
        }
    }

    pub fn component(&self, c: Component) -> &Field3 {
        match c {
            Component::Sxx => &self.sxx,
            Component::Syy => &self.syy,
            Component::Szz => &self.szz,
            Component::Sxy => &self.sxy,
            Component::Syz => &self.syz,
            Component::Sxz => &self.sxz,
            Component::Vx => &self.vx,
            Component::Vy => &self.vy,
            Component::Vz => &self.vz,
        }
    }

    pub fn component_mut(&mut self, c: Component) -> &mut Field3 {
        match c {
            Component::Sxx => &mut self.sxx,
            Component::Syy => &mut self.syy,
            Component::Szz => &mut self.szz,
            Component::Sxy => &mut self.sxy,
            Component::Syz => &mut self.syz,
            Component::Sxz => &mut self.sxz,
            Component::Vx => &mut self.vx,
            Component::Vy => &mut self.vy,
            Component::Vz => &mut self.vz,
        }
    }

    pub fn scratch(&self, slot: ScratchSlot) -> &Field3 {
        &self.scratch[slot.index()]
    }

    /// Borrows a source component and a destination scratch buffer at once.
    pub fn derivative_operands(&mut self, source: Component, slot: ScratchSlot) -> (&Field3, &mut Field3) {
        let Wavefield {
            sxx,
            syy,
            szz,
            sxy,
            syz,
            sxz,
            vx,
            vy,
            vz,
            scratch,
        } = self;
        let from: &Field3 = match source {
            Component::Sxx => sxx,
            Component::Syy => syy,
            Component::Szz => szz,
            Component::Sxy => sxy,
            Component::Syz => syz,
            Component::Sxz => sxz,
            Component::Vx => vx,
            Component::Vy => vy,
            Component::Vz => vz,
        };
        (from, &mut scratch[slot.index()])
    }

    /// `|v|` per cell, for plotting.
    pub fn velocity_magnitude(&self) -> Field3 {
        let (nx, ny, nz) = self.vx.dims();
        Field3::from_fn(nx, ny, nz, |i, j, k| {
            let (vx, vy, vz) = (self.vx[(i, j, k)], self.vy[(i, j, k)], self.vz[(i, j, k)]);
            (vx * vx + vy * vy + vz * vz).sqrt()
        })
    }

    pub fn max_abs_velocity(&self) -> f32 {
        self.vx.max_abs().max(self.vy.max_abs()).max(self.vz.max_abs())
    }

    /// Kinetic and strain energy of the current state, summed in f64.
    ///
    /// Cells with non-positive density or shear modulus contribute nothing.
    pub fn energy(&self, model: &MaterialModel) -> Energy {
        let mut kinetic = 0.0f64;
        let mut strain = 0.0f64;

        for n in 0..self.vx.len() {
            let (i, j, k) = self.vx.unflatten(n);
            let at = |f: &Field3| f[(i, j, k)] as f64;

            let rho = at(&model.rho);
            if rho > 0.0 {
                let (vx, vy, vz) = (at(&self.vx), at(&self.vy), at(&self.vz));
                kinetic += 0.5 * rho * (vx * vx + vy * vy + vz * vz);
            }

            let (lambda, mu) = (at(&model.lambda), at(&model.mu));
            if mu > 0.0 {
                let (sxx, syy, szz) = (at(&self.sxx), at(&self.syy), at(&self.szz));
                let (sxy, syz, sxz) = (at(&self.sxy), at(&self.syz), at(&self.sxz));
                let trace = sxx + syy + szz;
                let contraction =
                    sxx * sxx + syy * syy + szz * szz + 2.0 * (sxy * sxy + syz * syz + sxz * sxz);
                strain += (contraction - lambda / (3.0 * lambda + 2.0 * mu) * trace * trace) / (4.0 * mu);
            }
        }

        Energy { kinetic, strain }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Energy {
    pub kinetic: f64,
    pub strain: f64,
}

impl Energy {
    pub fn total(&self) -> f64 {
        self.kinetic + self.strain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(4, 4, 4, 1, 1, 10.0, 10.0, 10.0, 0.001)
    }

    #[test]
    fn new_wavefield_is_zero_everywhere() {
        let wf = Wavefield::new(&grid());
        for c in Component::ALL {
            assert_eq!(wf.component(c).dims(), (6, 6, 6));
            assert_eq!(wf.component(c).max_abs(), 0.0);
        }
        assert!(wf.scratch.iter().all(|s| s.max_abs() == 0.0));
    }

    #[test]
    fn component_names_parse_back() {
        for c in Component::ALL {
            assert_eq!(Component::parse(c.name()), Some(c));
        }
        assert_eq!(Component::parse("pressure"), None);
    }

    #[test]
    fn derivative_operands_pick_the_right_buffers() {
        let mut wf = Wavefield::new(&grid());
        wf.syz.set(1, 2, 3, 4.0);
        let (from, to) = wf.derivative_operands(Component::Syz, ScratchSlot::Del3);
        assert_eq!(from[(1, 2, 3)], 4.0);
        to.set(0, 0, 0, 1.0);
        assert_eq!(wf.scratch(ScratchSlot::Del3)[(0, 0, 0)], 1.0);
        assert_eq!(wf.scratch(ScratchSlot::Del1).max_abs(), 0.0);
    }

    #[test]
    fn zero_clears_components_and_scratch() {
        let mut wf = Wavefield::new(&grid());
        wf.vx.set(1, 1, 1, 3.0);
        wf.scratch[1].set(2, 2, 2, 5.0);
        wf.zero();
        assert_eq!(wf.vx.max_abs(), 0.0);
        assert_eq!(wf.scratch[1].max_abs(), 0.0);
    }

    #[test]
    fn energy_of_single_cell_states() {
        let g = grid();
        let model = MaterialModel::uniform(&g, 1000.0, 2200.0, 1000.0);
        let mut wf = Wavefield::new(&g);

        wf.vy.set(2, 2, 2, 0.5);
        let e = wf.energy(&model);
        assert_relative_eq!(e.kinetic, 0.5 * 1000.0 * 0.25);
        assert_eq!(e.strain, 0.0);

        // Pure shear: W = sxy^2 / (2 mu)
        wf.zero();
        wf.sxy.set(2, 2, 2, 1.0e6);
        let e = wf.energy(&model);
        assert_eq!(e.kinetic, 0.0);
        assert_relative_eq!(e.strain, 1.0e12 / 2.0e9, max_relative = 1e-9);
        assert_relative_eq!(e.total(), e.strain);
    }

    #[test]
    fn velocity_magnitude_combines_components() {
        let mut wf = Wavefield::new(&grid());
        wf.vx.set(1, 1, 1, 3.0);
        wf.vz.set(1, 1, 1, -4.0);
        assert_eq!(wf.velocity_magnitude()[(1, 1, 1)], 5.0);
        assert_eq!(wf.max_abs_velocity(), 4.0);
    }
}
