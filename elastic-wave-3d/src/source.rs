use crate::differentiators::Axis;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::materials::MaterialModel;
use crate::wavefield::Wavefield;
use crate::Real;

/// Source time function sampled once per timestep.
#[derive(Clone, Debug, PartialEq)]
pub struct Wavelet {
    samples: Vec<Real>,
}

impl Wavelet {
    /// Ricker-like pulse: `arg = (pi f0 (dt i - t0))^2`,
    /// `s[i] = amplitude (2 arg - 1) exp(-arg)`.
    pub fn ricker(nt: usize, dt: Real, f0: Real, t0: Real, amplitude: Real) -> Self {
        let samples = (0..nt)
            .map(|i| {
                let arg = std::f32::consts::PI * f0 * (dt * i as Real - t0);
                let arg = arg * arg;
                amplitude * (2.0 * arg - 1.0) * (-arg).exp()
            })
            .collect();
        Self { samples }
    }

    pub fn from_samples(samples: Vec<Real>) -> Self {
        Self { samples }
    }

    /// Sample for step `it`; zero past the end of the series.
    pub fn at(&self, it: usize) -> Real {
        self.samples.get(it).copied().unwrap_or(0.0)
    }

    pub fn samples(&self) -> &[Real] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceMode {
    Monopole = 1,
    Dipole = 2,
}

/// How the wavelet enters the wavefield. Fixed for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Explosive source on the three normal stresses.
    Stress,
    /// Velocity perturbation; `direction` is only used by the monopole.
    Force { mode: ForceMode, direction: Axis },
}

impl SourceKind {
    /// Command-line selector: 1 stress, 2 force monopole, 3 force dipole.
    pub fn from_code(code: u8, direction: Axis) -> Option<Self> {
        match code {
            1 => Some(SourceKind::Stress),
            2 => Some(SourceKind::Force {
                mode: ForceMode::Monopole,
                direction,
            }),
            3 => Some(SourceKind::Force {
                mode: ForceMode::Dipole,
                direction,
            }),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            SourceKind::Stress => 1,
            SourceKind::Force {
                mode: ForceMode::Monopole,
                ..
            } => 2,
            SourceKind::Force {
                mode: ForceMode::Dipole,
                ..
            } => 3,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self.code() {
            1 => "Stress monopole",
            2 => "Force monopole",
            _ => "Force dipole",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PointSource {
    /// Ghost-grid cell `[i, j, k]`.
    pub position: [usize; 3],
    pub kind: SourceKind,
    pub wavelet: Wavelet,
}

impl PointSource {
    pub fn new(position: [usize; 3], kind: SourceKind, wavelet: Wavelet) -> Self {
        Self {
            position,
            kind,
            wavelet,
        }
    }

    /// Source at the grid centre with the reference wavelet (f0 = 5 Hz,
    /// t0 = 0.3 s, amplitude 10e3).
    pub fn centred(grid: &Grid, kind: SourceKind) -> Self {
        let wavelet = Wavelet::ricker(grid.nt, grid.dt, 5.0, 0.3, 10e3);
        Self::new(grid.centre(), kind, wavelet)
    }

    /// Rejects positions whose touched cells fall outside the grid.
    pub fn check_bounds(&self, grid: &Grid) -> Result<()> {
        let [i, j, k] = self.position;
        let inside = match self.kind {
            SourceKind::Force {
                mode: ForceMode::Dipole,
                ..
            } => {
                i >= 1
                    && j >= 1
                    && k >= 1
                    && grid.in_bounds(i + 1, j, k)
                    && grid.in_bounds(i, j + 1, k)
                    && grid.in_bounds(i, j, k + 1)
            }
            _ => grid.in_bounds(i, j, k),
        };
        if inside {
            Ok(())
        } else {
            Err(Error::SourceOutOfBounds(i, j, k))
        }
    }

    /// Adds this step's contribution.
    pub fn inject(&self, it: usize, wavefield: &mut Wavefield, model: &MaterialModel, grid: &Grid) {
        let value = self.wavelet.at(it);
        match self.kind {
            SourceKind::Stress => insert_stress_source(wavefield, value, self.position, grid.dt),
            SourceKind::Force { mode, direction } => insert_force_source(
                wavefield,
                model,
                value,
                self.position,
                grid,
                mode,
                direction,
            ),
        }
    }
}

/// Adds `value * dt` to sxx, syy and szz at one cell.
pub fn insert_stress_source(wavefield: &mut Wavefield, value: Real, [i, j, k]: [usize; 3], dt: Real) {
    let amount = value * dt;
    wavefield.szz.add(i, j, k, amount);
    wavefield.sxx.add(i, j, k, amount);
    wavefield.syy.add(i, j, k, amount);
}

/// Velocity injection scaled by the buoyancy at the source cell.
///
/// A monopole perturbs one component at the cell itself. A dipole adds and
/// subtracts a centred-difference term at the two neighbours along each axis.
pub fn insert_force_source(
    wavefield: &mut Wavefield,
    model: &MaterialModel,
    value: Real,
    [i, j, k]: [usize; 3],
    grid: &Grid,
    mode: ForceMode,
    direction: Axis,
) {
    let amount = value * grid.dt * (1.0 / model.rho[(i, j, k)]);
    match mode {
        ForceMode::Monopole => match direction {
            Axis::X => wavefield.vx.add(i, j, k, amount),
            Axis::Y => wavefield.vy.add(i, j, k, amount),
            Axis::Z => wavefield.vz.add(i, j, k, amount),
        },
        ForceMode::Dipole => {
            let ax = amount * (1.0 / (2.0 * grid.dx));
            wavefield.vx.add(i + 1, j, k, ax);
            wavefield.vx.add(i - 1, j, k, -ax);

            let ay = amount * (1.0 / (2.0 * grid.dy));
            wavefield.vy.add(i, j + 1, k, ay);
            wavefield.vy.add(i, j - 1, k, -ay);

            let az = amount * (1.0 / (2.0 * grid.dz));
            wavefield.vz.add(i, j, k + 1, az);
            wavefield.vz.add(i, j, k - 1, -az);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> Grid {
        Grid::new(8, 8, 8, 20, 0, 10.0, 10.0, 10.0, 0.001)
    }

    #[test]
    fn ricker_follows_closed_form() {
        let w = Wavelet::ricker(400, 0.001, 5.0, 0.3, 10e3);
        assert_eq!(w.len(), 400);
        // Peak magnitude at t = t0 where arg = 0
        assert_relative_eq!(w.at(300), -10e3);
        for &it in &[0usize, 150, 280, 320, 399] {
            let t = 0.001 * it as f64 - 0.3;
            let arg = (std::f64::consts::PI * 5.0 * t).powi(2);
            let expected = 10e3 * (2.0 * arg - 1.0) * (-arg).exp();
            assert_relative_eq!(w.at(it) as f64, expected, epsilon = 1e-3, max_relative = 1e-3);
        }
        assert_eq!(w.at(400), 0.0);
    }

    #[test]
    fn source_codes_round_trip() {
        for code in 1..=3u8 {
            let kind = SourceKind::from_code(code, Axis::X).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(SourceKind::from_code(0, Axis::X).is_none());
        assert_eq!(SourceKind::from_code(3, Axis::Z).unwrap().describe(), "Force dipole");
    }

    #[test]
    fn stress_source_adds_to_normal_stresses_only() {
        let g = grid();
        let mut wf = Wavefield::new(&g);
        insert_stress_source(&mut wf, 2.0, [3, 4, 5], g.dt);
        for field in [&wf.sxx, &wf.syy, &wf.szz] {
            assert_eq!(field[(3, 4, 5)], 0.002);
            assert_eq!(field.max_abs(), 0.002);
        }
        assert_eq!(wf.sxy.max_abs(), 0.0);
        assert_eq!(wf.vx.max_abs(), 0.0);
    }

    #[test]
    fn monopole_hits_selected_component() {
        let g = grid();
        let model = MaterialModel::uniform(&g, 1000.0, 2200.0, 1000.0);
        let mut wf = Wavefield::new(&g);
        insert_force_source(&mut wf, &model, 5.0, [4, 4, 4], &g, ForceMode::Monopole, Axis::Y);
        assert_relative_eq!(wf.vy[(4, 4, 4)], 5.0 * 0.001 / 1000.0, max_relative = 1e-6);
        assert_eq!(wf.vx.max_abs(), 0.0);
        assert_eq!(wf.vz.max_abs(), 0.0);
    }

    #[test]
    fn dipole_is_antisymmetric_about_the_cell() {
        let g = grid();
        let model = MaterialModel::uniform(&g, 1000.0, 2200.0, 1000.0);
        let mut wf = Wavefield::new(&g);
        insert_force_source(&mut wf, &model, 1.0, [4, 4, 4], &g, ForceMode::Dipole, Axis::X);
        let expected = 0.001 / 1000.0 / 20.0;
        assert_relative_eq!(wf.vx[(5, 4, 4)], expected, max_relative = 1e-6);
        assert_relative_eq!(wf.vx[(3, 4, 4)], -expected, max_relative = 1e-6);
        assert_relative_eq!(wf.vy[(4, 5, 4)], expected, max_relative = 1e-6);
        assert_relative_eq!(wf.vz[(4, 4, 3)], -expected, max_relative = 1e-6);
        assert_eq!(wf.vx[(4, 4, 4)], 0.0);
    }

    #[test]
    fn dipole_on_the_boundary_is_rejected() {
        let g = grid();
        let kind = SourceKind::Force {
            mode: ForceMode::Dipole,
            direction: Axis::X,
        };
        let src = PointSource::new([0, 4, 4], kind, Wavelet::from_samples(vec![1.0]));
        assert!(src.check_bounds(&g).is_err());
        let src = PointSource::new([7, 4, 4], SourceKind::Stress, Wavelet::from_samples(vec![1.0]));
        assert!(src.check_bounds(&g).is_ok());
    }
}
