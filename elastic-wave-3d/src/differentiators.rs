//! 8th-order staggered-grid first-derivative operators.
//!
//! A forward operator evaluates the derivative half a cell ahead of the
//! output index (`i + 1/2`), a backward operator half a cell behind
//! (`i - 1/2`). Cells closer than [`HALF_LENGTH`] to any face of the array
//! are not evaluated and come out as exactly zero.

use ndarray::s;
use rayon::prelude::*;

use crate::field::Field3;
use crate::Real;

/// Operator half length.
pub const HALF_LENGTH: usize = 8;

/// Staggered-grid differentiation weights for `HALF_LENGTH = 8`.
pub const W: [Real; HALF_LENGTH] = [
    1.2627, -0.1312, 0.0412, -0.0170, 0.0076, -0.0034, 0.0014, -0.0005,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Offset {
    Forward,
    Backward,
}

impl Offset {
    /// Distances `(ahead, behind)` of the two samples paired with weight `l`.
    #[inline]
    fn taps(self, l: usize) -> (usize, usize) {
        match self {
            Offset::Forward => (l + 1, l),
            Offset::Backward => (l, l + 1),
        }
    }
}

/// Writes `scale * d(from)/d(axis)` into `to`, overwriting all of it.
///
/// `to` is cleared first so the untouched border holds zero rather than
/// whatever the previous stage left there. Arrays with an axis no longer
/// than `2 * HALF_LENGTH` produce an all-zero result.
pub fn differentiate(to: &mut Field3, from: &Field3, axis: Axis, offset: Offset, scale: Real) {
    debug_assert_eq!(to.dims(), from.dims());
    to.fill(0.0);

    let (nx, ny, nz) = from.dims();
    let h = HALF_LENGTH;
    if nx <= 2 * h || ny <= 2 * h || nz <= 2 * h {
        return;
    }

    let src = from.array();
    to.array_mut()
        .slice_mut(s![h..nz - h, .., ..])
        .axis_iter_mut(ndarray::Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(slab_index, mut slab)| {
            let k = slab_index + h;
            for j in h..ny - h {
                for i in h..nx - h {
                    let mut acc: Real = 0.0;
                    for (l, w) in W.iter().enumerate() {
                        let (ahead, behind) = offset.taps(l);
                        let diff = match axis {
                            Axis::X => src[[k, j, i + ahead]] - src[[k, j, i - behind]],
                            Axis::Y => src[[k, j + ahead, i]] - src[[k, j - behind, i]],
                            Axis::Z => src[[k + ahead, j, i]] - src[[k - behind, j, i]],
                        };
                        acc += w * diff;
                    }
                    slab[[j, i]] = acc * scale;
                }
            }
        });
}

pub fn dx_forward(to: &mut Field3, from: &Field3, scale: Real) {
    differentiate(to, from, Axis::X, Offset::Forward, scale);
}

pub fn dx_backward(to: &mut Field3, from: &Field3, scale: Real) {
    differentiate(to, from, Axis::X, Offset::Backward, scale);
}

pub fn dy_forward(to: &mut Field3, from: &Field3, scale: Real) {
    differentiate(to, from, Axis::Y, Offset::Forward, scale);
}

pub fn dy_backward(to: &mut Field3, from: &Field3, scale: Real) {
    differentiate(to, from, Axis::Y, Offset::Backward, scale);
}

pub fn dz_forward(to: &mut Field3, from: &Field3, scale: Real) {
    differentiate(to, from, Axis::Z, Offset::Forward, scale);
}

pub fn dz_backward(to: &mut Field3, from: &Field3, scale: Real) {
    differentiate(to, from, Axis::Z, Offset::Backward, scale);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const N: usize = 24;
    const OFFSETS: [Offset; 2] = [Offset::Forward, Offset::Backward];

    fn coordinate(axis: Axis, i: usize, j: usize, k: usize) -> usize {
        match axis {
            Axis::X => i,
            Axis::Y => j,
            Axis::Z => k,
        }
    }

    fn in_valid_interior(i: usize, j: usize, k: usize) -> bool {
        let inside = |c: usize| (HALF_LENGTH..N - HALF_LENGTH).contains(&c);
        inside(i) && inside(j) && inside(k)
    }

    // Σ W[l] (2l + 1), the response of the stencil to a unit ramp.
    fn ramp_gain() -> f64 {
        W.iter()
            .enumerate()
            .map(|(l, &w)| w as f64 * (2 * l + 1) as f64)
            .sum()
    }

    #[test]
    fn weights_are_stored_as_f32_literals() {
        assert_eq!(W[0].to_bits(), 1.2627f32.to_bits());
        assert_eq!(W[7].to_bits(), (-0.0005f32).to_bits());
        assert_eq!(W.len(), HALF_LENGTH);
    }

    #[test]
    fn constant_field_has_zero_derivative() {
        let from = Field3::from_fn(N, N, N, |_, _, _| 3.25);
        let mut to = Field3::zeros(N, N, N);
        for axis in Axis::ALL {
            for offset in OFFSETS {
                differentiate(&mut to, &from, axis, offset, 0.1);
                assert!(to.iter().all(|&v| v == 0.0), "{axis:?} {offset:?}");
            }
        }
    }

    #[test]
    fn ramp_gives_scaled_weight_sum() {
        let scale: Real = 0.1;
        let expected = scale as f64 * ramp_gain();
        let mut to = Field3::zeros(N, N, N);
        for axis in Axis::ALL {
            let from = Field3::from_fn(N, N, N, |i, j, k| coordinate(axis, i, j, k) as Real);
            for offset in OFFSETS {
                differentiate(&mut to, &from, axis, offset, scale);
                for k in 0..N {
                    for j in 0..N {
                        for i in 0..N {
                            let v = to[(i, j, k)];
                            if in_valid_interior(i, j, k) {
                                assert_relative_eq!(v as f64, expected, max_relative = 1e-5);
                            } else {
                                assert_eq!(v, 0.0);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn ramp_along_other_axis_is_invisible() {
        let from = Field3::from_fn(N, N, N, |i, _, _| i as Real);
        let mut to = Field3::zeros(N, N, N);
        dy_forward(&mut to, &from, 1.0);
        assert_eq!(to.max_abs(), 0.0);
        dz_backward(&mut to, &from, 1.0);
        assert_eq!(to.max_abs(), 0.0);
    }

    #[test]
    fn forward_and_backward_sample_half_a_cell_apart() {
        // d/dx (x^2) at x = i + 1/2 is 2i + 1, at x = i - 1/2 it is 2i - 1.
        let from = Field3::from_fn(N, N, N, |i, _, _| (i * i) as Real);
        let mut fwd = Field3::zeros(N, N, N);
        let mut bwd = Field3::zeros(N, N, N);
        dx_forward(&mut fwd, &from, 1.0);
        dx_backward(&mut bwd, &from, 1.0);
        let gain = ramp_gain();
        for i in HALF_LENGTH..N - HALF_LENGTH {
            let c = N / 2;
            assert_relative_eq!(
                fwd[(i, c, c)] as f64,
                (2 * i + 1) as f64 * gain,
                max_relative = 1e-4
            );
            assert_relative_eq!(
                bwd[(i, c, c)] as f64,
                (2 * i - 1) as f64 * gain,
                max_relative = 1e-4
            );
        }
    }

    #[test]
    fn boundary_band_is_zero_for_any_input() {
        let from = Field3::from_fn(N, N, N, |i, j, k| ((i * 7 + j * 13 + k * 31) % 17) as Real - 8.0);
        let mut to = Field3::from_fn(N, N, N, |_, _, _| 99.0);
        for axis in Axis::ALL {
            for offset in OFFSETS {
                differentiate(&mut to, &from, axis, offset, 1.0);
                for k in 0..N {
                    for j in 0..N {
                        for i in 0..N {
                            if !in_valid_interior(i, j, k) {
                                assert_eq!(to[(i, j, k)], 0.0);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn short_axis_yields_all_zero_output() {
        let n_short = 2 * HALF_LENGTH;
        let from = Field3::from_fn(N, n_short, N, |i, j, _| (i + j) as Real);
        let mut to = Field3::from_fn(N, n_short, N, |_, _, _| 1.0);
        dx_forward(&mut to, &from, 1.0);
        assert_eq!(to.max_abs(), 0.0);
    }

    #[test]
    fn sign_follows_gradient_direction() {
        let from = Field3::from_fn(N, N, N, |_, _, k| -(k as Real));
        let mut to = Field3::zeros(N, N, N);
        dz_forward(&mut to, &from, 2.0);
        let c = N / 2;
        assert_relative_eq!(to[(c, c, c)] as f64, -2.0 * ramp_gain(), max_relative = 1e-5);
    }
}
