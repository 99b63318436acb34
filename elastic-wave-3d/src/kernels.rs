//! Velocity-stress update kernels for an isotropic elastic medium.
//!
//! Every kernel adds `dt * rate` to its target field; nothing is
//! overwritten. `del1..del3` hold whatever derivatives the preceding
//! schedule stages wrote, so their physical meaning depends on the caller.

use ndarray::s;
use rayon::prelude::*;

use crate::field::Field3;
use crate::Real;

/// Adds `increment(i, j, k)` to every cell with `i < ex`, `j < ey`, `k < ez`.
/// One z-slab per task; slabs are disjoint so no synchronisation is needed.
fn accumulate<F>(target: &mut Field3, (ex, ey, ez): (usize, usize, usize), increment: F)
where
    F: Fn(usize, usize, usize) -> Real + Sync,
{
    target
        .array_mut()
        .slice_mut(s![..ez, .., ..])
        .axis_iter_mut(ndarray::Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(k, mut slab)| {
            for j in 0..ey {
                for i in 0..ex {
                    slab[[j, i]] += increment(i, j, k);
                }
            }
        });
}

/// `vx += dt * 2 / (rho[i] + rho[i+1]) * (del1 + del2 + del3)`.
///
/// The last x index is skipped: vx lives at `i + 1/2`.
pub fn compute_vx(
    vx: &mut Field3,
    rho: &Field3,
    del1: &Field3,
    del2: &Field3,
    del3: &Field3,
    dt: Real,
) {
    let (nx, ny, nz) = vx.dims();
    let (rho, d1, d2, d3) = (rho.array(), del1.array(), del2.array(), del3.array());
    accumulate(vx, (nx.saturating_sub(1), ny, nz), |i, j, k| {
        let buoyancy = 2.0 / (rho[[k, j, i]] + rho[[k, j, i + 1]]);
        dt * buoyancy * (d1[[k, j, i]] + d2[[k, j, i]] + d3[[k, j, i]])
    });
}

/// Same as [`compute_vx`] with density averaged along y.
pub fn compute_vy(
    vy: &mut Field3,
    rho: &Field3,
    del1: &Field3,
    del2: &Field3,
    del3: &Field3,
    dt: Real,
) {
    let (nx, ny, nz) = vy.dims();
    let (rho, d1, d2, d3) = (rho.array(), del1.array(), del2.array(), del3.array());
    accumulate(vy, (nx, ny.saturating_sub(1), nz), |i, j, k| {
        let buoyancy = 2.0 / (rho[[k, j, i]] + rho[[k, j + 1, i]]);
        dt * buoyancy * (d1[[k, j, i]] + d2[[k, j, i]] + d3[[k, j, i]])
    });
}

/// Same as [`compute_vx`] with density averaged along z.
pub fn compute_vz(
    vz: &mut Field3,
    rho: &Field3,
    del1: &Field3,
    del2: &Field3,
    del3: &Field3,
    dt: Real,
) {
    let (nx, ny, nz) = vz.dims();
    let (rho, d1, d2, d3) = (rho.array(), del1.array(), del2.array(), del3.array());
    accumulate(vz, (nx, ny, nz.saturating_sub(1)), |i, j, k| {
        let buoyancy = 2.0 / (rho[[k, j, i]] + rho[[k + 1, j, i]]);
        dt * buoyancy * (d1[[k, j, i]] + d2[[k, j, i]] + d3[[k, j, i]])
    });
}

/// `sxy += dt * <mu>_xy * (del1 + del2)`, mu averaged over the x-y cell face.
pub fn compute_sxy(sxy: &mut Field3, mu: &Field3, del1: &Field3, del2: &Field3, dt: Real) {
    let (nx, ny, nz) = sxy.dims();
    let (mu, d1, d2) = (mu.array(), del1.array(), del2.array());
    accumulate(sxy, (nx.saturating_sub(1), ny.saturating_sub(1), nz), |i, j, k| {
        let mu_avg = (mu[[k, j, i]] + mu[[k, j, i + 1]] + mu[[k, j + 1, i]] + mu[[k, j + 1, i + 1]])
            * 0.25;
        dt * mu_avg * (d1[[k, j, i]] + d2[[k, j, i]])
    });
}

/// `syz += dt * <mu>_yz * (del1 + del2)`, mu averaged over the y-z cell face.
pub fn compute_syz(syz: &mut Field3, mu: &Field3, del1: &Field3, del2: &Field3, dt: Real) {
    let (nx, ny, nz) = syz.dims();
    let (mu, d1, d2) = (mu.array(), del1.array(), del2.array());
    accumulate(syz, (nx, ny.saturating_sub(1), nz.saturating_sub(1)), |i, j, k| {
        let mu_avg = (mu[[k, j, i]] + mu[[k, j + 1, i]] + mu[[k + 1, j, i]] + mu[[k + 1, j + 1, i]])
            * 0.25;
        dt * mu_avg * (d1[[k, j, i]] + d2[[k, j, i]])
    });
}

/// `sxz += dt * <mu> * (del1 + del2)`.
///
/// Unlike `sxy` and `syz`, the rigidity is sampled at `(i, j, k)`,
/// `(i+1, j, k)`, `(i, j+1, k)` and `(i+1, j, k+1)`, the stencil the
/// published reference runs use. On the last y row the `(i, j+1, k)` sample
/// follows the flattened storage order and reads `(i, 0, k+1)`. Uniform
/// models are unaffected.
pub fn compute_sxz(sxz: &mut Field3, mu: &Field3, del1: &Field3, del2: &Field3, dt: Real) {
    let (nx, ny, nz) = sxz.dims();
    let (mu, d1, d2) = (mu.array(), del1.array(), del2.array());
    accumulate(sxz, (nx.saturating_sub(1), ny, nz.saturating_sub(1)), |i, j, k| {
        let next_row = if j + 1 < ny { mu[[k, j + 1, i]] } else { mu[[k + 1, 0, i]] };
        let mu_avg = (mu[[k, j, i]] + mu[[k, j, i + 1]] + next_row + mu[[k + 1, j, i + 1]]) * 0.25;
        dt * mu_avg * (d1[[k, j, i]] + d2[[k, j, i]])
    });
}

/// Normal stresses from the three diagonal strain rates, over every cell.
///
/// Expects `del1 = dvz/dz`, `del2 = dvx/dx`, `del3 = dvy/dy`:
///
/// ```text
/// sxx += dt * ((lambda + 2 mu) * del2 + lambda * (del1 + del3))
/// syy += dt * ((lambda + 2 mu) * del3 + lambda * (del1 + del2))
/// szz += dt * ((lambda + 2 mu) * del1 + lambda * (del2 + del3))
/// ```
#[allow(clippy::too_many_arguments)]
pub fn compute_sxx_syy_szz(
    sxx: &mut Field3,
    syy: &mut Field3,
    szz: &mut Field3,
    del1: &Field3,
    del2: &Field3,
    del3: &Field3,
    lambda: &Field3,
    mu: &Field3,
    dt: Real,
) {
    let (nx, ny, _) = sxx.dims();
    let (d1, d2, d3) = (del1.array(), del2.array(), del3.array());
    let (lambda, mu) = (lambda.array(), mu.array());

    sxx.array_mut()
        .axis_iter_mut(ndarray::Axis(0))
        .into_par_iter()
        .zip(syy.array_mut().axis_iter_mut(ndarray::Axis(0)))
        .zip(szz.array_mut().axis_iter_mut(ndarray::Axis(0)))
        .enumerate()
        .for_each(|(k, ((mut sxx, mut syy), mut szz))| {
            for j in 0..ny {
                for i in 0..nx {
                    let l = lambda[[k, j, i]];
                    let l2m = l + 2.0 * mu[[k, j, i]];
                    let (e1, e2, e3) = (d1[[k, j, i]], d2[[k, j, i]], d3[[k, j, i]]);
                    sxx[[j, i]] += dt * (l2m * e2 + l * (e1 + e3));
                    syy[[j, i]] += dt * (l2m * e3 + l * (e1 + e2));
                    szz[[j, i]] += dt * (l2m * e1 + l * (e2 + e3));
                }
            }
        });
}
