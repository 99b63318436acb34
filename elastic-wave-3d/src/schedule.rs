//! The fixed stage order of one timestep.
//!
//! Each velocity or stress update is preceded by the derivative stages that
//! fill the scratch buffers it reads. The order is significant: all three
//! velocities are advanced before any stress, and every update consumes the
//! scratch contents written immediately before it.

use crate::differentiators::{Axis, Offset};
use crate::wavefield::{Component, ScratchSlot};

use Axis::{X, Y, Z};
use Component::*;
use Offset::{Backward as B, Forward as F};
use ScratchSlot::{Del1, Del2, Del3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKernel {
    Vx,
    Vy,
    Vz,
    /// sxx, syy and szz in one pass.
    NormalStress,
    Sxy,
    Syz,
    Sxz,
}

impl UpdateKernel {
    /// Components written by this kernel.
    pub fn targets(self) -> &'static [Component] {
        match self {
            UpdateKernel::Vx => &[Component::Vx],
            UpdateKernel::Vy => &[Component::Vy],
            UpdateKernel::Vz => &[Component::Vz],
            UpdateKernel::NormalStress => &[Component::Sxx, Component::Syy, Component::Szz],
            UpdateKernel::Sxy => &[Component::Sxy],
            UpdateKernel::Syz => &[Component::Syz],
            UpdateKernel::Sxz => &[Component::Sxz],
        }
    }

    /// Number of scratch buffers the kernel reads, starting at `del1`.
    pub fn inputs(self) -> usize {
        match self {
            UpdateKernel::Vx | UpdateKernel::Vy | UpdateKernel::Vz | UpdateKernel::NormalStress => 3,
            UpdateKernel::Sxy | UpdateKernel::Syz | UpdateKernel::Sxz => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// `slot = (1 / d_axis) * d(source)/d(axis)`.
    Derivative {
        source: Component,
        axis: Axis,
        offset: Offset,
        slot: ScratchSlot,
    },
    Update(UpdateKernel),
}

/// A stage together with its timing label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageSpec {
    pub label: &'static str,
    pub stage: Stage,
}

impl StageSpec {
    pub fn is_update(&self) -> bool {
        matches!(self.stage, Stage::Update(_))
    }
}

const fn derivative(
    label: &'static str,
    source: Component,
    axis: Axis,
    offset: Offset,
    slot: ScratchSlot,
) -> StageSpec {
    StageSpec {
        label,
        stage: Stage::Derivative {
            source,
            axis,
            offset,
            slot,
        },
    }
}

const fn update(label: &'static str, kernel: UpdateKernel) -> StageSpec {
    StageSpec {
        label,
        stage: Stage::Update(kernel),
    }
}

/// Eighteen derivative stages and seven updates, in execution order.
pub const SCHEDULE: [StageSpec; 25] = [
    // vx
    derivative("dxf", Sxx, X, F, Del1),
    derivative("dzb", Sxz, Z, B, Del2),
    derivative("dyb", Sxy, Y, B, Del3),
    update("cvx", UpdateKernel::Vx),
    // vy
    derivative("dyf", Syy, Y, F, Del1),
    derivative("dzb2", Syz, Z, B, Del2),
    derivative("dxb", Sxy, X, B, Del3),
    update("cvy", UpdateKernel::Vy),
    // vz
    derivative("dzf", Szz, Z, F, Del1),
    derivative("dxb2", Sxz, X, B, Del2),
    derivative("dyb2", Syz, Y, B, Del3),
    update("cvz", UpdateKernel::Vz),
    // sxx, syy, szz
    derivative("dzb3", Vz, Z, B, Del1),
    derivative("dxb3", Vx, X, B, Del2),
    derivative("dyb3", Vy, Y, B, Del3),
    update("csxxsyyszz", UpdateKernel::NormalStress),
    // sxy
    derivative("dyf2", Vx, Y, F, Del1),
    derivative("dxf2", Vy, X, F, Del2),
    update("csxy", UpdateKernel::Sxy),
    // syz
    derivative("dzf2", Vy, Z, F, Del1),
    derivative("dyf3", Vz, Y, F, Del2),
    update("csyz", UpdateKernel::Syz),
    // sxz
    derivative("dxf3", Vz, X, F, Del1),
    derivative("dzf3", Vx, Z, F, Del2),
    update("csxz", UpdateKernel::Sxz),
];
