//! Point receivers sampled once per timestep, before the stencil update.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::wavefield::Wavefield;
use crate::Real;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Mean normal stress, `(sxx + syy + szz) / 3`.
    Pressure,
    Vx,
    Vy,
    Vz,
}

impl Channel {
    pub fn header(self) -> &'static str {
        match self {
            Channel::Pressure => "P",
            Channel::Vx => "Vx",
            Channel::Vy => "Vy",
            Channel::Vz => "Vz",
        }
    }

    fn sample(self, wf: &Wavefield, (i, j, k): (usize, usize, usize)) -> Real {
        match self {
            Channel::Pressure => (wf.sxx[(i, j, k)] + wf.syy[(i, j, k)] + wf.szz[(i, j, k)]) * (1.0 / 3.0),
            Channel::Vx => wf.vx[(i, j, k)],
            Channel::Vy => wf.vy[(i, j, k)],
            Channel::Vz => wf.vz[(i, j, k)],
        }
    }
}

/// Which quantities each receiver records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channels {
    pub pressure: bool,
    pub vx: bool,
    pub vy: bool,
    pub vz: bool,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            pressure: false,
            vx: true,
            vy: true,
            vz: true,
        }
    }
}

impl Channels {
    fn enabled(&self) -> Vec<Channel> {
        [
            (self.pressure, Channel::Pressure),
            (self.vx, Channel::Vx),
            (self.vy, Channel::Vy),
            (self.vz, Channel::Vz),
        ]
        .into_iter()
        .filter_map(|(on, c)| on.then_some(c))
        .collect()
    }
}

pub struct ReceiverSet {
    positions: Vec<[usize; 3]>,
    nt: usize,
    // One `positions.len() * nt` buffer per enabled channel, receiver-major
    traces: Vec<(Channel, Vec<Real>)>,
}

impl ReceiverSet {
    /// Receivers at ghost-grid cells; any position outside the grid is an error.
    pub fn new(grid: &Grid, channels: Channels, positions: &[[i64; 3]]) -> Result<Self> {
        let (gx, gy, gz) = grid.ghost_dims();
        let mut cells = Vec::with_capacity(positions.len());
        for (index, &[i, j, k]) in positions.iter().enumerate() {
            let inside = |c: i64, n: usize| c >= 0 && (c as usize) < n;
            if !(inside(i, gx) && inside(j, gy) && inside(k, gz)) {
                return Err(Error::ReceiverOutOfBounds { index, i, j, k });
            }
            cells.push([i as usize, j as usize, k as usize]);
        }

        let samples = cells.len() * grid.nt;
        let traces = channels
            .enabled()
            .into_iter()
            .map(|c| (c, vec![0.0; samples]))
            .collect();

        Ok(Self {
            positions: cells,
            nt: grid.nt,
            traces,
        })
    }

    /// The fixed verification layout for the reference cube sizes.
    pub fn verification(grid: &Grid, channels: Channels, source: [usize; 3]) -> Result<Self> {
        Self::new(grid, channels, &verification_layout(grid.nz, source))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[usize; 3]] {
        &self.positions
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.traces.iter().map(|(c, _)| *c)
    }

    /// Stores step `it` for every receiver. Steps past `nt` are dropped.
    pub fn record(&mut self, it: usize, wavefield: &Wavefield) {
        if it >= self.nt {
            return;
        }
        for (channel, buffer) in &mut self.traces {
            for (r, &[i, j, k]) in self.positions.iter().enumerate() {
                buffer[r * self.nt + it] = channel.sample(wavefield, (i, j, k));
            }
        }
    }

    /// Recorded samples of one receiver, if the channel is enabled.
    pub fn trace(&self, channel: Channel, receiver: usize) -> Option<&[Real]> {
        if receiver >= self.positions.len() {
            return None;
        }
        self.traces
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, buf)| &buf[receiver * self.nt..(receiver + 1) * self.nt])
    }

    /// Text trace file: receiver count, `nt`, then per receiver its
    /// physical position followed by one headed block per channel.
    pub fn write_csv<W: Write>(&self, mut writer: W, grid: &Grid) -> Result<()> {
        writeln!(writer, "{}", self.positions.len())?;
        writeln!(writer, "{}", self.nt)?;
        for (r, &[i, j, k]) in self.positions.iter().enumerate() {
            writeln!(
                writer,
                "{} {} {}",
                i as Real * grid.dx,
                j as Real * grid.dy,
                k as Real * grid.dz
            )?;
            for (channel, buffer) in &self.traces {
                writeln!(writer, "{}", channel.header())?;
                for value in &buffer[r * self.nt..(r + 1) * self.nt] {
                    writeln!(writer, "{value}")?;
                }
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_file<P: AsRef<Path>>(&self, path: P, grid: &Grid) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(BufWriter::new(file), grid)
    }
}

/// Ring offsets for each supported cube size, cumulative.
const RINGS: [(usize, i64); 5] = [(64, 20), (128, 40), (256, 100), (512, 200), (1024, 400)];

/// Receiver positions used to verify the reference cube sizes.
///
/// `nz = 64..=1024` (powers of two) place rings of eight receivers on the
/// diagonals around the source, one more ring per doubling. Any other size
/// gets a single receiver at the source.
pub fn verification_layout(nz: usize, source: [usize; 3]) -> Vec<[i64; 3]> {
    let [x, y, z] = source.map(|c| c as i64);
    let rings = RINGS.iter().position(|&(n, _)| n == nz).map_or(0, |p| p + 1);
    if rings == 0 {
        return vec![[x, y, z]];
    }

    let mut positions = Vec::with_capacity(8 * rings);
    for &(_, d) in &RINGS[..rings] {
        for (sx, sy, sz) in [
            (1, 1, 1),
            (-1, 1, 1),
            (-1, -1, 1),
            (1, -1, 1),
            (1, 1, -1),
            (-1, 1, -1),
            (-1, -1, -1),
            (1, -1, -1),
        ] {
            positions.push([x + sx * d, y + sy * d, z + sz * d]);
        }
    }
    positions
}
