use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::differentiators::Axis;
use crate::grid::Grid;
use crate::materials::MaterialModel;
use crate::receivers::{Channels, ReceiverSet};
use crate::simulation::{stability_number, stable_dt, SimulationParams};
use crate::source::{ForceMode, PointSource, SourceKind, Wavelet};
use crate::visualisation::{Plane, SliceField};
use crate::Real;

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub nt: usize,
    #[serde(default)]
    pub ghost_border: usize,
    #[serde(default = "default_spacing")]
    pub dx: Real,
    #[serde(default = "default_spacing")]
    pub dy: Real,
    #[serde(default = "default_spacing")]
    pub dz: Real,
    #[serde(default = "default_dt")]
    pub dt: Real,
}

fn default_spacing() -> Real {
    10.0
}

fn default_dt() -> Real {
    0.001
}

impl GridConfig {
    pub fn new(nx: usize, ny: usize, nz: usize, nt: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            nt,
            ghost_border: 0,
            dx: default_spacing(),
            dy: default_spacing(),
            dz: default_spacing(),
            dt: default_dt(),
        }
    }

    pub fn build(&self) -> Result<Grid> {
        Grid::checked(
            self.nx,
            self.ny,
            self.nz,
            self.nt,
            self.ghost_border,
            self.dz,
            self.dx,
            self.dy,
            self.dt,
        )
        .context("invalid [grid] section")
    }
}

/// Homogeneous material properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialConfig {
    #[serde(default = "default_rho")]
    pub rho: Real, // Density (kg/m³)
    #[serde(default = "default_vp")]
    pub vp: Real, // P-wave velocity (m/s)
    #[serde(default = "default_vs")]
    pub vs: Real, // S-wave velocity (m/s)
}

fn default_rho() -> Real {
    1000.0
}

fn default_vp() -> Real {
    2200.0
}

fn default_vs() -> Real {
    1000.0
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            rho: default_rho(),
            vp: default_vp(),
            vs: default_vs(),
        }
    }
}

impl MaterialConfig {
    fn validate(&self) -> Result<()> {
        if self.vp <= 0.0 || self.vs <= 0.0 || self.rho <= 0.0 {
            return Err(anyhow!(
                "Material properties must be positive (vp={}, vs={}, rho={})",
                self.vp,
                self.vs,
                self.rho
            ));
        }
        if self.vs >= self.vp {
            return Err(anyhow!(
                "S-wave velocity must be less than P-wave velocity (vs={} >= vp={})",
                self.vs,
                self.vp
            ));
        }
        Ok(())
    }

    pub fn build(&self, grid: &Grid) -> MaterialModel {
        MaterialModel::uniform(grid, self.rho, self.vp, self.vs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    Stress,
    ForceMonopole,
    ForceDipole,
}

impl SourceType {
    /// Numeric selector used on the command line.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SourceType::Stress),
            2 => Some(SourceType::ForceMonopole),
            3 => Some(SourceType::ForceDipole),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    X,
    Y,
    Z,
}

impl From<Direction> for Axis {
    fn from(d: Direction) -> Self {
        match d {
            Direction::X => Axis::X,
            Direction::Y => Axis::Y,
            Direction::Z => Axis::Z,
        }
    }
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_type")]
    pub kind: SourceType,
    #[serde(default = "default_direction")]
    pub direction: Direction,
    #[serde(default = "default_f0")]
    pub f0: Real,
    #[serde(default = "default_t0")]
    pub t0: Real,
    #[serde(default = "default_amplitude")]
    pub amplitude: Real,
    /// Ghost-grid cell; the grid centre when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[usize; 3]>,
}

fn default_source_type() -> SourceType {
    SourceType::ForceMonopole
}

fn default_direction() -> Direction {
    Direction::X
}

fn default_f0() -> Real {
    5.0
}

fn default_t0() -> Real {
    0.3
}

fn default_amplitude() -> Real {
    10e3
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_type(),
            direction: default_direction(),
            f0: default_f0(),
            t0: default_t0(),
            amplitude: default_amplitude(),
            position: None,
        }
    }
}

impl SourceConfig {
    fn validate(&self) -> Result<()> {
        if self.f0 <= 0.0 {
            return Err(anyhow!("Source frequency must be positive, got {}", self.f0));
        }
        if self.t0 < 0.0 {
            return Err(anyhow!("Source delay t0 must be non-negative, got {}", self.t0));
        }
        Ok(())
    }

    pub fn kind(&self) -> SourceKind {
        let direction = self.direction.into();
        match self.kind {
            SourceType::Stress => SourceKind::Stress,
            SourceType::ForceMonopole => SourceKind::Force {
                mode: ForceMode::Monopole,
                direction,
            },
            SourceType::ForceDipole => SourceKind::Force {
                mode: ForceMode::Dipole,
                direction,
            },
        }
    }

    pub fn build(&self, grid: &Grid) -> PointSource {
        let wavelet = Wavelet::ricker(grid.nt, grid.dt, self.f0, self.t0, self.amplitude);
        PointSource::new(self.position.unwrap_or_else(|| grid.centre()), self.kind(), wavelet)
    }
}

/// Receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub pressure: bool,
    #[serde(default = "default_true")]
    pub vx: bool,
    #[serde(default = "default_true")]
    pub vy: bool,
    #[serde(default = "default_true")]
    pub vz: bool,
    /// Explicit ghost-grid cells; the verification layout when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<[i64; 3]>>,
    #[serde(default = "default_receiver_output")]
    pub output: String,
}

fn default_true() -> bool {
    true
}

fn default_receiver_output() -> String {
    "receivers.csv".to_string()
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pressure: false,
            vx: true,
            vy: true,
            vz: true,
            positions: None,
            output: default_receiver_output(),
        }
    }
}

impl ReceiverConfig {
    pub fn channels(&self) -> Channels {
        Channels {
            pressure: self.pressure,
            vx: self.vx,
            vy: self.vy,
            vz: self.vz,
        }
    }

    /// `None` when receivers are disabled.
    pub fn build(&self, grid: &Grid, source: [usize; 3]) -> Result<Option<ReceiverSet>> {
        if !self.enabled {
            return Ok(None);
        }
        let set = match &self.positions {
            Some(positions) => ReceiverSet::new(grid, self.channels(), positions),
            None => ReceiverSet::verification(grid, self.channels(), source),
        };
        set.map(Some).context("invalid [receivers] section")
    }
}

/// Snapshot output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub vtk_interval: usize,
    #[serde(default = "default_vtk_prefix")]
    pub vtk_prefix: String,
    #[serde(default)]
    pub png_interval: usize,
    #[serde(default = "default_png_field")]
    pub png_field: String,
    #[serde(default = "default_png_plane")]
    pub png_plane: String,
    /// Plane index; the grid centre along the normal axis when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png_index: Option<usize>,
    #[serde(default = "default_png_dir")]
    pub png_dir: String,
    #[serde(default = "default_image_width")]
    pub image_width: u32,
    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

fn default_vtk_prefix() -> String {
    "waves".to_string()
}

fn default_png_field() -> String {
    "vx".to_string()
}

fn default_png_plane() -> String {
    "xz".to_string()
}

fn default_png_dir() -> String {
    "output".to_string()
}

fn default_image_width() -> u32 {
    1000
}

fn default_image_height() -> u32 {
    1000
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            vtk_interval: 0,
            vtk_prefix: default_vtk_prefix(),
            png_interval: 0,
            png_field: default_png_field(),
            png_plane: default_png_plane(),
            png_index: None,
            png_dir: default_png_dir(),
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        self.slice_field()?;
        self.plane()?;
        if self.image_width == 0 || self.image_height == 0 {
            return Err(anyhow!(
                "Image dimensions must be positive (width={}, height={})",
                self.image_width,
                self.image_height
            ));
        }
        Ok(())
    }

    pub fn slice_field(&self) -> Result<SliceField> {
        SliceField::parse(&self.png_field).ok_or_else(|| {
            anyhow!(
                "Invalid field '{}'. Must be one of: vx, vy, vz, vmag, sxx, syy, szz, sxy, syz, sxz",
                self.png_field
            )
        })
    }

    pub fn plane(&self) -> Result<Plane> {
        Plane::parse(&self.png_plane)
            .ok_or_else(|| anyhow!("Invalid plane '{}'. Must be one of: xy, xz, yz", self.png_plane))
    }
}

/// Run control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_report_period")]
    pub report_period: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(default = "default_cfl_safety")]
    pub cfl_safety: f64,
}

fn default_report_period() -> usize {
    100
}

fn default_cfl_safety() -> f64 {
    1.0
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            report_period: default_report_period(),
            threads: None,
            cfl_safety: default_cfl_safety(),
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<()> {
        if self.cfl_safety <= 0.0 || self.cfl_safety > 1.0 {
            return Err(anyhow!("cfl_safety must be in (0, 1], got {}", self.cfl_safety));
        }
        if self.threads == Some(0) {
            return Err(anyhow!("threads must be at least 1"));
        }
        Ok(())
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            report_period: self.report_period,
            cfl_safety: self.cfl_safety,
        }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridConfig,
    #[serde(default)]
    pub material: MaterialConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub receivers: ReceiverConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    /// Reference run on an `nx * ny * nz` grid for `nt` steps.
    pub fn reference(nx: usize, ny: usize, nz: usize, nt: usize) -> Self {
        Self {
            grid: GridConfig::new(nx, ny, nz, nt),
            material: MaterialConfig::default(),
            source: SourceConfig::default(),
            receivers: ReceiverConfig::default(),
            output: OutputConfig::default(),
            run: RunConfig::default(),
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        let grid = self.grid.build()?;
        self.material.validate()?;
        self.source.validate()?;
        self.output.validate()?;
        self.run.validate()?;

        // Exceeding the bound is allowed, the run just won't stay bounded
        let courant = self.stability_number()?;
        if courant > self.run.cfl_safety {
            warn!(
                courant,
                limit = self.run.cfl_safety,
                suggested_dt = stable_dt(&grid, self.material.vp, self.run.cfl_safety),
                "dt violates the stability bound"
            );
        }
        Ok(())
    }

    pub fn stability_number(&self) -> Result<f64> {
        Ok(stability_number(&self.grid.build()?, self.material.vp))
    }

    pub fn log_summary(&self) {
        let g = &self.grid;
        info!(
            "grid {}x{}x{} (+{} ghost), spacing {}/{}/{} m, dt={} s, nt={}",
            g.nx, g.ny, g.nz, g.ghost_border, g.dx, g.dy, g.dz, g.dt, g.nt
        );
        info!(
            "material vp={} m/s, vs={} m/s, rho={} kg/m³",
            self.material.vp, self.material.vs, self.material.rho
        );
        info!(
            "source {:?} ({:?}), f0={} Hz, t0={} s, amplitude={}",
            self.source.kind, self.source.direction, self.source.f0, self.source.t0, self.source.amplitude
        );
        if self.receivers.enabled {
            info!("receivers -> {}", self.receivers.output);
        }
        if self.output.vtk_interval > 0 {
            info!("vtk every {} steps as {}_<step>.vtk", self.output.vtk_interval, self.output.vtk_prefix);
        }
        if self.output.png_interval > 0 {
            info!(
                "png of {} ({} plane) every {} steps in {}/",
                self.output.png_field, self.output.png_plane, self.output.png_interval, self.output.png_dir
            );
        }
    }
}
