use ndarray::Array2;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::wavefield::{Component, Wavefield};

/// Axis-aligned cut through the 3D grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Plane {
    /// Constant k.
    Xy,
    /// Constant j.
    Xz,
    /// Constant i.
    Yz,
}

impl Plane {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "xy" => Some(Plane::Xy),
            "xz" => Some(Plane::Xz),
            "yz" => Some(Plane::Yz),
            _ => None,
        }
    }

    fn axis_labels(self) -> (&'static str, &'static str) {
        match self {
            Plane::Xy => ("X (grid points)", "Y (grid points)"),
            Plane::Xz => ("X (grid points)", "Z (grid points)"),
            Plane::Yz => ("Y (grid points)", "Z (grid points)"),
        }
    }
}

/// Quantity drawn by the visualiser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceField {
    Component(Component),
    VelocityMagnitude,
}

impl SliceField {
    pub fn parse(name: &str) -> Option<Self> {
        if name == "vmag" {
            return Some(SliceField::VelocityMagnitude);
        }
        Component::parse(name).map(SliceField::Component)
    }

    pub fn name(self) -> &'static str {
        match self {
            SliceField::Component(c) => c.name(),
            SliceField::VelocityMagnitude => "vmag",
        }
    }
}

/// Copies one plane of the selected field into a `(horizontal, vertical)`
/// array. `index` is clamped to the grid.
pub fn extract_slice(wavefield: &Wavefield, field: SliceField, plane: Plane, index: usize) -> Array2<f64> {
    let magnitude;
    let source = match field {
        SliceField::Component(c) => wavefield.component(c),
        SliceField::VelocityMagnitude => {
            magnitude = wavefield.velocity_magnitude();
            &magnitude
        }
    };
    let (nx, ny, nz) = source.dims();
    let clamp = |n: usize| index.min(n.saturating_sub(1));
    match plane {
        Plane::Xy => {
            let k = clamp(nz);
            Array2::from_shape_fn((nx, ny), |(i, j)| source[(i, j, k)] as f64)
        }
        Plane::Xz => {
            let j = clamp(ny);
            Array2::from_shape_fn((nx, nz), |(i, k)| source[(i, j, k)] as f64)
        }
        Plane::Yz => {
            let i = clamp(nx);
            Array2::from_shape_fn((ny, nz), |(j, k)| source[(i, j, k)] as f64)
        }
    }
}

pub struct SliceVisualiser {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    plane: Plane,
    index: usize,
    gradient: Box<dyn colorgrad::Gradient>,
}

impl SliceVisualiser {
    pub fn new<P: AsRef<Path>>(output_dir: P, width: u32, height: u32, plane: Plane, index: usize) -> std::io::Result<Self> {
        std::fs::create_dir_all(output_dir.as_ref())?;

        // Diverging palette, centred on zero in `value_to_color`
        let gradient = Box::new(colorgrad::preset::rd_yl_bu());

        Ok(Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            width,
            height,
            plane,
            index,
            gradient,
        })
    }

    /// Renders the configured plane of `field` and returns the PNG path.
    pub fn plot(
        &self,
        wavefield: &Wavefield,
        field: SliceField,
        timestep: usize,
        time: f64,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let data = extract_slice(wavefield, field, self.plane, self.index);
        self.plot_array(&data, field.name(), timestep, time)
    }

    pub fn plot_array(
        &self,
        data: &Array2<f64>,
        field_name: &str,
        timestep: usize,
        time: f64,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let filename = self.output_dir.join(format!("{}_{:06}.png", field_name, timestep));
        let root = BitMapBackend::new(&filename, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (nh, nv) = data.dim();
        let max_abs = data.iter().map(|&v| v.abs()).fold(0.0_f64, f64::max);

        let title = format!("{} at t={:.4}s (step {})", field_name, time, timestep);
        let (x_desc, y_desc) = self.plane.axis_labels();
        let mut chart = ChartBuilder::on(&root)
            .caption(&title, ("sans-serif", 30))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d(0..nh, 0..nv)?;

        chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

        chart.draw_series(data.indexed_iter().map(|((h, v), &value)| {
            let color = self.value_to_color(value, max_abs);
            Rectangle::new([(h, v), (h + 1, v + 1)], color.filled())
        }))?;

        root.present()?;
        drop(chart);
        drop(root);
        tracing::debug!(path = %filename.display(), "saved frame");
        Ok(filename)
    }

    fn value_to_color(&self, value: f64, max_abs: f64) -> RGBColor {
        let normalized = if max_abs > 0.0 {
            0.5 + 0.5 * value / max_abs
        } else {
            0.5
        };
        let normalized = normalized.clamp(0.0, 1.0);
        let rgba = self.gradient.at(normalized as f32).to_rgba8();
        RGBColor(rgba[0], rgba[1], rgba[2])
    }
}
