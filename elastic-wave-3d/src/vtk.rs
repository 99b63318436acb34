//! Legacy ASCII VTK snapshots of the ghost-expanded wavefield.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::field::Field3;
use crate::grid::Grid;
use crate::wavefield::Wavefield;
use crate::Real;

/// Writes a `STRUCTURED_GRID` dataset: point coordinates, the six stresses
/// as scalars (Sxx, Syy, Szz, Sxz, Sxy, Syz) and velocity as a vector.
pub fn export_to_vtk<W: Write>(wavefield: &Wavefield, grid: &Grid, mut out: W) -> Result<()> {
    let (nx, ny, nz) = grid.ghost_dims();
    let points = nx * ny * nz;

    writeln!(out, "# vtk DataFile Version 3.0")?;
    writeln!(out, "vtk output")?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET STRUCTURED_GRID")?;
    writeln!(out, "DIMENSIONS {nx} {ny} {nz}")?;
    writeln!(out, "POINTS {points} FLOAT")?;
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let [x, y, z] = grid.coords(i, j, k);
                writeln!(out, "{x} {y} {z}")?;
            }
        }
    }

    writeln!(out, "POINT_DATA {points}")?;
    let scalars: [(&str, &Field3); 6] = [
        ("Sxx", &wavefield.sxx),
        ("Syy", &wavefield.syy),
        ("Szz", &wavefield.szz),
        ("Sxz", &wavefield.sxz),
        ("Sxy", &wavefield.sxy),
        ("Syz", &wavefield.syz),
    ];
    for (name, field) in scalars {
        writeln!(out, "SCALARS {name} FLOAT 1")?;
        writeln!(out, "LOOKUP_TABLE default")?;
        for value in field.iter() {
            writeln!(out, "{value}")?;
        }
    }

    writeln!(out, "VECTORS Velocity FLOAT")?;
    for ((vx, vy), vz) in wavefield.vx.iter().zip(wavefield.vy.iter()).zip(wavefield.vz.iter()) {
        writeln!(out, "{vx} {vy} {vz}")?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `<stem>.vtk` and returns the path written.
pub fn write_vtk_file<P: AsRef<Path>>(wavefield: &Wavefield, grid: &Grid, stem: P) -> Result<PathBuf> {
    let mut path = stem.as_ref().as_os_str().to_owned();
    path.push(".vtk");
    let path = PathBuf::from(path);
    let file = File::create(&path)?;
    export_to_vtk(wavefield, grid, BufWriter::new(file))?;
    Ok(path)
}

/// A structured-grid dataset read back from legacy ASCII VTK.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VtkDataset {
    pub dimensions: (usize, usize, usize),
    pub points: Vec<[Real; 3]>,
    pub scalars: Vec<(String, Vec<Real>)>,
    pub vectors: Vec<(String, Vec<[Real; 3]>)>,
}

impl VtkDataset {
    pub fn scalar(&self, name: &str) -> Option<&[Real]> {
        self.scalars.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
    }

    pub fn vector(&self, name: &str) -> Option<&[[Real; 3]]> {
        self.vectors.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_slice())
    }

    /// Parses the subset of the legacy format that [`export_to_vtk`] writes.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = Lines::new(text);
        lines.expect_prefix("# vtk DataFile")?;
        lines.next_line()?; // title
        lines.expect_prefix("ASCII")?;
        lines.expect_prefix("DATASET STRUCTURED_GRID")?;

        let mut dataset = VtkDataset::default();
        let dims = lines.keyword_fields("DIMENSIONS")?;
        let [nx, ny, nz] = lines.parse_n::<usize, 3>(&dims)?;
        dataset.dimensions = (nx, ny, nz);

        let header = lines.keyword_fields("POINTS")?;
        let count: usize = lines.parse_field(header.first().copied())?;
        if count != nx * ny * nz {
            return Err(lines.error(format!("{count} points for a {nx}x{ny}x{nz} grid")));
        }
        dataset.points = lines.triples(count)?;

        let header = lines.keyword_fields("POINT_DATA")?;
        let values: usize = lines.parse_field(header.first().copied())?;

        while let Some((keyword, fields)) = lines.next_nonempty() {
            match keyword {
                "SCALARS" => {
                    let name = fields.first().copied().ok_or_else(|| lines.error("missing scalar name".into()))?;
                    let name = name.to_string();
                    lines.expect_prefix("LOOKUP_TABLE")?;
                    let mut data = Vec::with_capacity(values);
                    for _ in 0..values {
                        let line = lines.next_line()?;
                        let value: Real = lines.parse_field(Some(line.trim()))?;
                        data.push(value);
                    }
                    dataset.scalars.push((name, data));
                }
                "VECTORS" => {
                    let name = fields.first().copied().ok_or_else(|| lines.error("missing vector name".into()))?;
                    let name = name.to_string();
                    let data = lines.triples(values)?;
                    dataset.vectors.push((name, data));
                }
                other => return Err(lines.error(format!("unexpected section `{other}`"))),
            }
        }
        Ok(dataset)
    }
}

/// Line cursor that remembers where it is for error messages.
struct Lines<'a> {
    inner: std::str::Lines<'a>,
    line: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines(),
            line: 0,
        }
    }

    fn error(&self, message: String) -> Error {
        Error::Vtk {
            line: self.line,
            message,
        }
    }

    fn next_line(&mut self) -> Result<&'a str> {
        self.line += 1;
        self.inner
            .next()
            .ok_or_else(|| self.error("unexpected end of file".into()))
    }

    fn next_nonempty(&mut self) -> Option<(&'a str, Vec<&'a str>)> {
        loop {
            let line = self.inner.next()?;
            self.line += 1;
            let mut words = line.split_whitespace();
            if let Some(keyword) = words.next() {
                return Some((keyword, words.collect()));
            }
        }
    }

    fn expect_prefix(&mut self, prefix: &str) -> Result<&'a str> {
        let line = self.next_line()?;
        if line.starts_with(prefix) {
            Ok(line)
        } else {
            Err(self.error(format!("expected `{prefix}`, found `{line}`")))
        }
    }

    fn keyword_fields(&mut self, keyword: &str) -> Result<Vec<&'a str>> {
        let line = self.expect_prefix(keyword)?;
        Ok(line.split_whitespace().skip(1).collect())
    }

    fn parse_field<T: std::str::FromStr>(&self, field: Option<&str>) -> Result<T> {
        let field = field.ok_or_else(|| self.error("missing value".into()))?;
        field
            .parse()
            .map_err(|_| self.error(format!("cannot parse `{field}`")))
    }

    fn parse_n<T: std::str::FromStr + Copy + Default, const N: usize>(&self, fields: &[&str]) -> Result<[T; N]> {
        if fields.len() < N {
            return Err(self.error(format!("expected {N} values, found {}", fields.len())));
        }
        let mut out = [T::default(); N];
        for (slot, field) in out.iter_mut().zip(fields) {
            *slot = self.parse_field(Some(*field))?;
        }
        Ok(out)
    }

    fn triples(&mut self, count: usize) -> Result<Vec<[Real; 3]>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let line = self.next_line()?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            out.push(self.parse_n::<Real, 3>(&fields)?);
        }
        Ok(out)
    }
}
