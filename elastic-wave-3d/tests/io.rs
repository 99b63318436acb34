use std::fs;
use std::path::PathBuf;

use elastic_wave_3d::config::Config;
use elastic_wave_3d::receivers::{Channel, Channels, ReceiverSet};
use elastic_wave_3d::vtk::{write_vtk_file, VtkDataset};
use elastic_wave_3d::{Grid, MaterialModel, PointSource, Simulation, SourceKind};

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("elastic3d-{}-{name}", std::process::id()))
}

fn small_run(n: usize, nt: usize) -> Simulation<'static> {
    let grid = Grid::new(n, n, n, nt, 0, 10.0, 10.0, 10.0, 0.001);
    let model = MaterialModel::uniform(&grid, 1000.0, 2200.0, 1000.0);
    let source = PointSource::centred(&grid, SourceKind::Stress);
    Simulation::new(grid, model, source).unwrap()
}

#[test]
fn vtk_snapshot_reads_back() {
    let mut sim = small_run(20, 4);
    sim.run();

    let path = write_vtk_file(&sim.wavefield, &sim.grid, scratch_path("snapshot")).unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("vtk"));
    let text = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).ok();

    let dataset = VtkDataset::parse(&text).unwrap();
    assert_eq!(dataset.dimensions, (20, 20, 20));
    assert_eq!(dataset.points.len(), 8000);
    assert_eq!(dataset.points[1], [10.0, 0.0, 0.0]);
    assert_eq!(dataset.points[20], [0.0, 10.0, 0.0]);

    let names: Vec<_> = dataset.scalars.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["Sxx", "Syy", "Szz", "Sxz", "Sxy", "Syz"]);

    let sxx: Vec<_> = sim.wavefield.sxx.iter().copied().collect();
    assert_eq!(dataset.scalar("Sxx").unwrap(), sxx.as_slice());
    assert!(sxx.iter().any(|&v| v != 0.0));

    let velocity = dataset.vector("Velocity").unwrap();
    let centre = sim.wavefield.vx.linear_index(11, 10, 10);
    assert_eq!(velocity[centre][0], sim.wavefield.vx[(11, 10, 10)]);
}

#[test]
fn verification_receivers_write_one_trace_on_small_grids() {
    let mut sim = small_run(32, 5);
    let receivers = ReceiverSet::verification(&sim.grid, Channels::default(), sim.grid.centre()).unwrap();
    assert_eq!(receivers.positions(), &[[16, 16, 16]]);
    sim = sim.with_receivers(receivers);
    sim.run();

    let receivers = sim.take_receivers().unwrap();
    assert_eq!(receivers.trace(Channel::Vx, 0).map(<[_]>::len), Some(5));
    assert!(receivers.trace(Channel::Pressure, 0).is_none());

    let mut out = Vec::new();
    receivers.write_csv(&mut out, &sim.grid).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(&lines[..4], ["1", "5", "160 160 160", "Vx"]);
    assert_eq!(lines[9], "Vy");
    assert_eq!(lines[15], "Vz");
    // count, nt, position, three headed blocks of five, blank separator
    assert_eq!(lines.len(), 3 + 3 * 6 + 1);
}

#[test]
fn config_file_drives_a_run() {
    let path = scratch_path("run.toml");
    fs::write(
        &path,
        r#"
[grid]
nx = 24
ny = 24
nz = 24
nt = 3

[source]
kind = "force-dipole"
direction = "z"

[receivers]
enabled = true
pressure = true
vy = false
positions = [[12, 12, 12], [12, 12, 14]]
"#,
    )
    .unwrap();
    let config = Config::from_file(&path).unwrap();
    fs::remove_file(&path).ok();

    let grid = config.grid.build().unwrap();
    let source = config.source.build(&grid);
    assert_eq!(source.position, [12, 12, 12]);
    let receivers = config.receivers.build(&grid, source.position).unwrap().unwrap();
    assert_eq!(receivers.len(), 2);
    let channels: Vec<_> = receivers.channels().collect();
    assert_eq!(channels, [Channel::Pressure, Channel::Vx, Channel::Vz]);

    let materials = config.material.build(&grid);
    let mut sim = Simulation::with_params(grid, materials, source, config.run.params())
        .unwrap()
        .with_receivers(receivers);
    let summary = sim.run();
    assert_eq!(summary.steps, 3);
    assert!(sim.is_finished());
}

#[test]
fn missing_config_file_is_reported() {
    let err = Config::from_file(scratch_path("absent.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config file"));
}

#[test]
fn out_of_grid_receivers_are_rejected() {
    let grid = Grid::new(16, 16, 16, 2, 0, 10.0, 10.0, 10.0, 0.001);
    let result = ReceiverSet::new(&grid, Channels::default(), &[[0, 0, 0], [4, -1, 4]]);
    assert!(result.is_err());
}
