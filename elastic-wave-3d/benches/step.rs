//! Stencil throughput
//!
//! One full timestep (25 stages) at a few cube sizes, plus the two kinds
//! of stage on their own. Throughput is reported in interior cells, so
//! criterion's elements/s reads directly as lattice updates per second.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use elastic_wave_3d::differentiators::Axis;
use elastic_wave_3d::schedule::SCHEDULE;
use elastic_wave_3d::simulation::execute_stage;
use elastic_wave_3d::source::ForceMode;
use elastic_wave_3d::{Grid, MaterialModel, PointSource, Simulation, SourceKind};

fn simulation(n: usize) -> Simulation<'static> {
    let grid = Grid::new(n, n, n, 1, 0, 10.0, 10.0, 10.0, 0.001);
    let model = MaterialModel::uniform(&grid, 1000.0, 2200.0, 1000.0);
    let kind = SourceKind::Force {
        mode: ForceMode::Monopole,
        direction: Axis::X,
    };
    let source = PointSource::centred(&grid, kind);
    match Simulation::new(grid, model, source) {
        Ok(sim) => sim,
        Err(e) => panic!("benchmark setup failed: {e}"),
    }
}

fn bench_full_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step/full");
    group.sample_size(10);

    for n in [32, 64, 96] {
        let mut sim = simulation(n);
        // Warm the fields up so the kernels see non-zero data
        sim.step();
        group.throughput(Throughput::Elements(sim.grid.interior_cells() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                sim.step();
                black_box(sim.wavefield.vx[(n / 2, n / 2, n / 2)]);
            });
        });
    }

    group.finish();
}

fn bench_single_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("step/stage");
    let n = 64;
    let mut sim = simulation(n);
    sim.step();
    group.throughput(Throughput::Elements(sim.grid.interior_cells() as u64));

    for label in ["dxf", "cvx", "csxxsyyszz", "csxy"] {
        let Some(spec) = SCHEDULE.iter().find(|s| s.label == label) else {
            continue;
        };
        group.bench_function(label, |b| {
            b.iter(|| execute_stage(&spec.stage, &mut sim.wavefield, &sim.materials, &sim.grid));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_step, bench_single_stage);
criterion_main!(benches);
