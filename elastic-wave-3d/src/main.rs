//! `elastic3d` - run a 3D elastic wave simulation from the command line.
//!
//! ```bash
//! # Reference run: 128^3 grid, 500 steps, force monopole
//! elastic3d 128 128 128 500 2
//!
//! # Everything from a config file, VTK snapshots every 100 steps
//! elastic3d --config run.toml --vtk-every 100
//! ```

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use elastic_wave_3d::config::{Config, SourceType};
use elastic_wave_3d::visualisation::{Plane, SliceVisualiser};
use elastic_wave_3d::vtk::write_vtk_file;
use elastic_wave_3d::{KernelTimer, Simulation};

/// Staggered-grid elastic wave propagation in a uniform solid
#[derive(Parser)]
#[command(name = "elastic3d")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Interior grid points along x
    nx: Option<usize>,
    /// Interior grid points along y
    ny: Option<usize>,
    /// Interior grid points along z
    nz: Option<usize>,
    /// Number of time steps
    nt: Option<usize>,
    /// 1 = stress monopole, 2 = force monopole, 3 = force dipole
    source_type: Option<u8>,

    /// TOML run configuration; positional arguments override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a VTK snapshot every N steps
    #[arg(long, value_name = "N")]
    vtk_every: Option<usize>,

    /// Write a PNG slice every N steps
    #[arg(long, value_name = "N")]
    png_every: Option<usize>,

    /// Record receiver traces
    #[arg(long)]
    receivers: bool,

    /// Time every stage and log the totals (needs -v)
    #[arg(long)]
    timings: bool,

    /// Worker threads (default: one per core)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let dims = match (cli.nx, cli.ny, cli.nz, cli.nt) {
        (Some(nx), Some(ny), Some(nz), Some(nt)) => Some((nx, ny, nz, nt)),
        (None, None, None, None) => None,
        _ => bail!("expected all of NX NY NZ NT or none of them"),
    };

    let mut config = match (&cli.config, dims) {
        (Some(path), _) => Config::from_file(path)?,
        (None, Some((nx, ny, nz, nt))) => Config::reference(nx, ny, nz, nt),
        (None, None) => bail!("no grid given: pass NX NY NZ NT or --config FILE"),
    };

    if let Some((nx, ny, nz, nt)) = dims {
        config.grid.nx = nx;
        config.grid.ny = ny;
        config.grid.nz = nz;
        config.grid.nt = nt;
    }
    if let Some(code) = cli.source_type {
        config.source.kind =
            SourceType::from_code(code).ok_or_else(|| anyhow!("unknown source type {code} (expected 1, 2 or 3)"))?;
    }
    if let Some(n) = cli.vtk_every {
        config.output.vtk_interval = n;
    }
    if let Some(n) = cli.png_every {
        config.output.png_interval = n;
    }
    if cli.receivers {
        config.receivers.enabled = true;
    }
    if cli.threads.is_some() {
        config.run.threads = cli.threads;
    }

    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    if let Some(threads) = config.run.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }
    config.log_summary();

    let grid = config.grid.build()?;
    let materials = config.material.build(&grid);
    let source = config.source.build(&grid);
    let receivers = config.receivers.build(&grid, source.position)?;
    let kind = source.kind;

    let visualiser = if config.output.png_interval > 0 {
        let plane = config.output.plane()?;
        let centre = grid.centre();
        let index = config.output.png_index.unwrap_or(match plane {
            Plane::Xy => centre[2],
            Plane::Xz => centre[1],
            Plane::Yz => centre[0],
        });
        Some(SliceVisualiser::new(
            &config.output.png_dir,
            config.output.image_width,
            config.output.image_height,
            plane,
            index,
        )?)
    } else {
        None
    };
    let png_field = config.output.slice_field()?;

    let mut timer = KernelTimer::new();
    let mut simulation = Simulation::with_params(grid, materials, source, config.run.params())?;
    if let Some(receivers) = receivers {
        simulation = simulation.with_receivers(receivers);
    }
    if cli.timings {
        simulation = simulation.with_hook(&mut timer);
    }

    let vtk_every = config.output.vtk_interval;
    let png_every = config.output.png_interval;
    let every = if vtk_every > 0 || png_every > 0 { 1 } else { 0 };
    let due = |interval: usize, step: usize| interval > 0 && step % interval == 0;

    let summary = simulation.run_with_snapshots(every, |snap| -> Result<()> {
        if due(vtk_every, snap.step) {
            let stem = format!("{}_{}", config.output.vtk_prefix, snap.step);
            let path = write_vtk_file(snap.wavefield, snap.grid, &stem)?;
            info!(path = %path.display(), "wrote snapshot");
        }
        if let (Some(vis), true) = (&visualiser, due(png_every, snap.step)) {
            vis.plot(snap.wavefield, png_field, snap.step, snap.time)
                .map_err(|e| anyhow!("Failed to render frame {}: {e}", snap.step))?;
        }
        Ok(())
    })?;

    if let Some(receivers) = simulation.take_receivers() {
        receivers
            .write_csv_file(&config.receivers.output, &simulation.grid)
            .with_context(|| format!("Failed to write {}", config.receivers.output))?;
        info!(receivers = receivers.len(), path = %config.receivers.output, "wrote traces");
    }
    drop(simulation);

    if cli.timings {
        timer.log_summary();
    }

    info!("source type      : {}", kind.describe());
    info!(
        "grid size        : {} x {} x {}",
        config.grid.nx, config.grid.ny, config.grid.nz
    );
    info!("iterations       : {}", summary.steps);
    info!("threads          : {}", rayon::current_num_threads());
    info!("compute time     : {:.3} s", summary.elapsed.as_secs_f64());
    info!("effective MLUPS  : {:.2}", summary.mlups);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
