mod options;

use anyhow::Error as AnyError;
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd, PixelSize};
use raster::Raster;
use relief::{stl, Relief};
use serde::Serialize;
use std::path::Path;

fn main() -> Result<(), AnyError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.mesh_config()?;

    info!("opening {}", cli.input.display());
    let raster = match cli.pixel_size {
        Some(PixelSize(x, y)) => Raster::open_with_pixel_size(&cli.input, (x, y))?,
        None => Raster::open(&cli.input)?,
    };
    let relief = Relief::new(&raster, config)?;

    match cli.cmd {
        CliCmd::Stl { out } => write_stl(&relief, &out),
        CliCmd::Info => print_json(&raster, &relief),
    }
}

fn write_stl(relief: &Relief, out: &Path) -> Result<(), AnyError> {
    let mesh = relief.mesh()?;
    stl::save(mesh.triangles(), out)?;
    let footprint = relief.footprint();
    info!(
        "done; {} triangles, {:.1} x {:.1} mm",
        mesh.len(),
        footprint.width,
        footprint.height
    );
    Ok(())
}

fn print_json(raster: &Raster, relief: &Relief) -> Result<(), AnyError> {
    #[derive(Serialize)]
    struct Info<'a> {
        raster_dims: [usize; 2],
        pixel_size: [f64; 2],
        origin: Option<[f64; 2]>,
        grid_dims: [usize; 2],
        extent: [f64; 2],
        footprint_mm: [f64; 2],
        scale_xy: f64,
        scale_z: f64,
        min_elevation: f64,
        max_elevation: f64,
        triangles: usize,
        config: &'a relief::MeshConfig,
    }

    let grid = relief.grid();
    let extent = grid.extent();
    let footprint = relief.footprint();
    let (px, py) = raster.pixel_size();
    let info = Info {
        raster_dims: [raster.rows(), raster.cols()],
        pixel_size: [px, py],
        origin: raster.origin().map(|c| [c.x, c.y]),
        grid_dims: [grid.rows(), grid.cols()],
        extent: [extent.width, extent.height],
        footprint_mm: [footprint.width, footprint.height],
        scale_xy: relief.scale().xy,
        scale_z: relief.scale().z,
        min_elevation: grid.min(),
        max_elevation: grid.max(),
        triangles: relief.triangle_count(),
        config: relief.config(),
    };
    let json = serde_json::to_string_pretty(&info)?;
    println!("{json}");
    Ok(())
}
