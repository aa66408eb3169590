//! Printable terrain models from elevation rasters.
//!
//! The pipeline runs in a single forward pass:
//!
//! 1. [ElevationGrid] block-averages and cleans the raster.
//! 1. [ScaleFactors] fits the grid onto the sheet and into the height
//!    budget.
//! 1. [CoordinateField] places every cell in print space.
//! 1. [mesh::build] triangulates the terrain surface and its base.
//!
//! [Relief] bundles these steps.

mod config;
mod error;
pub mod grid;
pub mod mesh;
mod scale;
pub mod stl;

pub use crate::{
    config::MeshConfig,
    error::ReliefError,
    grid::{ElevationGrid, PhysicalExtent},
    mesh::{CoordinateField, Mesh, Point3, Triangle},
    scale::ScaleFactors,
};
use log::info;
use raster::Raster;
use std::path::Path;

/// A raster prepared for meshing.
#[derive(Debug, Clone)]
pub struct Relief {
    config: MeshConfig,
    grid: ElevationGrid,
    scale: ScaleFactors,
    field: CoordinateField,
}

impl Relief {
    /// Runs every step up to, but not including, triangulation.
    ///
    /// All input validation happens here.
    pub fn new(raster: &Raster, config: MeshConfig) -> Result<Self, ReliefError> {
        config.validate()?;

        info!(
            "downsampling {}x{} raster by {}",
            raster.rows(),
            raster.cols(),
            config.downsample
        );
        let grid = ElevationGrid::from_raster(raster, config.downsample)?;
        info!("target grid size: {} x {}", grid.rows(), grid.cols());

        let scale = ScaleFactors::derive(&grid, &config)?;
        info!("scale; xy: {:.6}, z: {:.6}", scale.xy, scale.z);

        let field = CoordinateField::new(&grid, &scale);

        Ok(Self {
            config,
            grid,
            scale,
            field,
        })
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    pub fn grid(&self) -> &ElevationGrid {
        &self.grid
    }

    pub fn scale(&self) -> &ScaleFactors {
        &self.scale
    }

    pub fn field(&self) -> &CoordinateField {
        &self.field
    }

    /// Returns the model's footprint in millimeters.
    pub fn footprint(&self) -> PhysicalExtent {
        self.scale.scaled_extent(self.grid.extent())
    }

    /// Returns how many triangles [Relief::mesh] will produce.
    pub fn triangle_count(&self) -> usize {
        mesh::triangle_count(self.grid.rows(), self.grid.cols(), self.config.side_walls)
    }

    /// Triangulates the terrain.
    pub fn mesh(&self) -> Result<Mesh, ReliefError> {
        info!("creating mesh");
        mesh::build(&self.field, self.config.side_walls)
    }
}

/// Builds the mesh for `raster` and writes it to `out` as binary STL.
pub fn raster_to_stl<P: AsRef<Path>>(
    raster: &Raster,
    config: MeshConfig,
    out: P,
) -> Result<Mesh, ReliefError> {
    let mesh = Relief::new(raster, config)?.mesh()?;
    stl::save(mesh.triangles(), out)?;
    Ok(mesh)
}
