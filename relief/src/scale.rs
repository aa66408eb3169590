//! Mapping from real-world units to print millimeters.

use crate::{grid::PhysicalExtent, ElevationGrid, MeshConfig, ReliefError};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    /// Millimeters per native unit, shared by X and Y.
    pub xy: f64,

    /// Millimeters per elevation unit.
    pub z: f64,

    /// Highest grid cell.
    max_elevation: f64,

    /// Print height of `max_elevation` above the base.
    max_height_mm: f64,

    /// Print height of a zero elevation cell.
    base_thickness_mm: f64,
}

impl ScaleFactors {
    /// Returns the scale factors fitting `grid` onto the sheet and into
    /// the height budget described by `config`.
    ///
    /// XY scaling is uniform; the tighter of the two sheet ratios
    /// wins so that both sheet dimensions are respected.
    pub fn derive(grid: &ElevationGrid, config: &MeshConfig) -> Result<Self, ReliefError> {
        config.validate()?;

        let PhysicalExtent { width, height } = grid.extent();
        let xy = f64::min(
            config.sheet_width_mm / width,
            config.sheet_height_mm / height,
        );

        let (min_elevation, max_elevation) = (grid.min(), grid.max());
        if max_elevation <= 0.0 || max_elevation == min_elevation {
            return Err(ReliefError::DegenerateInput(format!(
                "elevation range [{min_elevation}, {max_elevation}] is flat, can't scale height"
            )));
        }
        let z = config.max_height_mm / max_elevation;

        debug!("scale; extent: {width}x{height}, xy: {xy}, z: {z}, max_elevation: {max_elevation}");

        Ok(Self {
            xy,
            z,
            max_elevation,
            max_height_mm: config.max_height_mm,
            base_thickness_mm: config.base_thickness_mm,
        })
    }

    /// Returns the print height of a cell at `elevation`.
    ///
    /// Equivalent to `elevation * self.z + base_thickness`, but never
    /// exceeds `max_height + base_thickness` due to rounding.
    pub fn surface_z(&self, elevation: f64) -> f64 {
        elevation / self.max_elevation * self.max_height_mm + self.base_thickness_mm
    }

    /// Returns `extent` in millimeters.
    pub fn scaled_extent(&self, extent: PhysicalExtent) -> PhysicalExtent {
        PhysicalExtent {
            width: extent.width * self.xy,
            height: extent.height * self.xy,
        }
    }

    pub fn base_thickness_mm(&self) -> f64 {
        self.base_thickness_mm
    }
}
