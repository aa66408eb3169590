use crate::ReliefError;
use serde::{Deserialize, Serialize};

/// Physical print parameters.
///
/// All lengths are in millimeters. The defaults describe an A5 sheet
/// in landscape orientation with a 20 mm relief on a 3 mm base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Upper bound on the model's X extent.
    pub sheet_width_mm: f64,

    /// Upper bound on the model's Y extent.
    pub sheet_height_mm: f64,

    /// Height of the highest grid cell above the top of the base.
    pub max_height_mm: f64,

    /// Solid material under the lowest point of the terrain.
    pub base_thickness_mm: f64,

    /// Source pixels per grid cell along each axis.
    pub downsample: usize,

    /// Close the model with vertical walls between the terrain and
    /// base perimeters.
    pub side_walls: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            sheet_width_mm: 210.0,
            sheet_height_mm: 148.0,
            max_height_mm: 20.0,
            base_thickness_mm: 3.0,
            downsample: 8,
            side_walls: false,
        }
    }
}

impl MeshConfig {
    /// Checks that every parameter is usable.
    pub fn validate(&self) -> Result<(), ReliefError> {
        let positive = [
            ("sheet width", self.sheet_width_mm),
            ("sheet height", self.sheet_height_mm),
            ("max height", self.max_height_mm),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReliefError::InvalidInput(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.base_thickness_mm.is_finite() && self.base_thickness_mm >= 0.0) {
            return Err(ReliefError::InvalidInput(format!(
                "base thickness must not be negative, got {}",
                self.base_thickness_mm
            )));
        }
        if self.downsample < 1 {
            return Err(ReliefError::InvalidInput(
                "downsample factor must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
