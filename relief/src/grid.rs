//! Downsampled, sanitized elevation grids.

use crate::ReliefError;
use log::debug;
use raster::Raster;
use rayon::prelude::*;

/// Real-world size covered by an [ElevationGrid], in the source
/// raster's native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalExtent {
    pub width: f64,
    pub height: f64,
}

/// Elevation samples after block averaging and cleanup.
///
/// Every cell is finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    /// Row-major cells, same orientation as the source raster.
    cells: Box<[f64]>,

    rows: usize,

    cols: usize,

    /// Native size of one source pixel as (x, y).
    pixel_size: (f64, f64),

    /// Source pixels per cell along each axis.
    factor: usize,
}

impl ElevationGrid {
    /// Returns a grid of `raster` reduced by `factor` along each axis.
    ///
    /// Each cell is the mean of the valid samples in its
    /// `factor × factor` source block. Trailing source rows and
    /// columns that don't fill a whole block are dropped. Cells with
    /// no valid samples, and negative cells, become `0.0`.
    pub fn from_raster(raster: &Raster, factor: usize) -> Result<Self, ReliefError> {
        if factor < 1 {
            return Err(ReliefError::InvalidInput(
                "downsample factor must be at least 1".into(),
            ));
        }
        if raster.is_empty() {
            return Err(ReliefError::InvalidInput("raster has no samples".into()));
        }
        let pixel_size @ (px, py) = raster.pixel_size();
        if !(px.is_finite() && py.is_finite() && px > 0.0 && py > 0.0) {
            return Err(ReliefError::InvalidInput(format!(
                "pixel size must be positive, got {pixel_size:?}"
            )));
        }

        let (rows, cols) = (raster.rows() / factor, raster.cols() / factor);
        if rows < 2 || cols < 2 {
            return Err(ReliefError::InvalidInput(format!(
                "{}x{} raster downsampled by {factor} gives a {rows}x{cols} grid, need at least 2x2",
                raster.rows(),
                raster.cols()
            )));
        }

        let now = std::time::Instant::now();
        let mut cells = vec![0.0; rows * cols].into_boxed_slice();
        cells
            .par_chunks_mut(cols)
            .enumerate()
            .for_each(|(row, out)| {
                for (col, cell) in out.iter_mut().enumerate() {
                    *cell = sanitize(block_mean(raster, row, col, factor));
                }
            });
        debug!(
            "downsample; src: {}x{}, dst: {rows}x{cols}, factor: {factor}, exec: {:?}",
            raster.rows(),
            raster.cols(),
            now.elapsed()
        );

        Ok(Self {
            cells,
            rows,
            cols,
            pixel_size,
            factor,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the downsample factor this grid was built with.
    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Returns the native (x, y) distance between neighboring cells.
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_spacing(&self) -> (f64, f64) {
        let factor = self.factor as f64;
        (self.pixel_size.0 * factor, self.pixel_size.1 * factor)
    }

    /// Returns the real-world area covered by this grid.
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self) -> PhysicalExtent {
        let (dx, dy) = self.cell_spacing();
        PhysicalExtent {
            width: self.cols as f64 * dx,
            height: self.rows as f64 * dy,
        }
    }

    /// Returns the cell at (`row`, `col`).
    ///
    /// # Panics
    ///
    /// Panics if (`row`, `col`) is outside the grid.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols);
        self.cells[row * self.cols + col]
    }

    /// Returns all cells, row-major.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Returns the lowest cell.
    pub fn min(&self) -> f64 {
        self.cells.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Returns the highest cell.
    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Returns the mean of the non-NaN samples in the block feeding cell
/// (`row`, `col`), or NaN if there are none.
#[allow(clippy::cast_precision_loss)]
fn block_mean(raster: &Raster, row: usize, col: usize, factor: usize) -> f64 {
    let mut sum = 0.0;
    let mut n = 0_usize;
    for src_row in row * factor..(row + 1) * factor {
        for src_col in col * factor..(col + 1) * factor {
            let sample = raster.get_unchecked(src_row, src_col);
            if !sample.is_nan() {
                sum += sample;
                n += 1;
            }
        }
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

fn sanitize(elevation: f64) -> f64 {
    if elevation.is_finite() && elevation > 0.0 {
        elevation
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::{ElevationGrid, PhysicalExtent};
    use crate::ReliefError;
    use assert_approx_eq::assert_approx_eq;
    use raster::Raster;

    fn raster(rows: usize, cols: usize, samples: Vec<f64>) -> Raster {
        Raster::new(samples, rows, cols, (90.0, 90.0)).unwrap()
    }

    #[test]
    fn test_factor_one_is_identity() {
        let samples: Vec<f64> = (0..12).map(f64::from).collect();
        let grid = ElevationGrid::from_raster(&raster(3, 4, samples.clone()), 1).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (3, 4));
        assert_eq!(grid.cells(), samples.as_slice());
        assert_eq!(grid.get(2, 1), 9.0);
    }

    #[test]
    fn test_block_average() {
        #[rustfmt::skip]
        let samples = vec![
            1.0, 3.0,   10.0, 20.0,
            5.0, 7.0,   30.0, 40.0,

            0.0, 0.0,   2.0, 2.0,
            0.0, 4.0,   2.0, 2.0,
        ];
        let grid = ElevationGrid::from_raster(&raster(4, 4, samples), 2).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
        assert_eq!(grid.cells(), &[4.0, 25.0, 1.0, 2.0]);
    }

    #[test]
    fn test_trailing_partial_blocks_dropped() {
        // 5 x 7 source with factor 2 keeps only the first 4 x 6.
        let samples: Vec<f64> = (0..35)
            .map(|i| if i / 7 >= 4 || i % 7 >= 6 { 1e6 } else { 8.0 })
            .collect();
        let grid = ElevationGrid::from_raster(&raster(5, 7, samples), 2).unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 3));
        assert!(grid.cells().iter().all(|&cell| cell == 8.0));
        assert_eq!(
            grid.extent(),
            PhysicalExtent {
                width: 3.0 * 90.0 * 2.0,
                height: 2.0 * 90.0 * 2.0,
            }
        );
    }

    #[test]
    fn test_sanitize() {
        let samples = vec![f64::NAN, -12.0, 5.0, f64::INFINITY, -0.0, 7.5];
        let grid = ElevationGrid::from_raster(&raster(2, 3, samples), 1).unwrap();
        assert_eq!(grid.cells(), &[0.0, 0.0, 5.0, 0.0, 0.0, 7.5]);
        assert!(grid
            .cells()
            .iter()
            .all(|cell| cell.is_finite() && *cell >= 0.0));
    }

    #[test]
    fn test_nan_excluded_from_mean() {
        #[rustfmt::skip]
        let samples = vec![
            f64::NAN, 6.0,      f64::NAN, f64::NAN,
            f64::NAN, f64::NAN, f64::NAN, f64::NAN,
            -8.0,     -8.0,     1.0,      2.0,
            -8.0,     0.0,      3.0,      4.0,
        ];
        let grid = ElevationGrid::from_raster(&raster(4, 4, samples), 2).unwrap();
        assert_eq!(grid.cells(), &[6.0, 0.0, 0.0, 2.5]);
    }

    #[test]
    fn test_extent_and_spacing() {
        let grid = ElevationGrid::from_raster(&raster(9, 12, vec![1.0; 108]), 3).unwrap();
        assert_eq!(grid.cell_spacing(), (270.0, 270.0));
        let extent = grid.extent();
        assert_approx_eq!(extent.width, 4.0 * 270.0);
        assert_approx_eq!(extent.height, 3.0 * 270.0);
    }

    #[test]
    fn test_min_max() {
        let grid = ElevationGrid::from_raster(&raster(2, 2, vec![3.0, 9.0, 1.0, 4.0]), 1).unwrap();
        assert_eq!(grid.min(), 1.0);
        assert_eq!(grid.max(), 9.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let ok = raster(4, 4, vec![1.0; 16]);
        assert!(matches!(
            ElevationGrid::from_raster(&ok, 0),
            Err(ReliefError::InvalidInput(_))
        ));
        // 4 / 3 == 1 row.
        assert!(matches!(
            ElevationGrid::from_raster(&ok, 3),
            Err(ReliefError::InvalidInput(_))
        ));
        assert!(matches!(
            ElevationGrid::from_raster(&raster(1, 5, vec![1.0; 5]), 1),
            Err(ReliefError::InvalidInput(_))
        ));
        assert!(matches!(
            ElevationGrid::from_raster(&raster(0, 0, vec![]), 1),
            Err(ReliefError::InvalidInput(_))
        ));
        let flat_pixels = Raster::new(vec![1.0; 4], 2, 2, (0.0, 90.0)).unwrap();
        assert!(matches!(
            ElevationGrid::from_raster(&flat_pixels, 1),
            Err(ReliefError::InvalidInput(_))
        ));
    }
}
