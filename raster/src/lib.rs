//! Elevation rasters.
//!
//! A [Raster] is a row-major matrix of elevation samples whose first
//! sample is the top-left (north-west) corner of the covered area,
//! together with the size of one pixel in the raster's native units.
//! Missing samples are represented as `NaN`; cleaning them up is left
//! to the consumer.
//!
//! # References
//!
//! 1. [HGT file layout](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)
//! 1. [OGC GeoTIFF standard](https://docs.ogc.org/is/19-008r4/19-008r4.html)

mod error;
mod geotiff;
mod hgt;

pub use crate::error::RasterError;
use geo::geometry::Coord;
use std::{ffi::OsStr, path::Path};

/// Base floating point type used for samples and pixel sizes.
pub type C = f64;

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// Elevation samples, row-major, north to south, west to east.
    samples: Box<[C]>,

    /// Number of rows (north/south extent in pixels).
    rows: usize,

    /// Number of columns (east/west extent in pixels).
    cols: usize,

    /// Size of one pixel as (x, y), in the raster's native units.
    pixel_size: (C, C),

    /// Location of the top-left sample, when the source format
    /// carries one.
    origin: Option<Coord<C>>,
}

impl Raster {
    /// Returns an in-memory raster built from row-major `samples`.
    pub fn new(
        samples: Vec<C>,
        rows: usize,
        cols: usize,
        pixel_size: (C, C),
    ) -> Result<Self, RasterError> {
        if samples.len() != rows * cols {
            return Err(RasterError::Shape {
                rows,
                cols,
                len: samples.len(),
            });
        }
        Ok(Self {
            samples: samples.into_boxed_slice(),
            rows,
            cols,
            pixel_size,
            origin: None,
        })
    }

    /// Returns a raster decoded from the file at `path`.
    ///
    /// The format is picked by extension: `.hgt` for SRTM/NASADEM
    /// tiles, `.tif` or `.tiff` for GeoTIFF.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RasterError> {
        Self::open_with(path.as_ref(), None)
    }

    /// Like [Raster::open], but uses `pixel_size` instead of whatever
    /// the file declares.
    ///
    /// Needed for GeoTIFFs that lack a `ModelPixelScale` tag.
    pub fn open_with_pixel_size<P: AsRef<Path>>(
        path: P,
        pixel_size: (C, C),
    ) -> Result<Self, RasterError> {
        Self::open_with(path.as_ref(), Some(pixel_size))
    }

    pub fn with_origin(mut self, origin: Coord<C>) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the number of samples in this raster.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the (x, y) size of one pixel in native units.
    pub fn pixel_size(&self) -> (C, C) {
        self.pixel_size
    }

    /// Returns the location of the top-left sample, if known.
    pub fn origin(&self) -> Option<Coord<C>> {
        self.origin
    }

    /// Returns all samples, row-major.
    pub fn samples(&self) -> &[C] {
        &self.samples
    }

    /// Returns the sample at `(row, col)`, or `None` when out of
    /// bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<C> {
        if row < self.rows && col < self.cols {
            Some(self.samples[row * self.cols + col])
        } else {
            None
        }
    }

    /// Returns the sample at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col)` is outside the raster.
    pub fn get_unchecked(&self, row: usize, col: usize) -> C {
        self.samples[row * self.cols + col]
    }
}

/// Private API
impl Raster {
    fn open_with(path: &Path, pixel_size: Option<(C, C)>) -> Result<Self, RasterError> {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let raster = match ext.as_deref() {
            Some("hgt") => hgt::load(path)?,
            Some("tif" | "tiff") => return geotiff::load(path, pixel_size),
            _ => return Err(RasterError::Format(path.to_owned())),
        };
        Ok(match pixel_size {
            Some(pixel_size) => Self {
                pixel_size,
                ..raster
            },
            None => raster,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::path::PathBuf;

    /// Returns a fresh, empty scratch directory unique to `name`.
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("raster-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
