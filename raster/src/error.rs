use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("invalid GeoTIFF {0}: {1}")]
    GeoTiff(PathBuf, &'static str),

    #[error("unsupported raster format {0}")]
    Format(PathBuf),

    #[error("expected {rows} x {cols} samples, got {len}")]
    Shape { rows: usize, cols: usize, len: usize },
}
