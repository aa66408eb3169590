use raster::RasterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReliefError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Raster(#[from] RasterError),
}
