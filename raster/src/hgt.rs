//! NASADEM/SRTM elevation (`.hgt`) file format.
//!
//! Tiles are square grids of big-endian `i16` samples, stored north
//! to south. The file name encodes the tile's southwest corner.

use crate::{Raster, RasterError, C};
use byteorder::{BigEndian as BE, ReadBytesExt};
use geo::geometry::Coord;
use log::debug;
use memmap2::Mmap;
use std::{ffi::OsStr, fs::File, mem::size_of, path::Path};

const ARCSEC_PER_DEG: C = 3600.0;

/// Sample value SRTM uses for voids.
const VOID: i16 = i16::MIN;

/// Returns the tile at `path` as a raster.
///
/// Pixel size is the tile resolution in degrees. Void samples become
/// `NaN`.
pub(crate) fn load(path: &Path) -> Result<Raster, RasterError> {
    let (resolution, (rows, cols)) = extract_resolution(path)?;
    let sw_corner = parse_sw_corner(path)?;

    let samples = {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let mut samples = Vec::with_capacity(rows * cols);
        for mut bytes in mmap.chunks_exact(size_of::<i16>()) {
            let sample = bytes.read_i16::<BE>()?;
            samples.push(if sample == VOID {
                C::NAN
            } else {
                C::from(sample)
            });
        }
        samples
    };

    let voids = samples.iter().filter(|s| s.is_nan()).count();
    debug!(
        "hgt; path: {}, res: {resolution}\", dims: {rows}x{cols}, voids: {voids}",
        path.display()
    );

    // First sample is the center of the NW-most pixel, one degree
    // north of the named corner.
    let origin = Coord {
        x: C::from(sw_corner.x),
        y: C::from(sw_corner.y) + 1.0,
    };
    let pixel = C::from(resolution) / ARCSEC_PER_DEG;
    Ok(Raster::new(samples, rows, cols, (pixel, pixel))?.with_origin(origin))
}

/// Returns (arcseconds per sample, (rows, cols)) based on file size.
fn extract_resolution(path: &Path) -> Result<(u8, (usize, usize)), RasterError> {
    const RES_1_ARCSECOND_LEN: u64 = 3601 * 3601 * size_of::<i16>() as u64;
    const RES_3_ARCSECOND_LEN: u64 = 1201 * 1201 * size_of::<i16>() as u64;
    match path.metadata().map(|m| m.len())? {
        RES_1_ARCSECOND_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECOND_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(RasterError::HgtLen(invalid_len, path.to_owned())),
    }
}

fn parse_sw_corner(path: &Path) -> Result<Coord<i16>, RasterError> {
    let mk_err = || RasterError::HgtName(path.to_owned());
    let name = path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
