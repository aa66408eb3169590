//! Single band GeoTIFF elevation files.

use crate::{Raster, RasterError, C};
use geo::geometry::Coord;
use log::debug;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use tiff::{
    decoder::{Decoder, DecodingResult, Limits},
    tags::Tag,
    ColorType,
};

/// (x, y, z) size of one pixel.
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;

/// (i, j, k, x, y, z) raster to model tie point.
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;

/// ASCII encoded missing-data value.
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// Returns the first band of the GeoTIFF at `path` as a raster.
///
/// `pixel_size`, when given, takes precedence over the file's
/// `ModelPixelScale`.
pub(crate) fn load(path: &Path, pixel_size: Option<(C, C)>) -> Result<Raster, RasterError> {
    let file = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(file)?.with_limits(Limits::unlimited());

    if !matches!(decoder.colortype()?, ColorType::Gray(_)) {
        return Err(RasterError::GeoTiff(
            path.to_owned(),
            "expected a single band",
        ));
    }

    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let pixel_size = match pixel_size {
        Some(pixel_size) => pixel_size,
        None => read_pixel_scale(&mut decoder).ok_or_else(|| {
            RasterError::GeoTiff(path.to_owned(), "missing or invalid ModelPixelScale")
        })?,
    };
    let origin = read_origin(&mut decoder, pixel_size);
    let nodata = read_nodata(&mut decoder);

    let mut samples = decode_samples(&mut decoder)?;
    if let Some(nodata) = nodata {
        for sample in &mut samples {
            if *sample == nodata {
                *sample = C::NAN;
            }
        }
    }

    debug!(
        "geotiff; path: {}, dims: {rows}x{cols}, pixel_size: {pixel_size:?}, nodata: {nodata:?}",
        path.display()
    );

    let raster = Raster::new(samples, rows, cols, pixel_size)?;
    Ok(match origin {
        Some(origin) => raster.with_origin(origin),
        None => raster,
    })
}

fn read_pixel_scale<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<(C, C)> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let (x, y) = (scale.first()?.abs(), scale.get(1)?.abs());
    (x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0).then_some((x, y))
}

/// Returns the model location of pixel (0, 0).
fn read_origin<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    (scale_x, scale_y): (C, C),
) -> Option<Coord<C>> {
    match decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?.as_slice() {
        [i, j, _k, x, y, ..] => Some(Coord {
            x: x - i * scale_x,
            y: y + j * scale_y,
        }),
        _ => None,
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<C> {
    decoder
        .get_tag_ascii_string(GDAL_NODATA)
        .ok()?
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

#[allow(clippy::cast_precision_loss)]
fn decode_samples<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Vec<C>, RasterError> {
    Ok(match decoder.read_image()? {
        DecodingResult::F32(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I8(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as C).collect(),
        DecodingResult::U8(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(C::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as C).collect(),
    })
}
