//! Single-band GeoTIFF input.
//!
//! Forecast fields arrive as one single-band GeoTIFF per day. The band is
//! decoded to f32 whatever its sample type, and the latitude/longitude
//! coordinate arrays are derived from the raster's affine georeferencing
//! (ModelTiepoint origin plus ModelPixelScale spacing, north-up rasters).

use crate::errors::{ClimaPrepError, Result};
use ndarray::Array2;
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

/// One decoded raster band with derived coordinates
#[derive(Debug, Clone)]
pub struct RasterBand {
    /// Values, row-major, row 0 = northernmost
    pub data: Array2<f32>,
    /// Longitude of each column, increasing eastward
    pub lons: Vec<f64>,
    /// Latitude of each row, decreasing for north-up rasters
    pub lats: Vec<f64>,
}

/// Read the first band of a GeoTIFF plus its georeferencing.
///
/// # Errors
///
/// Propagates decode failures; missing georeferencing tags and
/// unsupported sample formats are explicit errors.
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<RasterBand> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut decoder = Decoder::new(file)?;
    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| georeferencing_error(path, "ModelPixelScale"))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| georeferencing_error(path, "ModelTiepoint"))?;
    if scale.len() < 2 || tiepoint.len() < 5 {
        return Err(georeferencing_error(path, "truncated transform"));
    }
    // Tiepoint maps raster (0, 0) to world (x, y); scale is per-pixel spacing
    let (scale_x, scale_y) = (scale[0], scale[1]);
    let (origin_x, origin_y) = (tiepoint[3], tiepoint[4]);

    let values: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        _ => {
            return Err(ClimaPrepError::Generic(format!(
                "unsupported sample format in {}",
                path.display()
            )))
        }
    };

    if values.len() != width * height {
        return Err(ClimaPrepError::Generic(format!(
            "{}: expected a single-band raster ({} samples for {}x{})",
            path.display(),
            values.len(),
            width,
            height
        )));
    }

    let data = Array2::from_shape_vec((height, width), values)?;
    let lons: Vec<f64> = (0..width).map(|j| origin_x + scale_x * j as f64).collect();
    let lats: Vec<f64> = (0..height).map(|i| origin_y - scale_y * i as f64).collect();

    Ok(RasterBand { data, lons, lats })
}

fn georeferencing_error(path: &Path, what: &str) -> ClimaPrepError {
    ClimaPrepError::Generic(format!(
        "{}: missing or invalid georeferencing ({})",
        path.display(),
        what
    ))
}
