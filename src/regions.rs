//! Clipping a grid to named regions of a vector layer.
//!
//! Every feature of the layer produces one masked copy of the grid's first
//! data variable: cells whose center falls outside the feature's polygon
//! become NaN, cells inside keep their value. The copies are stacked along
//! a new leading `region` dimension in file order, and the feature display
//! names are recorded in the same order as a `region_names` attribute on
//! the stacked variable.
//!
//! Time is never decoded here; every coordinate is carried as opaque
//! numbers. A grid without a declared CRS is assumed WGS84, and the layer
//! is reprojected to the grid's CRS when the two differ.

use crate::errors::{ClimaPrepError, Result};
use crate::grid::GridDataset;
use crate::vector::{Crs, VectorLayer};
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis};
use std::path::{Path, PathBuf};

/// Clip `data_path` to every region of `layer_path` and write the stacked
/// result to `output_path`. `name_column` is the attribute column holding
/// each region's display name.
///
/// Returns the output path.
pub fn regions_crop(
    data_path: impl AsRef<Path>,
    layer_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    name_column: &str,
) -> Result<PathBuf> {
    let grid = GridDataset::open(data_path.as_ref())?;
    let grid_crs = Crs::parse(grid.crs_or_default())?;

    let mut layer = VectorLayer::open(layer_path.as_ref())?;
    layer.reproject_to(grid_crs);

    if layer.features.is_empty() {
        return Err(ClimaPrepError::EmptyInput(
            "vector layer has no features".to_string(),
        ));
    }

    let spatial = grid.spatial_dims();
    let lon_axis = grid.axis(&spatial.lon)?;
    let lat_axis = grid.axis(&spatial.lat)?;
    let lons = coord_values(&grid, &spatial.lon)?;
    let lats = coord_values(&grid, &spatial.lat)?;

    let mut clipped: Vec<ArrayD<f32>> = Vec::with_capacity(layer.features.len());
    let mut region_names: Vec<String> = Vec::with_capacity(layer.features.len());

    for feature in &layer.features {
        let name = feature.property_string(name_column)?;
        log::info!("clipping region '{}'", name);

        // Cell-center membership per (lat, lon) pair, shared across the
        // remaining dimensions
        let inside: Vec<Vec<bool>> = lats
            .iter()
            .map(|&lat| {
                lons.iter()
                    .map(|&lon| feature.geometry.contains(lon, lat))
                    .collect()
            })
            .collect();

        let mut masked = grid.data.clone();
        masked.indexed_iter_mut().for_each(|(idx, value)| {
            if !inside[idx[lat_axis]][idx[lon_axis]] {
                *value = f32::NAN;
            }
        });

        clipped.push(masked.insert_axis(Axis(0)));
        region_names.push(name);
    }

    let views: Vec<ArrayViewD<f32>> = clipped.iter().map(|a| a.view()).collect();
    let stacked = concatenate(Axis(0), &views)?;

    write_stacked(&grid, &stacked, &region_names, output_path.as_ref())?;
    Ok(output_path.as_ref().to_path_buf())
}

fn coord_values<'a>(grid: &'a GridDataset, dim: &str) -> Result<&'a [f64]> {
    grid.coords
        .get(dim)
        .map(Vec::as_slice)
        .ok_or_else(|| ClimaPrepError::DimensionNotFound {
            var: grid.var_name.clone(),
            dim: dim.to_string(),
        })
}

fn write_stacked(
    grid: &GridDataset,
    stacked: &ArrayD<f32>,
    region_names: &[String],
    output_path: &Path,
) -> Result<()> {
    if output_path.exists() {
        std::fs::remove_file(output_path)?;
    }
    let mut file = netcdf::create(output_path)?;

    file.add_dimension("region", region_names.len())?;
    for (dim, &len) in grid.dims.iter().zip(grid.data.shape()) {
        file.add_dimension(dim, len)?;
    }

    // Index coordinate for the region dimension; the display names ride
    // along as a string-array attribute
    let mut region_var = file.add_variable::<i32>("region", &["region"])?;
    let indices: Vec<i32> = (0..region_names.len() as i32).collect();
    region_var.put_values(&indices, ..)?;

    for dim in &grid.dims {
        if let Some(values) = grid.coords.get(dim) {
            let mut coord_var = file.add_variable::<f64>(dim, &[dim.as_str()])?;
            if let Some(units) = grid.coord_units.get(dim) {
                coord_var.put_attribute("units", units.as_str())?;
            }
            coord_var.put_values(values, ..)?;
        }
    }

    let mut dim_refs: Vec<&str> = vec!["region"];
    dim_refs.extend(grid.dims.iter().map(String::as_str));
    let mut var = file.add_variable::<f32>(&grid.var_name, &dim_refs)?;
    if let Some(units) = &grid.units {
        var.put_attribute("units", units.as_str())?;
    }
    var.put_attribute("region_names", region_names.to_vec())?;
    var.put(stacked.view(), ..)?;

    file.add_attribute("crs", grid.crs_or_default())?;

    Ok(())
}
