//! Per-municipality time means sampled at the municipality centroid.
//!
//! Each municipality contributes one row: the grid cell nearest to the
//! feature's centroid is selected (nearest neighbor, no interpolation)
//! and its values are averaged over the remaining (time) axis. The rows
//! come back as a table in feature order; persisting them is left to the
//! caller, with a CSV helper for the common case.

use crate::errors::{ClimaPrepError, Result};
use crate::grid::GridDataset;
use crate::stats::nan_mean;
use crate::vector::{Crs, VectorLayer};
use ndarray::{ArrayD, ArrayViewD, Axis};
use std::path::Path;

/// One municipality's averaged value with its display labels
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityMean {
    pub region: String,
    pub municipality: String,
    pub mean: f32,
    /// Column label for the mean, `"{var}_mean ({units})"`
    pub value_label: String,
}

/// Average `variable_name` over time at each municipality centroid.
///
/// `region_column` and `municipality_column` name the layer attributes
/// used as row labels. Returns one row per feature in file order.
///
/// # Errors
///
/// `VariableNotFound` when the variable is absent; `VectorLayer` when a
/// label attribute is missing; `EmptyInput` for a layer with no features.
pub fn municipality_daily_mean(
    layer_path: impl AsRef<Path>,
    grid_path: impl AsRef<Path>,
    variable_name: &str,
    region_column: &str,
    municipality_column: &str,
    units: &str,
) -> Result<Vec<MunicipalityMean>> {
    let grid = GridDataset::open_variable(grid_path.as_ref(), variable_name)?;
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
    let lons = grid
        .coords
        .get(&spatial.lon)
        .ok_or_else(|| ClimaPrepError::DimensionNotFound {
            var: grid.var_name.clone(),
            dim: spatial.lon.clone(),
        })?;
    let lats = grid
        .coords
        .get(&spatial.lat)
        .ok_or_else(|| ClimaPrepError::DimensionNotFound {
            var: grid.var_name.clone(),
            dim: spatial.lat.clone(),
        })?;

    let value_label = format!("{}_mean ({})", variable_name, units);

    let mut rows = Vec::with_capacity(layer.features.len());
    for feature in &layer.features {
        let region = feature.property_string(region_column)?;
        let municipality = feature.property_string(municipality_column)?;

        let (cx, cy) = feature.geometry.centroid();
        let j = nearest_index(lons, cx);
        let i = nearest_index(lats, cy);

        let series = cell_series(&grid.data, lat_axis, i, lon_axis, j);
        let values: Vec<f32> = series.iter().copied().collect();
        let mean = nan_mean(&values);

        log::info!(
            "{} / {}: cell ({}, {}), mean {:.3}",
            region,
            municipality,
            i,
            j,
            mean
        );

        rows.push(MunicipalityMean {
            region,
            municipality,
            mean,
            value_label: value_label.clone(),
        });
    }

    Ok(rows)
}

/// Write a municipality table as CSV with a `region`, `municipality` and
/// per-variable mean column.
pub fn write_csv<P: AsRef<Path>>(rows: &[MunicipalityMean], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let label = rows
        .first()
        .map(|r| r.value_label.as_str())
        .unwrap_or("mean");
    writer.write_record(["region", "municipality", label])?;
    for row in rows {
        writer.write_record([
            row.region.as_str(),
            row.municipality.as_str(),
            &format!("{}", row.mean),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Index of the coordinate value closest to `target`
fn nearest_index(coords: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, &c) in coords.iter().enumerate() {
        let dist = (c - target).abs();
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }
    best
}

/// Drop the two spatial axes at the given indices, leaving the series
/// along the remaining axes (usually time)
fn cell_series(
    data: &ArrayD<f32>,
    lat_axis: usize,
    lat_idx: usize,
    lon_axis: usize,
    lon_idx: usize,
) -> ArrayViewD<'_, f32> {
    // Remove the higher axis first so the lower one keeps its position
    let (first_axis, first_idx, second_axis, second_idx) = if lat_axis > lon_axis {
        (lat_axis, lat_idx, lon_axis, lon_idx)
    } else {
        (lon_axis, lon_idx, lat_axis, lat_idx)
    };
    data.index_axis(Axis(first_axis), first_idx)
        .index_axis_move(Axis(second_axis), second_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_index_picks_closest() {
        let coords = [10.0, 10.5, 11.0, 11.5];
        assert_eq!(nearest_index(&coords, 10.6), 1);
        assert_eq!(nearest_index(&coords, 11.4), 3);
        assert_eq!(nearest_index(&coords, 9.0), 0);
    }

    #[test]
    fn cell_series_selects_one_cell_over_time() {
        // shape (time=3, lat=2, lon=2)
        let data = ArrayD::from_shape_vec(
            vec![3, 2, 2],
            vec![
                0.0, 1.0, 2.0, 3.0, //
                10.0, 11.0, 12.0, 13.0, //
                20.0, 21.0, 22.0, 23.0,
            ],
        )
        .unwrap();
        let series = cell_series(&data, 1, 1, 2, 0);
        let values: Vec<f32> = series.iter().copied().collect();
        assert_eq!(values, vec![2.0, 12.0, 22.0]);
    }
}
