//! Merging per-day files into one time-stacked NetCDF dataset.
//!
//! Day files are named `{prefix}{YYYY-MM-DD}.{file_type}` where the
//! prefix carries the directory and any filename stem. NetCDF days
//! contribute the named variable, squeezing any length-1 time axis of
//! their own; GeoTIFF days contribute band 1
//! with lat/lon coordinates derived from the affine georeferencing tags.
//! A missing day is warned about and omitted from the output's time
//! coordinate; it never produces a gap value.

use crate::errors::{ClimaPrepError, Result};
use crate::grid::{days_since_epoch, GridDataset};
use crate::raster::read_geotiff;
use chrono::{Duration, NaiveDate};
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Dimension names and coordinates shared by every merged day, captured
/// from the first day found
struct MergedLayout {
    dims: Vec<String>,
    coords: HashMap<String, Vec<f64>>,
    coord_units: HashMap<String, String>,
}

/// Merge one file per day over `start .. end` (end exclusive) into a
/// single NetCDF file with a new leading `time` dimension.
///
/// `file_type` selects the per-day format: `"nc"` reads `variable_name`
/// from each day file, `"tif"` reads the first raster band. `units` is
/// attached to the merged variable. Returns the output path.
///
/// # Errors
///
/// `UnsupportedFileType` for any other tag, before any file is touched;
/// `EmptyInput` when no day in the range exists; `ShapeMismatch` when
/// day files disagree on shape.
pub fn merge_files<P: AsRef<Path>>(
    prefix: &str,
    start: NaiveDate,
    end: NaiveDate,
    file_type: &str,
    variable_name: &str,
    units: &str,
    output_path: P,
) -> Result<PathBuf> {
    if file_type != "nc" && file_type != "tif" {
        return Err(ClimaPrepError::UnsupportedFileType {
            file_type: file_type.to_string(),
        });
    }

    let mut layout: Option<MergedLayout> = None;
    let mut slabs: Vec<ArrayD<f32>> = Vec::new();
    let mut found_dates: Vec<NaiveDate> = Vec::new();

    let mut date = start;
    while date < end {
        let day_path = PathBuf::from(format!("{}{}.{}", prefix, date.format("%Y-%m-%d"), file_type));
        if !day_path.exists() {
            log::warn!("missing day file {}, skipping", day_path.display());
            date += Duration::days(1);
            continue;
        }

        let (day_data, day_layout) = read_day(&day_path, file_type, variable_name)?;

        match &layout {
            None => layout = Some(day_layout),
            Some(first) => {
                if slabs[0].shape() != day_data.shape() || first.dims != day_layout.dims {
                    return Err(ClimaPrepError::ShapeMismatch {
                        expected: slabs[0].shape().to_vec(),
                        found: day_data.shape().to_vec(),
                    });
                }
            }
        }

        slabs.push(day_data);
        found_dates.push(date);
        date += Duration::days(1);
    }

    let layout = layout.ok_or_else(|| {
        ClimaPrepError::EmptyInput(format!(
            "no day files found for {}* between {} and {}",
            prefix, start, end
        ))
    })?;

    log::info!("merging {} day(s) into {}", slabs.len(), output_path.as_ref().display());

    let stacked_slabs: Vec<ArrayD<f32>> = slabs
        .into_iter()
        .map(|s| s.insert_axis(Axis(0)))
        .collect();
    let views: Vec<ArrayViewD<f32>> = stacked_slabs.iter().map(|a| a.view()).collect();
    let merged = concatenate(Axis(0), &views)?;

    write_merged(
        &merged,
        &layout,
        &found_dates,
        variable_name,
        units,
        output_path.as_ref(),
    )?;
    Ok(output_path.as_ref().to_path_buf())
}

fn read_day(path: &Path, file_type: &str, variable_name: &str) -> Result<(ArrayD<f32>, MergedLayout)> {
    if file_type == "nc" {
        let grid = GridDataset::open_variable(path, variable_name)?;
        let mut data = grid.data;
        let mut dims = grid.dims;
        let mut coords = grid.coords;
        let mut coord_units = grid.coord_units;

        // Daily files often carry their own length-1 time axis; squeeze it
        // so the merged time dimension is the only one. More than one step
        // per day file cannot be aligned with the date range.
        if let Some(pos) = dims.iter().position(|d| d == "time") {
            match data.shape()[pos] {
                1 => {
                    data = data.index_axis_move(Axis(pos), 0);
                    dims.remove(pos);
                    coords.remove("time");
                    coord_units.remove("time");
                }
                steps => {
                    return Err(ClimaPrepError::Generic(format!(
                        "{}: day file has {} time steps, expected at most 1",
                        path.display(),
                        steps
                    )))
                }
            }
        }

        let layout = MergedLayout {
            dims,
            coords,
            coord_units,
        };
        return Ok((data, layout));
    }

    let band = read_geotiff(path)?;
    let mut coords = HashMap::new();
    coords.insert("lat".to_string(), band.lats);
    coords.insert("lon".to_string(), band.lons);
    let layout = MergedLayout {
        dims: vec!["lat".to_string(), "lon".to_string()],
        coords,
        coord_units: HashMap::new(),
    };
    Ok((band.data.into_dyn(), layout))
}

fn write_merged(
    merged: &ArrayD<f32>,
    layout: &MergedLayout,
    dates: &[NaiveDate],
    variable_name: &str,
    units: &str,
    output_path: &Path,
) -> Result<()> {
    if output_path.exists() {
        std::fs::remove_file(output_path)?;
    }
    let mut file = netcdf::create(output_path)?;

    file.add_dimension("time", dates.len())?;
    for (dim, &len) in layout.dims.iter().zip(&merged.shape()[1..]) {
        file.add_dimension(dim, len)?;
    }

    let mut time_var = file.add_variable::<f64>("time", &["time"])?;
    time_var.put_attribute("units", "days since 1970-01-01")?;
    time_var.put_attribute("calendar", "gregorian")?;
    let time_values: Vec<f64> = dates.iter().map(|&d| days_since_epoch(d)).collect();
    time_var.put_values(&time_values, ..)?;

    for dim in &layout.dims {
        if let Some(values) = layout.coords.get(dim) {
            let mut coord_var = file.add_variable::<f64>(dim, &[dim.as_str()])?;
            if let Some(u) = layout.coord_units.get(dim) {
                coord_var.put_attribute("units", u.as_str())?;
            }
            coord_var.put_values(values, ..)?;
        }
    }

    let mut dim_refs: Vec<&str> = vec!["time"];
    dim_refs.extend(layout.dims.iter().map(String::as_str));
    let mut var = file.add_variable::<f32>(variable_name, &dim_refs)?;
    var.put_attribute("units", units)?;
    var.put(merged.view(), ..)?;

    Ok(())
}
