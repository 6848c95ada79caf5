//! Country cropping with a boolean mask grid.
//!
//! The mask file carries a `mask` variable aligned cell-for-cell with the
//! data grid; cells where `mask == 1` are kept. The output shrinks to the
//! bounding box of kept cells, and kept-box cells whose mask is not 1
//! become NaN. Every data variable of the input is cropped and written
//! with its attributes; coordinate variables are subset to the bounding
//! box. Data variables are read and rewritten as f32 and coordinates as
//! f64, whatever their on-disk type; the NaN fill requires a float
//! output anyway.

use crate::errors::{ClimaPrepError, Result};
use crate::grid::copy_variable_attributes;
use ndarray::{ArrayD, Axis, Slice};
use netcdf::File;
use std::path::Path;

/// Half-open index range of kept rows/columns along one mask dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeptRange {
    start: usize,
    end: usize,
}

/// Crop a grid file to the cells a mask file keeps.
///
/// # Errors
///
/// `VariableNotFound` when the mask file has no `mask` variable,
/// `ShapeMismatch` when the mask's dimensions disagree with the data
/// file's, `EmptyInput` when the mask keeps nothing.
pub fn country_crop(
    data_path: impl AsRef<Path>,
    mask_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let mask_file = netcdf::open(mask_path.as_ref())?;
    let mask_var = mask_file
        .variable("mask")
        .ok_or_else(|| ClimaPrepError::VariableNotFound {
            var: "mask".to_string(),
        })?;

    let mask_dims: Vec<String> = mask_var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let mask_shape: Vec<usize> = mask_var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();
    if mask_dims.len() != 2 {
        return Err(ClimaPrepError::Generic(format!(
            "mask variable must be 2-dimensional, has {} dimensions",
            mask_dims.len()
        )));
    }
    let mask_values = mask_var.get_values::<f32, _>(..)?;
    let mask = ArrayD::from_shape_vec(mask_shape.clone(), mask_values)?;

    let data_file = netcdf::open(data_path.as_ref())?;

    // The mask must align cell-for-cell with the data grid
    for (dim, &len) in mask_dims.iter().zip(&mask_shape) {
        let data_len = data_file
            .dimension(dim)
            .map(|d| d.len())
            .ok_or_else(|| ClimaPrepError::ShapeMismatch {
                expected: mask_shape.clone(),
                found: vec![],
            })?;
        if data_len != len {
            return Err(ClimaPrepError::ShapeMismatch {
                expected: mask_shape.clone(),
                found: vec![data_len],
            });
        }
    }

    let (rows, cols) = kept_bounding_box(&mask)?;

    write_cropped(
        &data_file,
        output_path.as_ref(),
        &mask,
        &mask_dims,
        rows,
        cols,
    )?;

    drop(mask_file);
    Ok(())
}

/// Bounding box of cells where the mask equals 1
fn kept_bounding_box(mask: &ArrayD<f32>) -> Result<(KeptRange, KeptRange)> {
    let shape = mask.shape();
    let (nrows, ncols) = (shape[0], shape[1]);

    let mut row_keep = vec![false; nrows];
    let mut col_keep = vec![false; ncols];
    for i in 0..nrows {
        for j in 0..ncols {
            if mask[[i, j]] == 1.0 {
                row_keep[i] = true;
                col_keep[j] = true;
            }
        }
    }

    let range_of = |keep: &[bool]| -> Option<KeptRange> {
        let start = keep.iter().position(|&k| k)?;
        let end = keep.iter().rposition(|&k| k)? + 1;
        Some(KeptRange { start, end })
    };

    match (range_of(&row_keep), range_of(&col_keep)) {
        (Some(rows), Some(cols)) => Ok((rows, cols)),
        _ => Err(ClimaPrepError::EmptyInput(
            "mask keeps no cells".to_string(),
        )),
    }
}

fn write_cropped(
    data_file: &File,
    output_path: &Path,
    mask: &ArrayD<f32>,
    mask_dims: &[String],
    rows: KeptRange,
    cols: KeptRange,
) -> Result<()> {
    if output_path.exists() {
        std::fs::remove_file(output_path)?;
    }
    let mut out = netcdf::create(output_path)?;

    let cropped_len = |dim: &str, full: usize| -> usize {
        if dim == mask_dims[0] {
            rows.end - rows.start
        } else if dim == mask_dims[1] {
            cols.end - cols.start
        } else {
            full
        }
    };

    for dim in data_file.dimensions() {
        out.add_dimension(&dim.name(), cropped_len(&dim.name(), dim.len()))?;
    }

    let dim_names: Vec<String> = data_file.dimensions().map(|d| d.name()).collect();

    for var in data_file.variables() {
        let name = var.name();
        let var_dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();

        if dim_names.contains(&name) {
            // Coordinate variable: subset along its own dimension
            let values = var.get_values::<f64, _>(..)?;
            let subset: Vec<f64> = if name == mask_dims[0] {
                values[rows.start..rows.end].to_vec()
            } else if name == mask_dims[1] {
                values[cols.start..cols.end].to_vec()
            } else {
                values
            };
            let dim_refs: Vec<&str> = var_dims.iter().map(|s| s.as_str()).collect();
            let mut out_var = out.add_variable::<f64>(&name, &dim_refs)?;
            copy_variable_attributes(&var, &mut out_var)?;
            out_var.put_values(&subset, ..)?;
            continue;
        }

        // Data variable: crop to the bounding box, NaN where mask != 1
        let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
        let values = var.get_values::<f32, _>(..)?;
        let mut data = ArrayD::from_shape_vec(shape, values)?;

        let row_axis = var_dims.iter().position(|d| d == &mask_dims[0]);
        let col_axis = var_dims.iter().position(|d| d == &mask_dims[1]);

        if let Some(axis) = row_axis {
            data = data
                .slice_axis(
                    Axis(axis),
                    Slice::from(rows.start as isize..rows.end as isize),
                )
                .to_owned();
        }
        if let Some(axis) = col_axis {
            data = data
                .slice_axis(
                    Axis(axis),
                    Slice::from(cols.start as isize..cols.end as isize),
                )
                .to_owned();
        }

        if let (Some(ra), Some(ca)) = (row_axis, col_axis) {
            data.indexed_iter_mut().for_each(|(idx, value)| {
                let i = idx[ra] + rows.start;
                let j = idx[ca] + cols.start;
                if mask[[i, j]] != 1.0 {
                    *value = f32::NAN;
                }
            });
        }

        let dim_refs: Vec<&str> = var_dims.iter().map(|s| s.as_str()).collect();
        let mut out_var = out.add_variable::<f32>(&name, &dim_refs)?;
        copy_variable_attributes(&var, &mut out_var)?;
        out_var.put(data.view(), ..)?;
    }

    for attr_name in ["crs", "title", "history"] {
        if let Some(value) = crate::grid::global_string_attribute(data_file, attr_name) {
            out.add_attribute(attr_name, value.as_str())?;
        }
    }

    Ok(())
}
