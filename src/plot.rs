//! Daily time-series plot of a grid variable.
//!
//! The variable is averaged over its spatial cells per time step, the
//! spread is the per-step standard deviation, and the figure is a mean
//! line with a translucent mean±std band written as a PNG.

use crate::errors::Result;
use crate::grid::{days_since_epoch, GridDataset};
use crate::render::SeriesChart;
use crate::stats::mean_std_over_spatial;
use std::path::{Path, PathBuf};

/// Plot the spatial mean of `variable_name` over time with a ±1 std band.
///
/// `save_prefix` is the output path prefix; the variable name is appended
/// to form the final file name, mirroring the naming of the figure
/// archive this feeds. Dimension names default to `lon`/`lat`/`time` at
/// the CLI but any names can be passed here.
///
/// Returns the path of the written PNG.
///
/// # Errors
///
/// `VariableNotFound` before anything is written when the variable is
/// absent; `DimensionNotFound` when a named dimension is not one of the
/// variable's axes; `EmptyInput` when no finite value exists to plot.
pub fn plot_time_series<P: AsRef<Path>>(
    file_path: P,
    variable_name: &str,
    save_prefix: &str,
    lon_dim: &str,
    lat_dim: &str,
    time_dim: &str,
) -> Result<PathBuf> {
    let grid = GridDataset::open_variable(file_path.as_ref(), variable_name)?;

    // Fail on bad dimension names before doing any work
    grid.axis(lon_dim)?;
    grid.axis(lat_dim)?;
    let time_axis = grid.axis(time_dim)?;

    let (mean, std) = mean_std_over_spatial(&grid.data, time_axis);
    let lower: Vec<f32> = mean.iter().zip(&std).map(|(m, s)| m - s).collect();
    let upper: Vec<f32> = mean.iter().zip(&std).map(|(m, s)| m + s).collect();

    let dates = grid.decode_dates(time_dim);
    let x: Vec<f64> = match (&dates, grid.coords.get(time_dim)) {
        (Some(dates), _) => dates.iter().map(|&d| days_since_epoch(d)).collect(),
        (None, Some(values)) => values.clone(),
        (None, None) => (0..mean.len()).map(|i| i as f64).collect(),
    };

    let units = grid.units.as_deref().unwrap_or("unidades");
    let chart = SeriesChart {
        x: &x,
        mean: &mean,
        lower: &lower,
        upper: &upper,
        dates: dates.as_deref(),
        title: format!("Promedio diario de {}", variable_name),
        y_label: format!("{} ({})", variable_name, units),
        x_label: "Dias".to_string(),
        legend_line: format!("{} promedio", variable_name),
        legend_band: "Rango de incertidumbre".to_string(),
    };
    let png = chart.render()?;

    let output = PathBuf::from(format!("{}{}", save_prefix, variable_name));
    std::fs::write(&output, png)?;
    log::info!("wrote {}", output.display());

    Ok(output)
}
