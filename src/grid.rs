//! Grid dataset loading, writing and coordinate handling
//!
//! A [`GridDataset`] is the in-memory form of one NetCDF data variable:
//! the value array, its dimension names, the coordinate array for each
//! dimension that has one, and the units attribute. Coordinate values are
//! always treated as opaque numerics at load time; calendar decoding is a
//! separate, explicit step ([`decode_cf_dates`]).

use crate::errors::{ClimaPrepError, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use ndarray::ArrayD;
use netcdf::{AttributeValue, File};
use std::collections::HashMap;
use std::path::Path;

/// Default CRS assigned to grids that do not declare one (WGS84)
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Names of the two spatial dimensions of a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialDims {
    pub lon: String,
    pub lat: String,
}

/// One NetCDF data variable loaded into memory with its coordinates
#[derive(Debug, Clone)]
pub struct GridDataset {
    /// Name of the data variable
    pub var_name: String,
    /// Values, dimension order as in the file
    pub data: ArrayD<f32>,
    /// Dimension names, same order as `data`'s axes
    pub dims: Vec<String>,
    /// Coordinate arrays for dimensions that have a matching coordinate variable
    pub coords: HashMap<String, Vec<f64>>,
    /// `units` attributes of coordinate variables (e.g. "days since 1970-01-01")
    pub coord_units: HashMap<String, String>,
    /// `units` attribute of the data variable
    pub units: Option<String>,
    /// Declared coordinate reference system, if any
    pub crs: Option<String>,
}

impl GridDataset {
    /// Open a grid file and load its first data variable.
    ///
    /// A data variable is any variable whose name is not also a dimension
    /// name; coordinate variables are loaded into `coords` instead.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` if the file holds no data variable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = netcdf::open(path.as_ref())?;
        let dim_names: Vec<String> = file.dimensions().map(|d| d.name()).collect();
        let var_name = file
            .variables()
            .map(|v| v.name())
            .find(|name| !dim_names.contains(name))
            .ok_or_else(|| {
                ClimaPrepError::EmptyInput(format!(
                    "no data variables in {}",
                    path.as_ref().display()
                ))
            })?;
        Self::from_file(&file, &var_name)
    }

    /// Open a grid file and load the named data variable.
    ///
    /// # Errors
    ///
    /// Returns `VariableNotFound` if the variable is absent.
    pub fn open_variable<P: AsRef<Path>>(path: P, var_name: &str) -> Result<Self> {
        let file = netcdf::open(path.as_ref())?;
        Self::from_file(&file, var_name)
    }

    /// Load one variable (and the coordinates of its dimensions) from an
    /// already-open file.
    pub fn from_file(file: &File, var_name: &str) -> Result<Self> {
        let var = file
            .variable(var_name)
            .ok_or_else(|| ClimaPrepError::VariableNotFound {
                var: var_name.to_string(),
            })?;

        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
        let data_vec = var.get_values::<f32, _>(..)?;
        let data = ArrayD::from_shape_vec(shape, data_vec)?;

        let units = string_attribute(file, var_name, "units");

        let mut coords = HashMap::new();
        let mut coord_units = HashMap::new();
        for dim in &dims {
            if let Some(coord_var) = file.variable(dim) {
                let values = coord_var.get_values::<f64, _>(..)?;
                coords.insert(dim.clone(), values);
                if let Some(u) = string_attribute(file, dim, "units") {
                    coord_units.insert(dim.clone(), u);
                }
            }
        }

        let crs = global_string_attribute(file, "crs");

        Ok(Self {
            var_name: var_name.to_string(),
            data,
            dims,
            coords,
            coord_units,
            units,
            crs,
        })
    }

    /// Axis index of a dimension in the data array
    pub fn axis(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| ClimaPrepError::DimensionNotFound {
                var: self.var_name.clone(),
                dim: dim.to_string(),
            })
    }

    /// Detect the spatial dimension names: `lon`/`lat` when present,
    /// otherwise `x`/`y`.
    pub fn spatial_dims(&self) -> SpatialDims {
        detect_spatial_dims(&self.dims)
    }

    /// Effective CRS: the declared one, or WGS84 when the grid declares none
    pub fn crs_or_default(&self) -> &str {
        self.crs.as_deref().unwrap_or(DEFAULT_CRS)
    }

    /// Decode the coordinate of the given dimension into calendar dates
    /// using its CF units attribute. Returns `None` when the dimension has
    /// no coordinate or no decodable units.
    pub fn decode_dates(&self, dim: &str) -> Option<Vec<NaiveDate>> {
        let values = self.coords.get(dim)?;
        let units = self.coord_units.get(dim)?;
        decode_cf_dates(values, units)
    }

    /// Write this dataset to a new NetCDF file.
    ///
    /// Dimensions, coordinate variables (with their units) and the data
    /// variable (with its units and the CRS global attribute) are written;
    /// an existing file at `path` is replaced.
    pub fn to_netcdf<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }

        let mut file = netcdf::create(path)?;

        for (dim, &len) in self.dims.iter().zip(self.data.shape()) {
            file.add_dimension(dim, len)?;
        }

        for dim in &self.dims {
            if let Some(values) = self.coords.get(dim) {
                let mut coord_var = file.add_variable::<f64>(dim, &[dim.as_str()])?;
                if let Some(units) = self.coord_units.get(dim) {
                    coord_var.put_attribute("units", units.as_str())?;
                }
                coord_var.put_values(values, ..)?;
            }
        }

        let dim_refs: Vec<&str> = self.dims.iter().map(|s| s.as_str()).collect();
        let mut var = file.add_variable::<f32>(&self.var_name, &dim_refs)?;
        if let Some(units) = &self.units {
            var.put_attribute("units", units.as_str())?;
        }
        var.put(self.data.view(), ..)?;

        if let Some(crs) = &self.crs {
            file.add_attribute("crs", crs.as_str())?;
        }

        Ok(())
    }
}

/// `lon`/`lat` when `lon` is among the dimension names, otherwise `x`/`y`
pub fn detect_spatial_dims(dims: &[String]) -> SpatialDims {
    let lon = if dims.iter().any(|d| d == "lon") {
        "lon"
    } else {
        "x"
    };
    let lat = if dims.iter().any(|d| d == "lat") {
        "lat"
    } else {
        "y"
    };
    SpatialDims {
        lon: lon.to_string(),
        lat: lat.to_string(),
    }
}

/// Read a string attribute from a variable, if present
pub fn string_attribute(file: &File, var_name: &str, attr_name: &str) -> Option<String> {
    let var = file.variable(var_name)?;
    match var.attribute(attr_name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Read a global string attribute, if present
pub fn global_string_attribute(file: &File, attr_name: &str) -> Option<String> {
    match file.attribute(attr_name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

/// Copy every attribute of `src` onto `dst`.
///
/// Attribute types outside the usual numeric/string set are skipped with
/// a warning rather than failing the whole write.
pub fn copy_variable_attributes(
    src: &netcdf::Variable,
    dst: &mut netcdf::VariableMut,
) -> Result<()> {
    for attr in src.attributes() {
        match attr.value()? {
            AttributeValue::Str(val) => {
                dst.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Strs(vals) => {
                dst.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Float(val) => {
                dst.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Floats(vals) => {
                dst.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Double(val) => {
                dst.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Doubles(vals) => {
                dst.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Int(val) => {
                dst.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Ints(vals) => {
                dst.put_attribute(attr.name(), vals)?;
            }
            AttributeValue::Short(val) => {
                dst.put_attribute(attr.name(), val)?;
            }
            AttributeValue::Shorts(vals) => {
                dst.put_attribute(attr.name(), vals)?;
            }
            _ => {
                log::warn!("skipped unsupported attribute type for '{}'", attr.name());
            }
        }
    }
    Ok(())
}

/// Decode CF-convention time values ("days|hours|seconds since <epoch>")
/// into calendar dates. Returns `None` when the units string is not one of
/// the supported forms.
pub fn decode_cf_dates(values: &[f64], units: &str) -> Option<Vec<NaiveDate>> {
    let mut parts = units.splitn(2, " since ");
    let unit = parts.next()?.trim().to_lowercase();
    let epoch_str = parts.next()?.trim();

    let epoch = parse_epoch(epoch_str)?;

    let seconds_per_unit = match unit.as_str() {
        "days" | "day" => 86_400.0,
        "hours" | "hour" => 3_600.0,
        "seconds" | "second" => 1.0,
        _ => return None,
    };

    let mut dates = Vec::with_capacity(values.len());
    for &v in values {
        let secs = (v * seconds_per_unit).round() as i64;
        let dt = epoch.checked_add_signed(Duration::seconds(secs))?;
        dates.push(dt.date());
    }
    Some(dates)
}

/// Offset of a calendar date from 1970-01-01, in days
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch");
    (date - epoch).num_days() as f64
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    // "YYYY-MM-DD", optionally followed by a time of day
    let mut fields = s.split_whitespace();
    let date = NaiveDate::parse_from_str(fields.next()?, "%Y-%m-%d").ok()?;
    let time = match fields.next() {
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S")
            .ok()
            .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight")),
        None => NaiveTime::from_hms_opt(0, 0, 0).expect("midnight"),
    };
    Some(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_lon_lat_dims() {
        let dims = vec!["time".to_string(), "lat".to_string(), "lon".to_string()];
        let spatial = detect_spatial_dims(&dims);
        assert_eq!(spatial.lon, "lon");
        assert_eq!(spatial.lat, "lat");
    }

    #[test]
    fn falls_back_to_x_y_dims() {
        let dims = vec!["time".to_string(), "y".to_string(), "x".to_string()];
        let spatial = detect_spatial_dims(&dims);
        assert_eq!(spatial.lon, "x");
        assert_eq!(spatial.lat, "y");
    }

    #[test]
    fn decodes_days_since_units() {
        let dates = decode_cf_dates(&[0.0, 5.0], "days since 2023-01-01").unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2023, 1, 6).unwrap());
    }

    #[test]
    fn decodes_hours_with_time_of_day() {
        let dates = decode_cf_dates(&[0.0, 36.0], "hours since 2000-01-01 00:00:00").unwrap();
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2000, 1, 2).unwrap());
    }

    #[test]
    fn rejects_unknown_units() {
        assert!(decode_cf_dates(&[0.0], "fortnights since 2000-01-01").is_none());
        assert!(decode_cf_dates(&[0.0], "kelvin").is_none());
    }

    #[test]
    fn epoch_day_offsets() {
        assert_eq!(
            days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            0.0
        );
        assert_eq!(
            days_since_epoch(NaiveDate::from_ymd_opt(1970, 1, 11).unwrap()),
            10.0
        );
    }
}
