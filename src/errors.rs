//! Centralized error handling for climaprep
//!
//! This module provides structured error types used across every operation,
//! replacing ad-hoc `Box<dyn Error>` returns with better error context and
//! type safety. All operations report failures through [`ClimaPrepError`];
//! the only recoverable condition (a missing per-day file during a merge)
//! is logged and skipped instead.

use std::fmt;

/// Main error type for climaprep operations
#[derive(Debug)]
pub enum ClimaPrepError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Variable not found in a grid dataset
    VariableNotFound { var: String },

    /// Dimension not found in a variable
    DimensionNotFound { var: String, dim: String },

    /// Mask and data grids disagree on spatial shape
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// Unrecognized per-day file type tag passed to the merger
    UnsupportedFileType { file_type: String },

    /// An operation was asked to combine zero inputs
    EmptyInput(String),

    /// Vector layer could not be read or interpreted
    VectorLayer(String),

    /// Coordinate reference system is not one we can transform
    UnsupportedCrs { crs: String },

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// GeoJSON (de)serialization errors
    JsonError(serde_json::Error),

    /// GeoTIFF decoding errors
    TiffError(tiff::TiffError),

    /// CSV export errors
    CsvError(csv::Error),

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error
    Generic(String),
}

impl fmt::Display for ClimaPrepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClimaPrepError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            ClimaPrepError::IoError(e) => write!(f, "I/O error: {}", e),
            ClimaPrepError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            ClimaPrepError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            ClimaPrepError::ShapeMismatch { expected, found } => write!(
                f,
                "Spatial shape mismatch: expected {:?}, found {:?}",
                expected, found
            ),
            ClimaPrepError::UnsupportedFileType { file_type } => {
                write!(f, "Unsupported file type: {}", file_type)
            }
            ClimaPrepError::EmptyInput(msg) => write!(f, "Nothing to combine: {}", msg),
            ClimaPrepError::VectorLayer(msg) => write!(f, "Vector layer error: {}", msg),
            ClimaPrepError::UnsupportedCrs { crs } => {
                write!(f, "Unsupported coordinate reference system: {}", crs)
            }
            ClimaPrepError::ArrayError(e) => write!(f, "Array error: {}", e),
            ClimaPrepError::JsonError(e) => write!(f, "GeoJSON error: {}", e),
            ClimaPrepError::TiffError(e) => write!(f, "GeoTIFF error: {}", e),
            ClimaPrepError::CsvError(e) => write!(f, "CSV error: {}", e),
            ClimaPrepError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            ClimaPrepError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ClimaPrepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClimaPrepError::NetCDFError(e) => Some(e),
            ClimaPrepError::IoError(e) => Some(e),
            ClimaPrepError::ArrayError(e) => Some(e),
            ClimaPrepError::JsonError(e) => Some(e),
            ClimaPrepError::TiffError(e) => Some(e),
            ClimaPrepError::CsvError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for ClimaPrepError {
    fn from(error: netcdf::Error) -> Self {
        ClimaPrepError::NetCDFError(error)
    }
}

impl From<std::io::Error> for ClimaPrepError {
    fn from(error: std::io::Error) -> Self {
        ClimaPrepError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for ClimaPrepError {
    fn from(error: ndarray::ShapeError) -> Self {
        ClimaPrepError::ArrayError(error)
    }
}

impl From<serde_json::Error> for ClimaPrepError {
    fn from(error: serde_json::Error) -> Self {
        ClimaPrepError::JsonError(error)
    }
}

impl From<tiff::TiffError> for ClimaPrepError {
    fn from(error: tiff::TiffError) -> Self {
        ClimaPrepError::TiffError(error)
    }
}

impl From<csv::Error> for ClimaPrepError {
    fn from(error: csv::Error) -> Self {
        ClimaPrepError::CsvError(error)
    }
}

impl From<String> for ClimaPrepError {
    fn from(error: String) -> Self {
        ClimaPrepError::Generic(error)
    }
}

impl From<&str> for ClimaPrepError {
    fn from(error: &str) -> Self {
        ClimaPrepError::Generic(error.to_string())
    }
}

/// Result type alias for climaprep operations
pub type Result<T> = std::result::Result<T, ClimaPrepError>;
