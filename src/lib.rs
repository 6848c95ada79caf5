//! climaprep: preparing gridded climate datasets
//!
//! A Rust library for the recurring chores of working with daily climate
//! grids: plotting a variable's spatial mean over time with an
//! uncertainty band, cropping a grid to a country mask, clipping it to
//! the regions of a vector layer, merging one-file-per-day archives into
//! a single time series, averaging a variable at municipality centroids,
//! and renaming day-of-year files to calendar dates.
//!
//! ## Key Features
//!
//! - **NetCDF grids**: datasets are read and written through the `netcdf`
//!   crate with their coordinates and attributes
//! - **GeoJSON layers**: region and municipality boundaries as
//!   FeatureCollections, with WGS84/Web Mercator reprojection
//! - **GeoTIFF days**: single-band rasters merge alongside NetCDF day
//!   files, coordinates derived from the georeferencing tags
//! - **Parallel Processing**: per-step spatial reductions run on the
//!   Rayon pool
//! - **PNG figures**: self-contained chart rasterizer, no plotting
//!   runtime required
//!
//! ## Module Organization
//!
//! - [`grid`]: NetCDF grid loading, writing and CF time decoding
//! - [`vector`]: GeoJSON layers, containment tests and CRS handling
//! - [`plot`]: time-series figure of a variable's spatial mean
//! - [`mask`]: country-mask cropping
//! - [`regions`]: per-region clipping into a region-stacked dataset
//! - [`merge`]: per-day file merging along a new time dimension
//! - [`municipal`]: per-municipality centroid means
//! - [`julian`]: day-of-year file renaming
//! - [`render`]: PNG chart rasterization
//! - [`raster`]: single-band GeoTIFF input
//! - [`stats`]: spatial reductions
//! - [`parallel`]: Rayon pool configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use climaprep::prelude::*;
//!
//! // Plot the daily spatial mean of a variable with a ±1 std band
//! plot_time_series("data.nc", "t2m", "figures/", "lon", "lat", "time").unwrap();
//!
//! // Crop to the cells a country mask keeps
//! country_crop("data.nc", "mask.nc", "cropped.nc").unwrap();
//! ```

pub mod cli;
pub mod errors;
pub mod grid;
pub mod julian;
pub mod mask;
pub mod merge;
pub mod municipal;
pub mod parallel;
pub mod plot;
pub mod raster;
pub mod regions;
pub mod render;
pub mod stats;
pub mod vector;

// Direct re-exports for the public API
pub use errors::{ClimaPrepError, Result};
pub use julian::translate_julian_dates;
pub use mask::country_crop;
pub use merge::merge_files;
pub use municipal::{municipality_daily_mean, MunicipalityMean};
pub use plot::plot_time_series;
pub use regions::regions_crop;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::errors::{ClimaPrepError, Result};
    pub use crate::grid::GridDataset;
    pub use crate::municipal::MunicipalityMean;
    pub use crate::parallel::ParallelConfig;
    pub use crate::vector::{Crs, VectorLayer};
    pub use crate::{
        country_crop, merge_files, municipality_daily_mean, plot_time_series, regions_crop,
        translate_julian_dates,
    };
}
