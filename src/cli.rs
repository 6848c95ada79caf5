//! Defines command-line interface options using `clap` for the climaprep application.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI for preparing gridded climate datasets
#[derive(Parser, Debug)]
#[command(
    version,
    name = "climaprep",
    about = "Prepare gridded climate datasets: plot, crop, clip, merge, tabulate"
)]
pub struct Args {
    /// Number of threads to use for parallel processing. Defaults to the Rayon default.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plot the spatial mean of a variable over time with a ±1 std band
    Plot {
        /// Path to the NetCDF file
        #[arg(short, long)]
        file: PathBuf,

        /// Variable to plot
        #[arg(long)]
        variable: String,

        /// Output path prefix; the variable name is appended
        #[arg(long)]
        save_prefix: String,

        /// Longitude dimension name
        #[arg(long, default_value = "lon")]
        lon_dim: String,

        /// Latitude dimension name
        #[arg(long, default_value = "lat")]
        lat_dim: String,

        /// Time dimension name
        #[arg(long, default_value = "time")]
        time_dim: String,
    },

    /// Crop a grid to the cells a country mask keeps
    CountryCrop {
        /// Path to the NetCDF data file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the NetCDF mask file (variable `mask`, 1 = keep)
        #[arg(long)]
        mask: PathBuf,

        /// Output NetCDF path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Clip a grid to every region of a GeoJSON layer, stacked along a region dimension
    RegionsCrop {
        /// Path to the NetCDF data file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to the GeoJSON layer
        #[arg(long)]
        layer: PathBuf,

        /// Output NetCDF path
        #[arg(short, long)]
        output: PathBuf,

        /// Layer attribute holding each region's display name
        #[arg(long, default_value = "name")]
        name_column: String,
    },

    /// Merge one file per day over a date range into a time-stacked NetCDF
    Merge {
        /// Per-day filename prefix (directory plus stem)
        #[arg(long)]
        prefix: String,

        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// End of the range, exclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Per-day file type: nc or tif
        #[arg(long, default_value = "nc")]
        file_type: String,

        /// Variable name to read (nc) or to create (tif)
        #[arg(long)]
        variable: String,

        /// Units attribute for the merged variable
        #[arg(long)]
        units: String,

        /// Output NetCDF path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Average a variable over time at each municipality centroid
    MunicipalMean {
        /// Path to the GeoJSON municipality layer
        #[arg(long)]
        layer: PathBuf,

        /// Path to the NetCDF data file
        #[arg(short, long)]
        file: PathBuf,

        /// Variable to average
        #[arg(long)]
        variable: String,

        /// Layer attribute holding the region label
        #[arg(long, default_value = "region")]
        region_column: String,

        /// Layer attribute holding the municipality label
        #[arg(long, default_value = "municipality")]
        municipality_column: String,

        /// Units for the mean column label
        #[arg(long)]
        units: String,

        /// Write the table as CSV instead of printing it
        #[arg(long)]
        output_csv: Option<PathBuf>,
    },

    /// Rename YYYYDDD-stemmed files of a directory to YYYY-MM-DD
    RenameJulian {
        /// Directory to scan
        #[arg(short, long)]
        dir: PathBuf,
    },
}
