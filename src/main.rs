//! Entry point for the climaprep application.
//! Handles CLI parsing, logging setup, and dispatches the dataset operations.

use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use climaprep::cli::{Args, Command};
use climaprep::municipal;
use climaprep::parallel::ParallelConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    ParallelConfig::new(args.threads).setup_global_pool()?;

    match args.command {
        Command::Plot {
            file,
            variable,
            save_prefix,
            lon_dim,
            lat_dim,
            time_dim,
        } => {
            let output = climaprep::plot_time_series(
                &file,
                &variable,
                &save_prefix,
                &lon_dim,
                &lat_dim,
                &time_dim,
            )?;
            println!("Saved figure to {}", output.display());
        }

        Command::CountryCrop { file, mask, output } => {
            climaprep::country_crop(&file, &mask, &output)?;
            println!("Saved cropped dataset to {}", output.display());
        }

        Command::RegionsCrop {
            file,
            layer,
            output,
            name_column,
        } => {
            let output = climaprep::regions_crop(&file, &layer, &output, &name_column)?;
            println!("Saved region-stacked dataset to {}", output.display());
        }

        Command::Merge {
            prefix,
            start,
            end,
            file_type,
            variable,
            units,
            output,
        } => {
            let output =
                climaprep::merge_files(&prefix, start, end, &file_type, &variable, &units, &output)?;
            println!("Saved merged dataset to {}", output.display());
        }

        Command::MunicipalMean {
            layer,
            file,
            variable,
            region_column,
            municipality_column,
            units,
            output_csv,
        } => {
            let rows = municipal::municipality_daily_mean(
                &layer,
                &file,
                &variable,
                &region_column,
                &municipality_column,
                &units,
            )?;
            match output_csv {
                Some(path) => {
                    municipal::write_csv(&rows, &path)?;
                    println!("Saved municipality table to {}", path.display());
                }
                None => {
                    if let Some(first) = rows.first() {
                        println!("region,municipality,{}", first.value_label);
                    }
                    for row in &rows {
                        println!("{},{},{}", row.region, row.municipality, row.mean);
                    }
                }
            }
        }

        Command::RenameJulian { dir } => {
            let names = climaprep::translate_julian_dates(&dir)?;
            for name in names {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
