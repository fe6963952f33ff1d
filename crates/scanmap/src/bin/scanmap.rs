//! Calibration bench tool.
//!
//! Usage:
//!   scanmap roi -c scanmap_config.json --angles -10,0,10 -o report.json
//!   scanmap roi -c scanmap_config.json --rows 20,40,50 --roi-rows 10
//!   scanmap roi -c scanmap_config.json --angles 0,1,2 --no-trim-duplicates
//!   scanmap orders -c scanmap_config.json
//!   scanmap a2a -c scanmap_config.json --degrees
//!   scanmap export-table -c scanmap_config.json -o pixel_table.bin

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;

use scanmap::roi::{RoiReport, RoiRequest, ScanmapConfig};
use scanmap::RoiRows;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map scan angles or start rows to (steering order, start row) pairs
    Roi {
        /// Calibration config JSON
        #[arg(short, long)]
        config: PathBuf,

        /// Requested elevation angles in degrees, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        angles: Option<Vec<f64>>,

        /// Requested start rows, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        rows: Option<Vec<i32>>,

        /// ROI height in rows (defaults to the config value)
        #[arg(long)]
        roi_rows: Option<u32>,

        /// Keep only the first pair for each steering order
        #[arg(long, overrides_with = "no_trim_duplicates")]
        trim_duplicates: bool,

        /// Keep every pair even when the config enables trimming
        #[arg(long, overrides_with = "trim_duplicates")]
        no_trim_duplicates: bool,

        /// Report path (defaults to the config value)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the far-field angle of every usable steering order
    Orders {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the row/elevation table along the sensor centre column
    A2a {
        #[arg(short, long)]
        config: PathBuf,

        /// Print angles in degrees instead of radians
        #[arg(long)]
        degrees: bool,
    },
    /// Write the binary pixel-to-angle table
    ExportTable {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long, default_value = "pixel_table.bin")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    scanmap::init_logging(args.verbose)?;

    match args.command {
        Command::Roi {
            config,
            angles,
            rows,
            roi_rows,
            trim_duplicates,
            no_trim_duplicates,
            output,
        } => run_roi(
            &config,
            angles,
            rows,
            roi_rows,
            trim_override(trim_duplicates, no_trim_duplicates),
            output,
        ),
        Command::Orders { config } => run_orders(&config),
        Command::A2a { config, degrees } => run_a2a(&config, degrees),
        Command::ExportTable { config, output } => run_export_table(&config, &output),
    }
}

/// `None` leaves the config value in charge.
fn trim_override(trim: bool, no_trim: bool) -> Option<bool> {
    match (trim, no_trim) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn run_roi(
    config_path: &Path,
    angles: Option<Vec<f64>>,
    rows: Option<Vec<i32>>,
    roi_rows: Option<u32>,
    trim_duplicates: Option<bool>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ScanmapConfig::load_json(config_path)?;
    let mapping = cfg.build_mapping()?;

    let roi_rows = match roi_rows {
        Some(rows) => RoiRows::new(rows)?,
        None => cfg.roi.roi_rows,
    };
    let request = RoiRequest {
        angles,
        rows,
        roi_rows,
        trim_duplicates: trim_duplicates.unwrap_or(cfg.roi.trim_duplicates),
    };

    let output_path = output.unwrap_or_else(|| cfg.output_path());
    let mut report = RoiReport::new(config_path, request.clone());
    let result = mapping.map(&request);
    match &result {
        Ok(selection) => {
            for (order, row) in selection.pairs() {
                println!("{order}\t{row}");
            }
            report.set_selection(selection.clone());
        }
        Err(err) => report.set_error(err.clone()),
    }

    report.write_json(&output_path)?;
    info!("wrote report JSON to {}", output_path.display());

    result?;
    Ok(())
}

fn run_orders(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ScanmapConfig::load_json(config_path)?;
    let steering = cfg.build_steering()?;
    let table: Vec<_> = steering
        .order_angle_table()
        .into_iter()
        .map(|(order, angle_deg)| json!({ "order": order, "angle_deg": angle_deg }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

fn run_a2a(config_path: &Path, degrees: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ScanmapConfig::load_json(config_path)?;
    let pixels = cfg.build_pixel_mapping()?;
    let table: Vec<_> = pixels
        .generate_a2a_arrays()
        .iter()
        .map(|sample| {
            let angle = if degrees {
                sample.angle.to_degrees()
            } else {
                sample.angle
            };
            json!({ "row": sample.row, "angle": angle })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

fn run_export_table(config_path: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = ScanmapConfig::load_json(config_path)?;
    let pixels = cfg.build_pixel_mapping()?;
    let records = pixels.save_table(output)?;
    println!("wrote {records} records to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_flags_override_the_config_only_when_given() {
        assert_eq!(trim_override(false, false), None);
        assert_eq!(trim_override(true, false), Some(true));
        assert_eq!(trim_override(false, true), Some(false));
    }

    #[test]
    fn last_trim_flag_wins() {
        let args = Args::parse_from([
            "scanmap",
            "roi",
            "-c",
            "cfg.json",
            "--trim-duplicates",
            "--no-trim-duplicates",
        ]);
        let Command::Roi {
            trim_duplicates,
            no_trim_duplicates,
            ..
        } = args.command
        else {
            panic!("expected roi command");
        };
        assert_eq!(trim_override(trim_duplicates, no_trim_duplicates), Some(false));
    }
}
