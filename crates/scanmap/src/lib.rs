//! High-level facade crate for the `scanmap-*` workspace.
//!
//! Turns the calibration of a solid-state scanning LiDAR head (fisheye
//! receive camera, diffractive steering element, A2A row/angle fit) into
//! the `(steering order, sensor start row)` pairs a scan table needs.
//!
//! ## Quickstart
//!
//! ```no_run
//! use scanmap::ScanmapConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ScanmapConfig::load_json("scanmap_config.json")?;
//! let mapping = cfg.build_mapping()?;
//! let selection = mapping.map(&cfg.row_request(vec![20, 40, 50]))?;
//! println!("orders: {:?}", selection.order_values());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `scanmap::core`: validated value fields and their register encodings.
//! - `scanmap::optics`: fisheye pixel mapping, steering element, pixel table export.
//! - `scanmap::roi`: ROI mapping, JSON config and reports.
//!
//! The `scanmap` binary (feature `cli`) wraps these for the calibration bench.

pub use scanmap_core as core;
pub use scanmap_optics as optics;
pub use scanmap_roi as roi;

pub use scanmap_core::{FieldValue, RoiRows, SensorRow, SteeringOrder, ValueError};
pub use scanmap_optics::{CameraParams, PixelMapping, SteeringAssembly, SteeringParams};
pub use scanmap_roi::{RoiMapping, RoiReport, RoiRequest, RoiSelection, ScanmapConfig};

/// Install the stderr logger for a `-v` count, or the tracing subscriber
/// when the `tracing` feature is on.
pub fn init_logging(verbosity: u8) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    {
        let _ = verbosity;
        let _ = tracing_log::LogTracer::init();
        scanmap_core::init_tracing(false);
    }

    #[cfg(not(feature = "tracing"))]
    scanmap_core::init_with_level(scanmap_core::level_from_verbosity(verbosity))?;

    log::debug!("logging at {:?}", log::max_level());
    Ok(())
}
