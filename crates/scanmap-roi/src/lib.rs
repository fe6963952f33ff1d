//! Scan-angle -> (steering order, sensor row) mapping.
//!
//! [`RoiMapping`] combines the camera's row/elevation table, the A2A
//! calibration polynomial and the steering element into the order/row
//! pairs a scan table is built from. [`ScanmapConfig`] loads the
//! calibration of one sensor head from JSON.
//!
//! ```no_run
//! use scanmap_roi::ScanmapConfig;
//!
//! let cfg = ScanmapConfig::load_json("scanmap_config.json")?;
//! let mapping = cfg.build_mapping()?;
//! let selection = mapping.map(&cfg.angle_request(vec![-10.0, 0.0, 10.0]))?;
//! for (order, row) in selection.pairs() {
//!     println!("order {order} -> row {row}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod io;
mod mapping;

pub use io::{RoiParams, RoiReport, ScanmapConfig, ScanmapConfigError, ScanmapIoError};
pub use mapping::{RoiError, RoiMapping, RoiRequest, RoiSelection, REFERENCE_ROI_ROWS};
