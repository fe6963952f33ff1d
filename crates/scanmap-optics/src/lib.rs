//! Optical models behind the scan-angle mapping.
//!
//! - [`PixelMapping`]: fisheye camera calibration -> viewing angle per pixel,
//!   plus the row/elevation table along the vertical centre line.
//! - [`SteeringAssembly`]: diffraction order <-> far-field steering angle.
//!
//! ## Quickstart
//!
//! ```
//! use scanmap_optics::{SteeringAssembly, SteeringParams};
//!
//! let steering = SteeringAssembly::new(SteeringParams::default())?;
//! let angle = steering.order_to_angle(12).expect("order 12 is physical");
//! assert_eq!(steering.angle_to_order(angle)?, 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod camera;
mod steering;
mod table;

pub use camera::{
    A2aSample, CameraError, CameraParams, FisheyeDistortion, Intrinsics, PixelMapping,
    Resolution, SphericalAngle,
};
pub use steering::{SteeringAssembly, SteeringError, SteeringParams};
pub use table::{load_table, read_table, TableIoError, TableRecord, TABLE_RECORD_BYTES};
