//! Validated hardware value fields for scanmap.
//!
//! Every hardware-facing parameter (steering order, sensor row, exposure,
//! laser current, ...) is a [`Bounded`] or [`Discrete`] value with an explicit
//! register encoding, so validation and field conversion cannot be skipped.
//!
//! ```
//! use scanmap_core::{FieldValue, IntegrationTime};
//!
//! let t = IntegrationTime::new(2.0)?;
//! assert_eq!(t.field(), 250);
//! assert_eq!(IntegrationTime::from_field(250)?, t);
//! # Ok::<(), scanmap_core::ValueError>(())
//! ```

mod error;
mod logger;
mod units;
mod value;

pub use error::ValueError;
pub use units::{
    arcsec_to_radians, radians_to_arcsec, steering_order_options, IntegrationTime, LaserCurrent,
    RoiRows, SensorRow, SteeringAngle, SteeringOrder, MAX_SENSOR_ROWS, SENSOR_COLS, SENSOR_ROWS,
    STEERING_ORDER,
};
pub use value::{
    quantize, round_to_i32, truncate_to_i32, Bounded, Discrete, FieldValue, Limits, Options,
    Scalar,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
