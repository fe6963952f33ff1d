//! Concrete hardware quantities.
//!
//! Each type owns its limits and its own physical <-> register conversion.
//! Serialization uses the physical value; deserialization re-validates it.

use serde::{Deserialize, Serialize};

use crate::value::{truncate_to_i32, Bounded, Discrete, FieldValue, Limits, Options};
use crate::ValueError;

/// Rows on the default image sensor.
pub const SENSOR_ROWS: u32 = 480;
/// Columns on the default image sensor.
pub const SENSOR_COLS: u32 = 640;
/// Largest row count the 16-bit row registers can address.
pub const MAX_SENSOR_ROWS: u32 = u16::MAX as u32;

const ARCSEC_PER_DEGREE: f64 = 3600.0;
/// Sensor timing clock period.
const INTEGRATION_TICK_US: f64 = 0.008;
/// Laser driver DAC full scale (12 bit).
const LASER_DAC_MAX: u16 = 0x0FFF;

/// Start row of a readout window.
///
/// [`SensorRow::new`] only checks the register range. Rows produced for a
/// concrete sensor are checked against [`SensorRow::limits_for`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SensorRow(Bounded<u32>);

impl SensorRow {
    pub const LIMITS: Limits<u32> = Limits::new("sensor_row", 0, MAX_SENSOR_ROWS - 1, 0);

    pub fn new(row: u32) -> Result<Self, ValueError> {
        Self::within(row, Self::LIMITS)
    }

    /// Validate `row` against sensor-specific `limits`.
    pub fn within(row: u32, limits: Limits<u32>) -> Result<Self, ValueError> {
        Bounded::new(row, limits).map(Self)
    }

    /// Row limits `[0, total_rows - 1]` of a sensor with `total_rows` rows.
    pub fn limits_for(total_rows: u32) -> Result<Limits<u32>, ValueError> {
        let rows = RoiRows::new(total_rows)?;
        Ok(Limits::new(Self::LIMITS.name, 0, rows.value() - 1, 0))
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.0.value()
    }

    #[inline]
    pub fn limits(&self) -> &Limits<u32> {
        self.0.limits()
    }
}

impl FieldValue for SensorRow {
    type Field = u16;

    fn field(&self) -> u16 {
        // Every limit set stays inside the register range.
        self.value() as u16
    }

    fn from_field(field: u16) -> Result<Self, ValueError> {
        Self::new(u32::from(field))
    }
}

impl TryFrom<u32> for SensorRow {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SensorRow> for u32 {
    fn from(row: SensorRow) -> Self {
        row.value()
    }
}

/// Height of a readout window in rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RoiRows(Bounded<u32>);

impl RoiRows {
    pub const LIMITS: Limits<u32> = Limits::new("roi_rows", 1, MAX_SENSOR_ROWS, 0);

    pub fn new(rows: u32) -> Result<Self, ValueError> {
        Self::within(rows, Self::LIMITS)
    }

    pub fn within(rows: u32, limits: Limits<u32>) -> Result<Self, ValueError> {
        Bounded::new(rows, limits).map(Self)
    }

    /// Height limits `[1, total_rows]` of a sensor with `total_rows` rows.
    pub fn limits_for(total_rows: u32) -> Result<Limits<u32>, ValueError> {
        let rows = Self::new(total_rows)?;
        Ok(Limits::new(Self::LIMITS.name, 1, rows.value(), 0))
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.0.value()
    }
}

impl Default for RoiRows {
    fn default() -> Self {
        Self(Bounded::new(20, Self::LIMITS).expect("20 rows is within limits"))
    }
}

impl FieldValue for RoiRows {
    type Field = u16;

    fn field(&self) -> u16 {
        self.value() as u16
    }

    fn from_field(field: u16) -> Result<Self, ValueError> {
        Self::new(u32::from(field))
    }
}

impl TryFrom<u32> for RoiRows {
    type Error = ValueError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoiRows> for u32 {
    fn from(rows: RoiRows) -> Self {
        rows.value()
    }
}

/// Far-field steering angle in degrees, encoded as whole arc-seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SteeringAngle(Bounded<f64>);

impl SteeringAngle {
    pub const LIMITS: Limits<f64> =
        Limits::new("steering_angle_deg", -90.0, 90.0, 1.0 / ARCSEC_PER_DEGREE);

    pub fn new(degrees: f64) -> Result<Self, ValueError> {
        Bounded::new(degrees, Self::LIMITS).map(Self)
    }

    #[inline]
    pub fn degrees(&self) -> f64 {
        self.0.value()
    }

    #[inline]
    pub fn radians(&self) -> f64 {
        self.degrees().to_radians()
    }
}

impl FieldValue for SteeringAngle {
    type Field = i32;

    fn field(&self) -> i32 {
        // |deg| <= 90 keeps the product far inside i32.
        (self.degrees() * ARCSEC_PER_DEGREE).trunc() as i32
    }

    fn from_field(field: i32) -> Result<Self, ValueError> {
        Self::new(f64::from(field) / ARCSEC_PER_DEGREE)
    }
}

impl TryFrom<f64> for SteeringAngle {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SteeringAngle> for f64 {
    fn from(angle: SteeringAngle) -> Self {
        angle.degrees()
    }
}

/// Convert radians to whole arc-seconds, truncated toward zero.
pub fn radians_to_arcsec(name: &'static str, radians: f64) -> Result<i32, ValueError> {
    truncate_to_i32(name, radians.to_degrees() * ARCSEC_PER_DEGREE)
}

/// Inverse of [`radians_to_arcsec`] up to the truncation.
#[inline]
pub fn arcsec_to_radians(arcsec: i32) -> f64 {
    (f64::from(arcsec) / ARCSEC_PER_DEGREE).to_radians()
}

/// Sensor integration (exposure) time in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct IntegrationTime(Bounded<f64>);

impl IntegrationTime {
    pub const LIMITS: Limits<f64> =
        Limits::new("integration_time_us", 0.1, 20.0, INTEGRATION_TICK_US);

    pub fn new(micros: f64) -> Result<Self, ValueError> {
        Bounded::new(micros, Self::LIMITS).map(Self)
    }

    #[inline]
    pub fn micros(&self) -> f64 {
        self.0.value()
    }
}

impl FieldValue for IntegrationTime {
    /// Clock ticks.
    type Field = u32;

    fn field(&self) -> u32 {
        // Limits keep the tick count within 13..=2500.
        (self.micros() / INTEGRATION_TICK_US).round() as u32
    }

    fn from_field(field: u32) -> Result<Self, ValueError> {
        Self::new(f64::from(field) * INTEGRATION_TICK_US)
    }
}

impl TryFrom<f64> for IntegrationTime {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntegrationTime> for f64 {
    fn from(t: IntegrationTime) -> Self {
        t.micros()
    }
}

/// Laser drive current as a percentage of full scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct LaserCurrent(Bounded<f64>);

impl LaserCurrent {
    pub const LIMITS: Limits<f64> = Limits::new(
        "laser_current_pct",
        0.0,
        100.0,
        100.0 / LASER_DAC_MAX as f64,
    );

    pub fn new(percent: f64) -> Result<Self, ValueError> {
        Bounded::new(percent, Self::LIMITS).map(Self)
    }

    #[inline]
    pub fn percent(&self) -> f64 {
        self.0.value()
    }
}

impl FieldValue for LaserCurrent {
    /// DAC code.
    type Field = u16;

    fn field(&self) -> u16 {
        let code = (self.percent() / 100.0 * f64::from(LASER_DAC_MAX)).round();
        code.clamp(0.0, f64::from(LASER_DAC_MAX)) as u16
    }

    fn from_field(field: u16) -> Result<Self, ValueError> {
        Self::new(f64::from(field) * 100.0 / f64::from(LASER_DAC_MAX))
    }
}

impl TryFrom<f64> for LaserCurrent {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LaserCurrent> for f64 {
    fn from(current: LaserCurrent) -> Self {
        current.percent()
    }
}

/// Name used for steering-order option lists.
pub const STEERING_ORDER: &str = "steering_order";

/// Diffraction order of the steering element, drawn from its order domain.
///
/// The field is the slot index in the domain, which is what the scan table
/// addresses.
pub type SteeringOrder = Discrete<i32>;

/// Build the option list for a steering element's order domain.
pub fn steering_order_options(domain: impl Into<std::sync::Arc<[i32]>>) -> Options<i32> {
    Options::new(STEERING_ORDER, domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sensor_row_limits_follow_sensor_height() {
        let vga = SensorRow::limits_for(SENSOR_ROWS).expect("limits");
        assert!(SensorRow::within(0, vga).is_ok());
        assert!(SensorRow::within(SENSOR_ROWS - 1, vga).is_ok());
        assert!(matches!(
            SensorRow::within(SENSOR_ROWS, vga),
            Err(ValueError::OutOfBounds { name: "sensor_row", .. })
        ));

        let tall = SensorRow::limits_for(960).expect("limits");
        let row = SensorRow::within(900, tall).expect("row");
        assert_eq!(row.field(), 900);
        assert_eq!(row.limits().high, 959);

        let row = SensorRow::from_field(123).expect("row");
        assert_eq!(row.field(), 123);
    }

    #[test]
    fn sensor_limits_reject_unaddressable_heights() {
        assert!(SensorRow::limits_for(0).is_err());
        assert!(SensorRow::limits_for(MAX_SENSOR_ROWS + 1).is_err());
        assert!(SensorRow::new(MAX_SENSOR_ROWS - 1).is_ok());
        assert!(SensorRow::new(MAX_SENSOR_ROWS).is_err());
        let row = SensorRow::new(MAX_SENSOR_ROWS - 1).expect("row");
        assert_eq!(row.field(), u16::MAX - 1);
    }

    #[test]
    fn roi_rows_reject_zero_height() {
        assert!(RoiRows::new(0).is_err());
        assert_eq!(RoiRows::default().value(), 20);
    }

    #[test]
    fn roi_height_is_bounded_by_the_sensor() {
        assert_eq!(RoiRows::new(600).map(|r| r.value()), Ok(600));
        let vga = RoiRows::limits_for(SENSOR_ROWS).expect("limits");
        assert!(RoiRows::within(SENSOR_ROWS, vga).is_ok());
        assert!(RoiRows::within(600, vga).is_err());
        let tall = RoiRows::limits_for(960).expect("limits");
        assert!(RoiRows::within(600, tall).is_ok());
    }

    #[test]
    fn steering_angle_field_is_truncated_arcsec() {
        let a = SteeringAngle::new(1.5).expect("angle");
        assert_eq!(a.field(), 5400);
        let b = SteeringAngle::new(-0.00042).expect("angle");
        assert_eq!(b.field(), -1);
        let back = SteeringAngle::from_field(a.field()).expect("angle");
        assert_eq!(back, a);
    }

    #[test]
    fn integration_time_round_trips_within_one_tick() {
        for us in [0.1, 1.0, 3.333, 19.99] {
            let t = IntegrationTime::new(us).expect("time");
            let back = IntegrationTime::from_field(t.field()).expect("field");
            assert_eq!(back, t, "{us} us");
        }
        assert!(IntegrationTime::new(25.0).is_err());
    }

    #[test]
    fn laser_current_field_is_monotonic() {
        let mut last = 0;
        for pct in [0.0, 12.5, 50.0, 75.0, 100.0] {
            let code = LaserCurrent::new(pct).expect("pct").field();
            assert!(code >= last);
            last = code;
        }
        assert_eq!(last, LASER_DAC_MAX);
        let back = LaserCurrent::from_field(2048).expect("code");
        assert_abs_diff_eq!(back.percent(), 50.012, epsilon = 1e-3);
    }

    #[test]
    fn arcsec_conversion_truncates_toward_zero() {
        // 0.01 rad = 2062.648 arcsec
        assert_eq!(radians_to_arcsec("t", 0.01), Ok(2062));
        assert_eq!(radians_to_arcsec("t", -0.01), Ok(-2062));
        assert_abs_diff_eq!(
            arcsec_to_radians(3600),
            1.0_f64.to_radians(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn serde_revalidates_physical_values() {
        let rows: RoiRows = serde_json::from_str("40").expect("rows");
        assert_eq!(rows.value(), 40);
        assert!(serde_json::from_str::<RoiRows>("0").is_err());
        let json = serde_json::to_string(&LaserCurrent::new(42.0).expect("pct")).expect("json");
        assert_eq!(json, "42.0");
    }

    #[test]
    fn steering_order_field_indexes_domain() {
        let options = steering_order_options(vec![0, 1, 2, 3, 0]);
        let order = SteeringOrder::new(3, options).expect("order");
        assert_eq!(order.field(), 3);
        assert_eq!(order.value(), 3);
    }
}
