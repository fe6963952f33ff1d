//! Requested field of view -> (steering order, sensor start row) pairs.
//!
//! Steps for one request:
//! 1. angles only: nearest centre-line row per angle, minus half the
//!    reference ROI height,
//! 2. clamp rows into `[0, total_rows - roi_rows]`,
//! 3. A2A polynomial at each row -> steering angle -> nearest order,
//! 4. ROI height differs from the reference: shift rows by half the
//!    difference, re-clamp, drop pairs whose row left `[0, total - roi)`,
//! 5. clamp orders into the usable order range,
//! 6. optionally keep only the first pair for each order.
//!
//! Surviving pairs leave as [`SteeringOrder`] and [`SensorRow`] values
//! validated against this sensor head's order domain and row count.

use std::collections::HashSet;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use scanmap_core::{
    FieldValue, Limits, RoiRows, SensorRow, SteeringAngle, SteeringOrder, ValueError,
};
use scanmap_optics::{PixelMapping, SteeringAssembly};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// ROI height the A2A calibration was measured with.
pub const REFERENCE_ROI_ROWS: u32 = 20;

/// Errors returned by [`RoiMapping`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RoiError {
    #[error("A2A calibration coefficients are missing")]
    MissingCalibration,
    #[error("A2A coefficient {index} is not finite")]
    NonFiniteCalibration { index: usize },
    #[error("exactly one of `angles` or `rows` may be given, got both")]
    ConflictingSelection,
    #[error("exactly one of `angles` or `rows` must be given, got neither")]
    EmptySelection,
    #[error("ROI of {roi_rows} rows does not fit a sensor with {total_rows} rows")]
    RoiTooTall { roi_rows: u32, total_rows: u32 },
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Scan request: desired angles (degrees) or explicit start rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiRequest {
    #[serde(default)]
    pub angles: Option<Vec<f64>>,
    #[serde(default)]
    pub rows: Option<Vec<i32>>,
    #[serde(default)]
    pub roi_rows: RoiRows,
    #[serde(default)]
    pub trim_duplicates: bool,
}

impl RoiRequest {
    pub fn from_angles(angles: impl Into<Vec<f64>>) -> Self {
        Self {
            angles: Some(angles.into()),
            ..Self::default()
        }
    }

    pub fn from_rows(rows: impl Into<Vec<i32>>) -> Self {
        Self {
            rows: Some(rows.into()),
            ..Self::default()
        }
    }

    pub fn with_roi_rows(mut self, roi_rows: RoiRows) -> Self {
        self.roi_rows = roi_rows;
        self
    }

    pub fn with_trim_duplicates(mut self, trim: bool) -> Self {
        self.trim_duplicates = trim;
        self
    }
}

/// Paired orders and start rows.
///
/// `orders[i]` belongs to `rows[i]`. The dropped counters report how many
/// candidate pairs were removed and why.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoiSelection {
    pub orders: Vec<SteeringOrder>,
    pub rows: Vec<SensorRow>,
    /// Pairs whose shifted row left the sensor (step 4).
    pub dropped_out_of_bounds: usize,
    /// Pairs removed by duplicate-order trimming (step 6).
    pub dropped_duplicates: usize,
}

impl RoiSelection {
    #[inline]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// `(order, row)` pairs in output order.
    pub fn pairs(&self) -> impl Iterator<Item = (i32, u32)> + '_ {
        self.orders
            .iter()
            .zip(&self.rows)
            .map(|(order, row)| (order.value(), row.value()))
    }

    /// `(order slot, row register)` pairs, as a scan table addresses them.
    pub fn fields(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.orders
            .iter()
            .zip(&self.rows)
            .map(|(order, row)| (order.field(), row.field()))
    }

    pub fn order_values(&self) -> Vec<i32> {
        self.orders.iter().map(SteeringOrder::value).collect()
    }

    pub fn row_values(&self) -> Vec<u32> {
        self.rows.iter().map(SensorRow::value).collect()
    }
}

/// Calibration-driven mapping for one sensor head.
#[derive(Clone, Debug)]
pub struct RoiMapping {
    /// Row -> steering angle (degrees), ascending powers of row.
    a2a_coefficients: Vec<f64>,
    pixels: Arc<PixelMapping>,
    steering: Arc<SteeringAssembly>,
    row_limits: Limits<u32>,
    roi_limits: Limits<u32>,
}

impl RoiMapping {
    pub fn new(
        a2a_coefficients: Vec<f64>,
        pixels: Arc<PixelMapping>,
        steering: Arc<SteeringAssembly>,
    ) -> Result<Self, RoiError> {
        if a2a_coefficients.is_empty() {
            return Err(RoiError::MissingCalibration);
        }
        if let Some(index) = a2a_coefficients.iter().position(|c| !c.is_finite()) {
            return Err(RoiError::NonFiniteCalibration { index });
        }
        let row_limits = SensorRow::limits_for(pixels.rows())?;
        let roi_limits = RoiRows::limits_for(pixels.rows())?;
        Ok(Self {
            a2a_coefficients,
            pixels,
            steering,
            row_limits,
            roi_limits,
        })
    }

    #[inline]
    pub fn a2a_coefficients(&self) -> &[f64] {
        &self.a2a_coefficients
    }

    #[inline]
    pub fn pixel_mapping(&self) -> &PixelMapping {
        &self.pixels
    }

    #[inline]
    pub fn steering(&self) -> &SteeringAssembly {
        &self.steering
    }

    /// Start-row limits of this sensor.
    #[inline]
    pub fn row_limits(&self) -> Limits<u32> {
        self.row_limits
    }

    /// Steering angle (degrees) the A2A fit assigns to `row`.
    pub fn steering_angle_for_row(&self, row: f64) -> f64 {
        self.a2a_coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * row + c)
    }

    /// Reference-height start row whose centre best matches `angle_deg`.
    pub fn row_for_angle(&self, angle_deg: f64) -> i64 {
        let center = self.pixels.nearest_row_for_angle(angle_deg.to_radians());
        i64::from(center) - i64::from(REFERENCE_ROI_ROWS / 2)
    }

    /// Unclamped steering order for a start row.
    ///
    /// Fails when the A2A fit leaves the physical `[-90, 90]` degree range.
    pub fn order_for_row(&self, row: i64) -> Result<i32, ValueError> {
        let angle = SteeringAngle::new(self.steering_angle_for_row(row as f64))?;
        self.steering.angle_to_order(angle.degrees())
    }

    /// Map a request to paired orders and start rows.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, request), fields(roi_rows = request.roi_rows.value()))
    )]
    pub fn map(&self, request: &RoiRequest) -> Result<RoiSelection, RoiError> {
        let total_rows = self.pixels.rows();
        let roi_rows = RoiRows::within(request.roi_rows.value(), self.roi_limits)
            .map_err(|_| RoiError::RoiTooTall {
                roi_rows: request.roi_rows.value(),
                total_rows,
            })?
            .value();
        let max_row = i64::from(total_rows - roi_rows);

        let starts: Vec<i64> = match (&request.angles, &request.rows) {
            (Some(_), Some(_)) => return Err(RoiError::ConflictingSelection),
            (None, None) => return Err(RoiError::EmptySelection),
            (Some(angles), None) => angles.iter().map(|&a| self.row_for_angle(a)).collect(),
            (None, Some(rows)) => rows.iter().map(|&r| i64::from(r)).collect(),
        };
        let requested = starts.len();

        let mut rows: Vec<i64> = starts.into_iter().map(|r| r.clamp(0, max_row)).collect();
        let mut orders = rows
            .iter()
            .map(|&r| self.order_for_row(r))
            .collect::<Result<Vec<_>, _>>()?;

        let mut dropped_out_of_bounds = 0;
        if roi_rows != REFERENCE_ROI_ROWS {
            let shift = (i64::from(REFERENCE_ROI_ROWS) - i64::from(roi_rows)).div_euclid(2);
            let mut kept_rows = Vec::with_capacity(rows.len());
            let mut kept_orders = Vec::with_capacity(orders.len());
            for (row, order) in rows.into_iter().zip(orders) {
                let shifted = (row + shift).clamp(0, max_row);
                if (0..max_row).contains(&shifted) {
                    kept_rows.push(shifted);
                    kept_orders.push(order);
                } else {
                    dropped_out_of_bounds += 1;
                }
            }
            rows = kept_rows;
            orders = kept_orders;
        }

        for order in &mut orders {
            *order = self.steering.clamp_order(*order);
        }

        let mut dropped_duplicates = 0;
        if request.trim_duplicates {
            let mut seen = HashSet::with_capacity(orders.len());
            let mut kept_rows = Vec::with_capacity(rows.len());
            let mut kept_orders = Vec::with_capacity(orders.len());
            for (row, order) in rows.into_iter().zip(orders) {
                if seen.insert(order) {
                    kept_rows.push(row);
                    kept_orders.push(order);
                } else {
                    dropped_duplicates += 1;
                }
            }
            rows = kept_rows;
            orders = kept_orders;
        }

        debug!(
            "mapped {requested} entries to {} pairs ({dropped_out_of_bounds} out of bounds, {dropped_duplicates} duplicates)",
            orders.len()
        );

        let orders = orders
            .into_iter()
            .map(|order| self.steering.steering_order(order))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = rows
            .into_iter()
            .map(|row| self.sensor_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RoiSelection {
            orders,
            rows,
            dropped_out_of_bounds,
            dropped_duplicates,
        })
    }

    fn sensor_row(&self, row: i64) -> Result<SensorRow, ValueError> {
        let row = u32::try_from(row).map_err(|_| ValueError::FieldOverflow {
            name: self.row_limits.name,
            value: row as f64,
        })?;
        SensorRow::within(row, self.row_limits)
    }
}
