//! Pixel to viewing-angle mapping for a pinhole camera with fisheye distortion.
//!
//! Pipeline for one pixel `(u, v)`:
//! 1. inverse pinhole: `pw = ((u - cx) / fx, (v - cy) / fy)`,
//! 2. `theta_d = |pw|`, clamped to `[-pi/2, pi/2]`,
//! 3. Newton-Raphson on `theta_d = theta (1 + k1 θ² + k2 θ⁴ + k3 θ⁶ + k4 θ⁸)`,
//! 4. undistorted point `pw * tan(theta) / theta_d`,
//! 5. spherical angles of the ray `(1, -x, y)`.
//!
//! The full per-pixel table is computed once in [`PixelMapping::new`], so a
//! mapping can be shared read-only across threads.

use std::f64::consts::FRAC_PI_2;

use log::debug;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

use scanmap_core::{SENSOR_COLS, SENSOR_ROWS};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Newton iterations per pixel.
const MAX_NEWTON_ITERS: usize = 10;
/// Convergence threshold on the Newton step, and the "negligible" `theta_d`.
const NEWTON_EPS: f64 = 1e-9;
/// Output for pixels whose solution flipped sign during the iteration.
///
/// Existing calibration artifacts were produced with this value; downstream
/// masks exclude those far-field pixels.
const FLIPPED_SENTINEL: f64 = -1.0;

/// Pinhole intrinsics in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

/// Radial fisheye coefficients of the equidistant model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FisheyeDistortion {
    pub k1: f64,
    pub k2: f64,
    #[serde(default)]
    pub k3: f64,
    #[serde(default)]
    pub k4: f64,
}

impl FisheyeDistortion {
    #[inline]
    fn coefficients(&self) -> [f64; 4] {
        [self.k1, self.k2, self.k3, self.k4]
    }
}

/// Sensor resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub rows: u32,
    pub cols: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            rows: SENSOR_ROWS,
            cols: SENSOR_COLS,
        }
    }
}

/// Camera calibration consumed by [`PixelMapping`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    pub intrinsics: Intrinsics,
    #[serde(default)]
    pub distortion: FisheyeDistortion,
    #[serde(default)]
    pub resolution: Resolution,
}

/// Camera calibration validation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("resolution must be at least 1x1, got {rows}x{cols}")]
    InvalidResolution { rows: u32, cols: u32 },
    #[error("focal lengths must be finite and non-zero (fx={fx}, fy={fy})")]
    InvalidFocalLength { fx: f64, fy: f64 },
    #[error("camera parameter `{name}` is not finite")]
    NotFinite { name: &'static str },
}

/// Viewing direction of a pixel in spherical coordinates (radians).
///
/// `theta` is the polar angle from the sensor's vertical axis, so a pixel
/// looking straight ahead has `theta = pi/2`; `phi` is the azimuth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphericalAngle {
    pub theta: f64,
    pub phi: f64,
}

/// One entry of the row/angle table along the vertical centre line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct A2aSample {
    pub row: u32,
    /// Elevation in radians, `theta - pi/2`.
    pub angle: f64,
}

/// Per-pixel viewing angles for a calibrated camera.
#[derive(Clone, Debug)]
pub struct PixelMapping {
    params: CameraParams,
    /// `(u, v)` addresses in raster order.
    pixels: Vec<[u32; 2]>,
    angles: Vec<SphericalAngle>,
    a2a: Vec<A2aSample>,
}

impl PixelMapping {
    /// Validate the calibration and build the mapping tables.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(params), fields(rows = params.resolution.rows, cols = params.resolution.cols))
    )]
    pub fn new(params: CameraParams) -> Result<Self, CameraError> {
        validate(&params)?;

        let Resolution { rows, cols } = params.resolution;
        let count = rows as usize * cols as usize;
        let mut pixels = Vec::with_capacity(count);
        let mut angles = Vec::with_capacity(count);
        let mut flipped = 0usize;

        for v in 0..rows {
            for u in 0..cols {
                let p = undistort(&params, u as f64, v as f64);
                if p.x == FLIPPED_SENTINEL && p.y == FLIPPED_SENTINEL {
                    flipped += 1;
                }
                pixels.push([u, v]);
                angles.push(to_spherical(p));
            }
        }

        let center_col = (cols / 2) as usize;
        let a2a = (0..rows)
            .map(|row| A2aSample {
                row,
                angle: angles[row as usize * cols as usize + center_col].theta - FRAC_PI_2,
            })
            .collect();

        debug!("pixel mapping built for {rows}x{cols} sensor, {flipped} flipped pixels");

        Ok(Self {
            params,
            pixels,
            angles,
            a2a,
        })
    }

    #[inline]
    pub fn params(&self) -> &CameraParams {
        &self.params
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.params.resolution.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.params.resolution.cols
    }

    /// Undistorted normalized coordinates of pixel `(u, v)`.
    ///
    /// Returns `(0, 0)` at the principal point and `(-1, -1)` where the
    /// Newton solution changed sign.
    pub fn undistort_normalized(&self, u: f64, v: f64) -> Vector2<f64> {
        undistort(&self.params, u, v)
    }

    /// Pixel addresses and their viewing angles, both in raster order.
    pub fn generate_mapping_arrays(&self) -> (&[[u32; 2]], &[SphericalAngle]) {
        (&self.pixels, &self.angles)
    }

    /// Row/elevation pairs sampled at column `cols / 2`.
    pub fn generate_a2a_arrays(&self) -> &[A2aSample] {
        &self.a2a
    }

    /// Viewing angle of pixel `(u, v)`, if it lies on the sensor.
    pub fn angle_at(&self, u: u32, v: u32) -> Option<SphericalAngle> {
        if u >= self.cols() || v >= self.rows() {
            return None;
        }
        self.angles
            .get(v as usize * self.cols() as usize + u as usize)
            .copied()
    }

    /// Row whose centre-line elevation is closest to `angle` (radians).
    ///
    /// Ties resolve to the lower row.
    pub fn nearest_row_for_angle(&self, angle: f64) -> u32 {
        self.a2a
            .iter()
            .min_by(|a, b| {
                (a.angle - angle)
                    .abs()
                    .total_cmp(&(b.angle - angle).abs())
            })
            .map(|s| s.row)
            .unwrap_or(0)
    }
}

fn validate(params: &CameraParams) -> Result<(), CameraError> {
    let Resolution { rows, cols } = params.resolution;
    if rows == 0 || cols == 0 {
        return Err(CameraError::InvalidResolution { rows, cols });
    }
    let Intrinsics { fx, fy, cx, cy } = params.intrinsics;
    if !fx.is_finite() || !fy.is_finite() || fx == 0.0 || fy == 0.0 {
        return Err(CameraError::InvalidFocalLength { fx, fy });
    }
    if !cx.is_finite() {
        return Err(CameraError::NotFinite { name: "cx" });
    }
    if !cy.is_finite() {
        return Err(CameraError::NotFinite { name: "cy" });
    }
    let names = ["k1", "k2", "k3", "k4"];
    for (name, k) in names.into_iter().zip(params.distortion.coefficients()) {
        if !k.is_finite() {
            return Err(CameraError::NotFinite { name });
        }
    }
    Ok(())
}

fn undistort(params: &CameraParams, u: f64, v: f64) -> Vector2<f64> {
    let Intrinsics { fx, fy, cx, cy } = params.intrinsics;
    let pw = Vector2::new((u - cx) / fx, (v - cy) / fy);
    let theta_d = pw.norm().clamp(-FRAC_PI_2, FRAC_PI_2);

    if theta_d <= NEWTON_EPS {
        return Vector2::zeros();
    }

    let theta = solve_theta(theta_d, &params.distortion);
    let flipped = (theta_d < 0.0 && theta > 0.0) || (theta_d > 0.0 && theta < 0.0);
    if flipped {
        return Vector2::new(FLIPPED_SENTINEL, FLIPPED_SENTINEL);
    }

    pw * (theta.tan() / theta_d)
}

/// Invert the fisheye polynomial for one `theta_d`.
fn solve_theta(theta_d: f64, distortion: &FisheyeDistortion) -> f64 {
    let [k1, k2, k3, k4] = distortion.coefficients();
    let mut theta = theta_d;
    for _ in 0..MAX_NEWTON_ITERS {
        let t2 = theta * theta;
        let t4 = t2 * t2;
        let t6 = t4 * t2;
        let t8 = t6 * t2;
        let f = theta * (1.0 + k1 * t2 + k2 * t4 + k3 * t6 + k4 * t8) - theta_d;
        let df = 1.0 + 3.0 * k1 * t2 + 5.0 * k2 * t4 + 7.0 * k3 * t6 + 9.0 * k4 * t8;
        let step = f / df;
        theta -= step;
        if step.abs() < NEWTON_EPS {
            break;
        }
    }
    theta
}

/// Spherical angles of the ray through an undistorted normalized point.
fn to_spherical(p: Vector2<f64>) -> SphericalAngle {
    let ray = Vector3::new(1.0, -p.x, p.y);
    let r = ray.norm();
    SphericalAngle {
        theta: (ray.z / r).acos(),
        phi: ray.y.atan2(ray.x),
    }
}
