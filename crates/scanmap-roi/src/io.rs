//! JSON calibration config and mapping report helpers.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use scanmap_core::RoiRows;
use scanmap_optics::{CameraError, CameraParams, PixelMapping, SteeringAssembly, SteeringError, SteeringParams};

use crate::mapping::{RoiError, RoiMapping, RoiRequest, RoiSelection};

#[derive(thiserror::Error, Debug)]
pub enum ScanmapIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ScanmapConfigError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Steering(#[from] SteeringError),
    #[error(transparent)]
    Roi(#[from] RoiError),
}

/// Request defaults applied when a request does not override them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiParams {
    #[serde(default)]
    pub roi_rows: RoiRows,
    #[serde(default)]
    pub trim_duplicates: bool,
}

/// Calibration of one sensor head, as exported by the calibration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanmapConfig {
    pub camera: CameraParams,
    #[serde(default)]
    pub steering: SteeringParams,
    /// A2A fit: row -> steering angle in degrees, ascending powers of row.
    #[serde(default)]
    pub a2a: Vec<f64>,
    #[serde(default)]
    pub roi: RoiParams,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl ScanmapConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScanmapIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScanmapIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("scanmap_roi_report.json"))
    }

    pub fn build_pixel_mapping(&self) -> Result<PixelMapping, ScanmapConfigError> {
        Ok(PixelMapping::new(self.camera)?)
    }

    pub fn build_steering(&self) -> Result<SteeringAssembly, ScanmapConfigError> {
        Ok(SteeringAssembly::new(self.steering.clone())?)
    }

    /// Build the full mapping from this config.
    pub fn build_mapping(&self) -> Result<RoiMapping, ScanmapConfigError> {
        let pixels = Arc::new(self.build_pixel_mapping()?);
        let steering = Arc::new(self.build_steering()?);
        Ok(RoiMapping::new(self.a2a.clone(), pixels, steering)?)
    }

    /// Request for `angles` using the configured ROI defaults.
    pub fn angle_request(&self, angles: Vec<f64>) -> RoiRequest {
        self.apply_defaults(RoiRequest::from_angles(angles))
    }

    /// Request for start `rows` using the configured ROI defaults.
    pub fn row_request(&self, rows: Vec<i32>) -> RoiRequest {
        self.apply_defaults(RoiRequest::from_rows(rows))
    }

    fn apply_defaults(&self, request: RoiRequest) -> RoiRequest {
        request
            .with_roi_rows(self.roi.roi_rows)
            .with_trim_duplicates(self.roi.trim_duplicates)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiReport {
    pub config_path: String,
    pub request: RoiRequest,
    #[serde(default)]
    pub orders: Vec<i32>,
    #[serde(default)]
    pub rows: Vec<u32>,
    /// Order-domain slot of each entry in `orders`.
    #[serde(default)]
    pub order_slots: Vec<usize>,
    #[serde(default)]
    pub dropped_out_of_bounds: usize,
    #[serde(default)]
    pub dropped_duplicates: usize,
    #[serde(default)]
    pub error: Option<String>,
}

impl RoiReport {
    /// Build an empty report for `request`.
    pub fn new(config_path: &Path, request: RoiRequest) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            request,
            orders: Vec::new(),
            rows: Vec::new(),
            order_slots: Vec::new(),
            dropped_out_of_bounds: 0,
            dropped_duplicates: 0,
            error: None,
        }
    }

    /// Populate report fields from a successful mapping.
    pub fn set_selection(&mut self, selection: RoiSelection) {
        self.orders = selection.order_values();
        self.rows = selection.row_values();
        self.order_slots = selection.orders.iter().map(|o| o.field()).collect();
        self.dropped_out_of_bounds = selection.dropped_out_of_bounds;
        self.dropped_duplicates = selection.dropped_duplicates;
        self.error = None;
    }

    /// Record a mapping error.
    pub fn set_error(&mut self, err: RoiError) {
        self.error = Some(err.to_string());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScanmapIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScanmapIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
