//! Diffractive beam-steering element.
//!
//! The element is a tiled grating of `num_rails` rails at `rail_pitch_um`
//! (tile size = pitch x rails) behind a prism. Driving it to diffraction
//! order `m` steers the beam to
//!
//! ```text
//! sin(prism_out) = |m| λ / (n · tile) − sin(prism_in)
//! sin(air_out)   = n · sin(prism_out)
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use scanmap_core::{round_to_i32, steering_order_options, Options, SteeringOrder, ValueError};

/// Physical description of the steering element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteeringParams {
    pub rail_pitch_um: f64,
    pub num_rails: u32,
    pub wavelength_um: f64,
    pub refractive_index: f64,
    pub prism_angle_in_deg: f64,
    /// Order slots addressable by the driver. Zero entries are unused slots.
    pub orders: Vec<i32>,
}

impl Default for SteeringParams {
    fn default() -> Self {
        let mut orders: Vec<i32> = (1..=33).collect();
        orders.resize(40, 0);
        Self {
            rail_pitch_um: 0.65,
            num_rails: 32,
            wavelength_um: 0.905,
            refractive_index: 1.5,
            prism_angle_in_deg: 30.0,
            orders,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SteeringError {
    #[error("steering parameter `{name}` must be finite and > 0, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("prism incidence angle must be finite")]
    InvalidPrismAngle,
    #[error("order domain has no non-zero orders")]
    NoUsableOrders,
}

/// Converts between diffraction orders and far-field steering angles.
#[derive(Clone, Debug)]
pub struct SteeringAssembly {
    params: SteeringParams,
    tile_size_um: f64,
    sin_prism_in: f64,
    domain: Options<i32>,
    nonzero_sorted: Vec<i32>,
}

impl SteeringAssembly {
    pub fn new(params: SteeringParams) -> Result<Self, SteeringError> {
        let positive = [
            ("rail_pitch_um", params.rail_pitch_um),
            ("num_rails", f64::from(params.num_rails)),
            ("wavelength_um", params.wavelength_um),
            ("refractive_index", params.refractive_index),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SteeringError::InvalidParameter { name, value });
            }
        }
        if !params.prism_angle_in_deg.is_finite() {
            return Err(SteeringError::InvalidPrismAngle);
        }

        let mut nonzero_sorted: Vec<i32> =
            params.orders.iter().copied().filter(|&m| m != 0).collect();
        nonzero_sorted.sort_unstable();
        nonzero_sorted.dedup();
        if nonzero_sorted.is_empty() {
            return Err(SteeringError::NoUsableOrders);
        }

        let tile_size_um = params.rail_pitch_um * f64::from(params.num_rails);
        let sin_prism_in = params.prism_angle_in_deg.to_radians().sin();
        let domain = steering_order_options(params.orders.clone());
        debug!(
            "steering element: tile {tile_size_um:.3} um, {} usable orders in {} slots",
            nonzero_sorted.len(),
            domain.len()
        );

        Ok(Self {
            params,
            tile_size_um,
            sin_prism_in,
            domain,
            nonzero_sorted,
        })
    }

    #[inline]
    pub fn params(&self) -> &SteeringParams {
        &self.params
    }

    /// Rail pitch times rail count.
    #[inline]
    pub fn tile_size_um(&self) -> f64 {
        self.tile_size_um
    }

    /// `λ / (n · tile)`: the grating term contributed by one order.
    #[inline]
    fn order_term(&self) -> f64 {
        self.params.wavelength_um / (self.params.refractive_index * self.tile_size_um)
    }

    /// Far-field angle in degrees produced by `order`.
    ///
    /// `None` for order 0 (no steering) and for orders whose grating
    /// equation has no real solution.
    pub fn order_to_angle(&self, order: i32) -> Option<f64> {
        if order == 0 {
            return None;
        }
        let n = self.params.refractive_index;
        let sin_prism_out = f64::from(order.unsigned_abs()) * self.order_term() - self.sin_prism_in;
        if !(-1.0..=1.0).contains(&sin_prism_out) {
            return None;
        }
        let sin_air_out = sin_prism_out.asin().sin() * n;
        if !(-1.0..=1.0).contains(&sin_air_out) {
            return None;
        }
        Some(sin_air_out.asin().to_degrees())
    }

    /// Nearest integer order for a far-field angle in degrees.
    ///
    /// Halfway cases round to the even order. The result is not clamped to
    /// the order domain; use [`SteeringAssembly::clamp_order`] for that.
    pub fn angle_to_order(&self, angle_deg: f64) -> Result<i32, ValueError> {
        let n = self.params.refractive_index;
        let prism_out = (angle_deg.to_radians().sin() / n).asin();
        let grating_term = prism_out.sin() + self.sin_prism_in;
        round_to_i32("steering_order", grating_term / self.order_term())
    }

    /// Ascending, duplicate-free, zero-free subset of the order domain.
    #[inline]
    pub fn nonzero_sorted_orders(&self) -> &[i32] {
        &self.nonzero_sorted
    }

    /// Smallest and largest usable order.
    pub fn order_bounds(&self) -> (i32, i32) {
        // `new` guarantees at least one usable order.
        let lo = self.nonzero_sorted[0];
        let hi = self.nonzero_sorted[self.nonzero_sorted.len() - 1];
        (lo, hi)
    }

    /// Clamp into `[min_nonzero_order, max_nonzero_order]`.
    #[inline]
    pub fn clamp_order(&self, order: i32) -> i32 {
        let (lo, hi) = self.order_bounds();
        order.clamp(lo, hi)
    }

    /// Full order domain, including padding slots.
    #[inline]
    pub fn order_domain(&self) -> &Options<i32> {
        &self.domain
    }

    /// Validate `order` against the domain; the field is its slot index.
    pub fn steering_order(&self, order: i32) -> Result<SteeringOrder, ValueError> {
        SteeringOrder::new(order, self.domain.clone())
    }

    /// `(order, angle_deg)` for every usable order.
    pub fn order_angle_table(&self) -> Vec<(i32, Option<f64>)> {
        self.nonzero_sorted
            .iter()
            .map(|&m| (m, self.order_to_angle(m)))
            .collect()
    }
}
