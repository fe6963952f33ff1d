//! Validated value wrappers.
//!
//! Every hardware-facing quantity is expressed either as a [`Bounded`] value
//! (a scalar in a closed interval with a comparison tolerance) or as a
//! [`Discrete`] value (one entry of a fixed, ordered option list). Both are
//! only obtainable through fallible constructors, so a value that reaches a
//! register encoder has already been checked.

use std::fmt;
use std::sync::Arc;

use crate::ValueError;

/// Scalar types that can live inside a [`Bounded`] value.
pub trait Scalar: Copy + PartialOrd + fmt::Debug + fmt::Display {
    fn to_f64(self) -> f64;

    /// `false` for NaN and infinities; integers are always finite.
    fn is_finite_value(self) -> bool {
        true
    }
}

macro_rules! impl_int_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }

        impl PartialEq<$t> for Bounded<$t> {
            /// Comparison against a bare number is exact.
            fn eq(&self, other: &$t) -> bool {
                self.value == *other
            }
        }
    )*};
}

macro_rules! impl_float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn is_finite_value(self) -> bool {
                self.is_finite()
            }
        }

        impl PartialEq<$t> for Bounded<$t> {
            /// Comparison against a bare number is exact.
            fn eq(&self, other: &$t) -> bool {
                self.value == *other
            }
        }
    )*};
}

impl_int_scalar!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_float_scalar!(f32, f64);

/// Closed interval `[low, high]` plus the tolerance used for equality.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits<T> {
    /// Quantity name used in error messages.
    pub name: &'static str,
    pub low: T,
    pub high: T,
    pub tolerance: T,
}

impl<T: Scalar> Limits<T> {
    pub const fn new(name: &'static str, low: T, high: T, tolerance: T) -> Self {
        Self {
            name,
            low,
            high,
            tolerance,
        }
    }

    #[inline]
    pub fn contains(&self, value: T) -> bool {
        value >= self.low && value <= self.high
    }

    /// Build the error reported for `value`.
    fn out_of_bounds(&self, value: T) -> ValueError {
        ValueError::OutOfBounds {
            name: self.name,
            value: value.to_f64(),
            low: self.low.to_f64(),
            high: self.high.to_f64(),
        }
    }
}

/// A scalar constrained to `[low, high]`.
///
/// Two instances are equal when their values differ by at most the
/// tolerance of the left-hand side. This absorbs fixed-point quantization,
/// so `from_field(to_field(v)) == v` holds for the concrete types even
/// though the raw floats differ. Comparison against a bare number is exact.
///
/// Tolerance equality is not transitive, which is why `Eq` is not
/// implemented.
#[derive(Clone, Copy, Debug)]
pub struct Bounded<T: Scalar> {
    value: T,
    limits: Limits<T>,
}

impl<T: Scalar> Bounded<T> {
    /// Validate `value` against `limits`.
    pub fn new(value: T, limits: Limits<T>) -> Result<Self, ValueError> {
        if !value.is_finite_value() {
            return Err(ValueError::NotFinite {
                name: limits.name,
                value: value.to_f64(),
            });
        }
        if !limits.contains(value) {
            return Err(limits.out_of_bounds(value));
        }
        Ok(Self { value, limits })
    }

    #[inline]
    pub fn value(&self) -> T {
        self.value
    }

    #[inline]
    pub fn limits(&self) -> &Limits<T> {
        &self.limits
    }
}

impl<T: Scalar> PartialEq for Bounded<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.value.to_f64() - other.value.to_f64()).abs() <= self.limits.tolerance.to_f64()
    }
}

impl<T: Scalar> fmt::Display for Bounded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Ordered option list shared by every [`Discrete`] value drawn from it.
///
/// The list may contain duplicates; the field of a value is the index of its
/// first occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct Options<T> {
    pub name: &'static str,
    values: Arc<[T]>,
}

impl<T: Copy + PartialEq + fmt::Debug> Options<T> {
    pub fn new(name: &'static str, values: impl Into<Arc<[T]>>) -> Self {
        Self {
            name,
            values: values.into(),
        }
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn position(&self, value: T) -> Option<usize> {
        self.values.iter().position(|&v| v == value)
    }
}

/// A value restricted to a fixed option list.
#[derive(Clone, Debug)]
pub struct Discrete<T> {
    index: usize,
    options: Options<T>,
}

impl<T: Copy + PartialEq + fmt::Debug> Discrete<T> {
    pub fn new(value: T, options: Options<T>) -> Result<Self, ValueError> {
        let index = options
            .position(value)
            .ok_or_else(|| ValueError::NotAnOption {
                name: options.name,
                value: format!("{value:?}"),
            })?;
        Ok(Self { index, options })
    }

    /// Inverse of [`Discrete::field`].
    pub fn from_field(field: usize, options: Options<T>) -> Result<Self, ValueError> {
        if field >= options.len() {
            return Err(ValueError::FieldOutOfRange {
                name: options.name,
                field,
                len: options.len(),
            });
        }
        // Normalize to the first occurrence so `field()` stays canonical.
        let index = options
            .position(options.values[field])
            .unwrap_or(field);
        Ok(Self { index, options })
    }

    #[inline]
    pub fn value(&self) -> T {
        self.options.values[self.index]
    }

    /// Index of the value in the option list.
    #[inline]
    pub fn field(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn options(&self) -> &Options<T> {
        &self.options
    }
}

impl<T: Copy + PartialEq + fmt::Debug> PartialEq for Discrete<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

/// Explicit pair of register encoders for a concrete value type.
pub trait FieldValue: Sized {
    /// Register representation.
    type Field: Copy;

    fn field(&self) -> Self::Field;

    fn from_field(field: Self::Field) -> Result<Self, ValueError>;
}

/// Round to the nearest integer, ties to even.
pub fn round_to_i32(name: &'static str, value: f64) -> Result<i32, ValueError> {
    to_i32(name, value, value.round_ties_even())
}

/// Truncate toward zero.
pub fn truncate_to_i32(name: &'static str, value: f64) -> Result<i32, ValueError> {
    to_i32(name, value, value.trunc())
}

fn to_i32(name: &'static str, value: f64, rounded: f64) -> Result<i32, ValueError> {
    if !value.is_finite() {
        return Err(ValueError::NotFinite { name, value });
    }
    if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 {
        return Err(ValueError::FieldOverflow { name, value });
    }
    Ok(rounded as i32)
}

/// Number of whole `step`s in `value`, rounded to nearest.
pub fn quantize(name: &'static str, value: f64, step: f64) -> Result<i64, ValueError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(ValueError::InvalidStep { name, step });
    }
    if !value.is_finite() {
        return Err(ValueError::NotFinite { name, value });
    }
    let steps = (value / step).round();
    if steps < i64::MIN as f64 || steps >= i64::MAX as f64 {
        return Err(ValueError::FieldOverflow { name, value });
    }
    Ok(steps as i64)
}
