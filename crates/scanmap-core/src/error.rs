/// Errors raised while constructing or encoding a hardware value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("{name}: {value} is outside [{low}, {high}]")]
    OutOfBounds {
        name: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },
    #[error("{name}: {value} is not one of the allowed options")]
    NotAnOption { name: &'static str, value: String },
    #[error("{name}: field {field} does not index the {len} allowed options")]
    FieldOutOfRange {
        name: &'static str,
        field: usize,
        len: usize,
    },
    #[error("{name}: expected a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("{name}: {value} does not fit the register field")]
    FieldOverflow { name: &'static str, value: f64 },
    #[error("{name}: quantization step must be finite and > 0, got {step}")]
    InvalidStep { name: &'static str, step: f64 },
}
