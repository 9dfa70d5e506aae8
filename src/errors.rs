use thiserror::Error;

/// Rejections raised while validating a [`crate::models::profile::DeviceProfile`].
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error(
        "voltage range {nominal} V ± {half_spread} V reaches zero; minimum must stay above 0 V"
    )]
    VoltageCrossesZero { nominal: f64, half_spread: f64 },
    #[error("{field} range is inverted (min {min} > max {max})")]
    InvertedRange { field: &'static str, min: i64, max: i64 },
    #[error("{field} upper bound {max} exceeds capacity {capacity}")]
    ExceedsCapacity { field: &'static str, max: i64, capacity: i64 },
    #[error("profile defines no phases")]
    NoPhases,
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },
    #[error("energy channel {0} has no phase with the same id")]
    OrphanChannel(u32),
    #[error("identity field {0} is empty")]
    EmptyIdentity(&'static str),
    #[error("utc offset {0}s is outside ±86399s")]
    InvalidUtcOffset(i32),
}

/// Errors produced while loading `config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("device {device}: unknown profile preset '{preset}'")]
    UnknownPreset { device: String, preset: String },
    #[error("device id '{0}' is configured more than once")]
    DuplicateDevice(String),
    #[error("device {device}: malformed profile: {source}")]
    MalformedProfile {
        device: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("device {device}: invalid profile: {source}")]
    InvalidProfile {
        device: String,
        #[source]
        source: ProfileError,
    },
}

/// Failures turning a snapshot into its wire payload. Always fatal.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("field {field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
