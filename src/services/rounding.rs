//! Fixed-precision helpers used only when building the wire payload.
//! The physical model always works on unrounded values.

use crate::errors::FormatError;

/// Fails with [`FormatError::NonFinite`] for NaN / ±inf so they never reach
/// `serde_json`, which would otherwise emit `null`.
pub fn finite(field: &'static str, value: f64) -> Result<f64, FormatError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormatError::NonFinite { field, value })
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_dp(field: &'static str, value: f64, decimals: u32) -> Result<f64, FormatError> {
    let value = finite(field, value)?;
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    // -0.0 would serialize as "-0.0"
    Ok(if rounded == 0.0 { 0.0 } else { rounded })
}

/// Whole watts, truncated towards negative infinity.
pub fn floor_int(field: &'static str, value: f64) -> Result<i64, FormatError> {
    Ok(finite(field, value)?.floor() as i64)
}
