//! # 16-bit Value Packing
//!
//! Matrix cells are stored as signed 16-bit codes. A [`ValueConf`] fixes the
//! real-valued range `[min, max]` that the 65536 codes span:
//!
//! ```text
//! pack(x)   = round((clamp(x, min, max) - min) / (max - min) * 65535) + i16::MIN
//! unpack(c) = (c - i16::MIN) / 65535 * (max - min) + min
//! ```
//!
//! ## Precision
//!
//! `unpack(pack(x))` is within half a quantization step of `x` for every `x`
//! in range, comfortably inside one step of `(max - min) / 65536`. Values
//! outside the range saturate to the nearest bound instead of failing; the
//! codec is used for similarity scores where that loss is irrelevant.
//!
//! ## Configuration Errors
//!
//! A range with `min >= max` (or a non-finite bound) is rejected when the
//! `ValueConf` is built, which happens when a matrix is opened or a writer is
//! created. `pack`/`unpack` themselves never fail.

use eyre::{bail, Result};

use crate::config::{DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE, PACKED_RANGE};
use crate::error::MatrixError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueConf {
    min: f32,
    max: f32,
}

impl ValueConf {
    pub fn new(min: f32, max: f32) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            bail!(MatrixError::encoding(format!(
                "value range bounds must be finite (min={}, max={})",
                min, max
            )));
        }
        if min >= max {
            bail!(MatrixError::encoding(format!(
                "value range is empty: min {} must be less than max {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// Width of one quantization step.
    pub fn step(&self) -> f32 {
        (self.range() as f64 / PACKED_RANGE) as f32
    }

    #[inline]
    pub fn pack(&self, value: f32) -> i16 {
        let min = self.min as f64;
        let range = self.max as f64 - min;
        // NaN clamps to min.
        let clamped = if value.is_nan() {
            min
        } else {
            (value as f64).clamp(min, self.max as f64)
        };
        let normalized = (clamped - min) / range;
        let code = (normalized * PACKED_RANGE).round() + i16::MIN as f64;
        code.clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }

    #[inline]
    pub fn unpack(&self, code: i16) -> f32 {
        let min = self.min as f64;
        let range = self.max as f64 - min;
        let normalized = (code as f64 - i16::MIN as f64) / PACKED_RANGE;
        (normalized * range + min) as f32
    }

    pub fn pack_all(&self, values: &[f32]) -> Vec<i16> {
        values.iter().map(|&v| self.pack(v)).collect()
    }

    /// True when both bounds agree within a small relative tolerance.
    ///
    /// Writers use this to reject rows packed under a different range, which
    /// would otherwise decode to silently wrong values.
    pub fn almost_equals(&self, other: &ValueConf) -> bool {
        let tolerance = self.range().abs().max(other.range().abs()) * 1e-6;
        (self.min - other.min).abs() <= tolerance && (self.max - other.max).abs() <= tolerance
    }
}

impl Default for ValueConf {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_VALUE,
            max: DEFAULT_MAX_VALUE,
        }
    }
}
