//! Fixed-point math utilities for deterministic board parameters.
//!
//! Environment parameters (light angles, wave amplitude, wind) are
//! fixed-point so that boards compare and hash identically on every
//! client. Floating-point values never enter the board model.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all board parameters.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// An angle in fixed-point radians.
///
/// Kept as a newtype so azimuths and elevations cannot be mixed up with
/// amplitudes or speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Radians(#[serde(with = "fixed_serde")] pub Fixed);

impl Radians {
    /// Zero radians.
    pub const ZERO: Self = Self(Fixed::ZERO);

    /// Pi radians (half turn).
    pub const PI: Self = Self(Fixed::PI);

    /// Pi / 4 radians (eighth turn).
    pub const FRAC_PI_4: Self = Self(Fixed::FRAC_PI_4);

    /// Normalize into `[0, 2π)`.
    #[must_use]
    pub fn normalized(self) -> Self {
        let tau = Fixed::TAU;
        let mut value = self.0 % tau;
        if value < Fixed::ZERO {
            value += tau;
        }
        Self(value)
    }
}

/// Manhattan distance between two integer coordinates.
#[inline]
#[must_use]
pub fn manhattan(x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
    x1.abs_diff(x2) + y1.abs_diff(y2)
}
