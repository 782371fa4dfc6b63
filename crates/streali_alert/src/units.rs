// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unit newtypes for canvas space and alert time.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A duration or timestamp within an alert, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milliseconds(pub f32);

impl Milliseconds {
    /// Zero milliseconds
    pub const ZERO: Self = Self(0.0);

    /// Create from whole seconds
    pub fn from_secs(secs: f32) -> Self {
        Self(secs * 1000.0)
    }

    /// Value in seconds
    pub fn as_secs(self) -> f32 {
        self.0 / 1000.0
    }

    /// Clamp into `[min, max]`
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0.max(min.0)))
    }

    /// The larger of two values
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// The smaller of two values
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Format as `mm:ss.mmm`
    pub fn display(self) -> String {
        let total = self.0.max(0.0) as u64;
        let minutes = total / 60_000;
        let seconds = (total / 1000) % 60;
        let millis = total % 1000;
        format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
    }
}

impl Add for Milliseconds {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Milliseconds {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

/// A length or coordinate in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pixels(pub f32);

impl Pixels {
    /// Zero pixels
    pub const ZERO: Self = Self(0.0);

    /// Clamp into `[min, max]`
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0.max(min.0)))
    }

    /// The larger of two values
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// The smaller of two values
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl Add for Pixels {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Pixels {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_minutes_seconds_millis() {
        assert_eq!(Milliseconds(0.0).display(), "00:00.000");
        assert_eq!(Milliseconds(61_250.0).display(), "01:01.250");
        assert_eq!(Milliseconds(-5.0).display(), "00:00.000");
    }

    #[test]
    fn test_clamp_tolerates_inverted_bounds() {
        let value = Pixels(50.0).clamp(Pixels(100.0), Pixels(20.0));
        assert_eq!(value, Pixels(100.0));
    }
}
