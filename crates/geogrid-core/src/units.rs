//! Compile-time unit safety for distribution network quantities.
//!
//! Urban feeder data mixes kilowatts, kilovars, kilovolts, ohms and meters in
//! the same records. Wrapping each quantity in a newtype keeps the reader from
//! adding a kW load to a kvar capacitor, or a length in meters to one in
//! kilometers.
//!
//! All types use `#[repr(transparent)]` and serialize as bare numbers.
//!
//! ```
//! use geogrid_core::units::{Kilowatts, Kilovars, Meters};
//!
//! let p = Kilowatts(120.0);
//! let q = Kilovars(30.0);
//! let s = p.apparent_power(q);
//! assert!(s.value() > p.value());
//!
//! let span = Meters(1500.0);
//! assert_eq!(span.to_kilometers(), 1.5);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Implements arithmetic and helpers shared by every unit type
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Mul<$type> for f64 {
            type Output = $type;
            fn mul(self, rhs: $type) -> Self::Output {
                <$type>::new(self * rhs.0)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.3} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

// =============================================================================
// Power Units
// =============================================================================

/// Active power in kilowatts (kW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilowatts(pub f64);

impl_unit_ops!(Kilowatts, "kW");

/// Reactive power in kilovolt-amperes reactive (kvar)
///
/// Positive values are inductive consumption for loads and capacitive
/// injection for capacitor banks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilovars(pub f64);

impl_unit_ops!(Kilovars, "kvar");

/// Apparent power in kilovolt-amperes (kVA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct KilovoltAmperes(pub f64);

impl_unit_ops!(KilovoltAmperes, "kVA");

impl Kilowatts {
    /// Apparent power given reactive power: S = √(P² + Q²)
    #[inline]
    pub fn apparent_power(self, q: Kilovars) -> KilovoltAmperes {
        KilovoltAmperes((self.0.powi(2) + q.0.powi(2)).sqrt())
    }

    /// Reactive power drawn at the given (lagging) power factor.
    ///
    /// Q = P × tan(acos(pf)). A power factor of zero has no finite answer
    /// and yields infinity; callers validate the range first.
    #[inline]
    pub fn reactive_at_power_factor(self, power_factor: f64) -> Kilovars {
        let pf = power_factor.abs().clamp(0.0, 1.0);
        if pf < 1e-12 {
            return Kilovars(f64::INFINITY);
        }
        Kilovars(self.0 * (1.0 - pf.powi(2)).sqrt() / pf)
    }
}

impl KilovoltAmperes {
    /// Active power given power factor: P = S × pf
    #[inline]
    pub fn active_power(self, power_factor: f64) -> Kilowatts {
        Kilowatts(self.0 * power_factor)
    }
}

// =============================================================================
// Voltage / Current Units
// =============================================================================

/// Line-to-line voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);

impl_unit_ops!(Kilovolts, "kV");

impl Kilovolts {
    /// Relative difference to another voltage, as a fraction of `other`
    #[inline]
    pub fn relative_difference(self, other: Kilovolts) -> f64 {
        if other.0.abs() < 1e-12 {
            return if self.0.abs() < 1e-12 { 0.0 } else { f64::INFINITY };
        }
        ((self.0 - other.0) / other.0).abs()
    }
}

/// Current in amperes (A)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Amperes(pub f64);

impl_unit_ops!(Amperes, "A");

// =============================================================================
// Impedance Units
// =============================================================================

/// Impedance in ohms (Ω)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Ohms(pub f64);

impl_unit_ops!(Ohms, "Ω");

/// A percentage on the element's own rating (e.g. transformer %Z)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Percent(pub f64);

impl_unit_ops!(Percent, "%");

impl Percent {
    #[inline]
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }
}

// =============================================================================
// Length Units
// =============================================================================

/// Length in meters (m)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

impl Meters {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn to_kilometers(self) -> f64 {
        self.0 / 1000.0
    }
}

// =============================================================================
// Tests
// =============================================================================
