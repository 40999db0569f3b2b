//! This module defines various unit types and their conversions.
//!
//! All quantities are thin wrappers around `f64`. Areas are in m², masses in g, powers in W and
//! irradiances in W/m². Percentages are kept on a 0-100 scale and only converted to a fraction at
//! the point of use.
use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! base_unit_struct {
    ($name:ident) => {
        /// A quantity of this type.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new instance from an `f64` value
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Returns the value as an `f64`
            pub fn value(&self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite (i.e. not NaN or infinite)
            pub fn is_finite(&self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }

        impl std::ops::Neg for $name {
            type Output = $name;
            fn neg(self) -> $name {
                $name(-self.0)
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! unit_struct {
    ($name:ident) => {
        base_unit_struct!($name);

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

base_unit_struct!(Dimensionless);

impl Dimensionless {
    /// Raise to a floating-point power
    pub fn powf(self, rhs: f64) -> Self {
        Self(self.0.powf(rhs))
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

base_unit_struct!(Percent);

impl Percent {
    /// Convert from a percentage (0-100) to a fraction (0-1)
    pub fn fraction(self) -> Dimensionless {
        Dimensionless(self.0 / 100.0)
    }

    /// The complement of this percentage as a fraction, i.e. `1 - p/100`
    pub fn complement(self) -> Dimensionless {
        Dimensionless(1.0 - self.0 / 100.0)
    }
}

// Base quantities
unit_struct!(Area);
unit_struct!(Mass);
unit_struct!(Power);

// Derived quantities
unit_struct!(Irradiance);
unit_struct!(MassPerArea);

// Multiplication rules
impl_mul!(Area, MassPerArea, Mass);
impl_mul!(Area, Irradiance, Power);

// Division rules
impl_div!(Power, Irradiance, Area);

/// Number of watts in a megawatt
pub const WATTS_PER_MEGAWATT: f64 = 1e6;

impl Power {
    /// Create a [`Power`] from a value in megawatts
    pub fn from_megawatts(megawatts: f64) -> Self {
        Self(megawatts * WATTS_PER_MEGAWATT)
    }
}
