use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of sub-units in one loyalty point.
pub const POINTS_PRECISION: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// A loyalty points amount, held as a whole number of hundredths of a point.
///
/// Over the wire (JSON) the amount is a decimal number, e.g. `100.5`. In the database it is the raw integer.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(into = "f64", try_from = "f64")]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as loyalty points: {0}")]
pub struct PointsConversionError(String);

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(PointsConversionError(format!("{value} is not a finite, non-negative amount")));
        }
        let scaled = (value * POINTS_PRECISION as f64).round();
        if scaled >= i64::MAX as f64 {
            return Err(PointsConversionError(format!("{value} is too large")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }
}

impl From<Points> for f64 {
    fn from(value: Points) -> Self {
        value.0 as f64 / POINTS_PRECISION as f64
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let precision = POINTS_PRECISION.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / precision, abs % precision)
    }
}

impl Points {
    /// Creates an amount from a whole number of points.
    pub fn from_points(points: i64) -> Self {
        Self(points * POINTS_PRECISION)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
