mod points;

pub mod helpers;
pub mod op;

pub use points::{Points, PointsConversionError, POINTS_PRECISION};
