//! Head/tail disambiguation of an ellipse fit.
//!
//! Second-order moments only fix the major axis modulo π. The mask is rotated
//! so that this axis lies along `x`, projected onto it, and the skewness of the
//! projection tells which end carries the bulk of the body. The rotated mask is
//! then split at the body center and each half gets its own ellipse.

use std::f64::consts::{FRAC_PI_2, PI};

use ndarray::{Array1, Axis, s};

use crate::error::FeatureError;
use crate::geometry::angle::modulo;
use crate::geometry::ellipse::{EllipseFeatures, extract};
use crate::geometry::mask::{Mask, RotatedRaster, rotate_about_center};

/// Below this standard deviation the projection is treated as a point mass.
const MIN_STD_DEV: f64 = 1e-9;
/// Skewness this close to zero is treated as symmetric.
const SKEW_TOLERANCE: f64 = 1e-9;

/// Outcome of [`resolve`]; sub-ellipse centers are in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// The orientation was flipped by π to point toward the heavier end.
    pub is_left_oriented: bool,
    pub head: EllipseFeatures,
    pub tail: EllipseFeatures,
}

/// Resolve the forward direction of `body` and derive head and tail ellipses.
///
/// `body` must be the ellipse of `mask` in mask coordinates. Its orientation is
/// updated in place; its center is left untouched.
pub fn resolve(mask: &Mask, body: &mut EllipseFeatures) -> Result<Resolution, FeatureError> {
    let rotated = rotate_about_center(mask.pixels(), -body.orientation);

    let projection = rotated
        .pixels
        .mapv(|p| if p != 0 { 1.0 } else { 0.0 })
        .sum_axis(Axis(0));
    let is_left_oriented = matches!(skewness(&projection), Some(skew) if skew > SKEW_TOLERANCE);
    if is_left_oriented {
        body.orientation = modulo(body.orientation - PI);
    }

    let split = split_column(&rotated, body);
    let (origin_x, origin_y) = mask.origin();
    let (origin_x, origin_y) = (origin_x as f64, origin_y as f64);

    let mut negative = extract(rotated.pixels.slice(s![.., ..split]))?;
    let mut positive = extract(rotated.pixels.slice(s![.., split..]))?;

    for (half, column_offset) in [(&mut negative, 0.0), (&mut positive, split as f64)] {
        let (x, y) = rotated.to_source(half.center.0 + column_offset, half.center.1);
        half.center = (x + origin_x, y + origin_y);
        half.orientation = into_body_frame(half.orientation, body.orientation);
    }

    let (head, tail) = if is_left_oriented {
        (negative, positive)
    } else {
        (positive, negative)
    };

    Ok(Resolution {
        is_left_oriented,
        head,
        tail,
    })
}

/// Column of the rotated canvas holding the body center, truncated toward zero.
fn split_column(rotated: &RotatedRaster, body: &EllipseFeatures) -> usize {
    let (u, _) = rotated.to_canvas(body.center.0, body.center.1);
    let width = rotated.pixels.ncols();
    if u <= 0.0 {
        0
    } else {
        (u.trunc() as usize).min(width)
    }
}

/// Express a half's local orientation relative to the body orientation,
/// taking the smaller of the two possible corrections.
fn into_body_frame(local: f64, body: f64) -> f64 {
    let local = if local > PI { local - PI } else { local };
    let half_turn = if local.abs() > FRAC_PI_2 { PI } else { 0.0 };
    modulo(local + body + half_turn)
}

/// Skewness of a non-negative mass distribution over 1-indexed positions.
///
/// `None` when the distribution is empty or too concentrated for the third
/// standardized moment to be meaningful.
pub(crate) fn skewness(mass: &Array1<f64>) -> Option<f64> {
    let total = mass.sum();
    if !(total > 0.0) {
        return None;
    }
    let weights = mass / total;
    let positions = Array1::from_iter((1..=weights.len()).map(|i| i as f64));

    let mean = (&positions * &weights).sum();
    let centered = &positions - mean;
    let variance = (&centered * &centered * &weights).sum();
    let std_dev = variance.sqrt();
    if !std_dev.is_finite() || std_dev < MIN_STD_DEV {
        return None;
    }
    let third = (&centered * &centered * &centered * &weights).sum();
    let skew = third / (std_dev * std_dev * std_dev);
    skew.is_finite().then_some(skew)
}
