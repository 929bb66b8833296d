//! Equivalent-ellipse features from raster moments.

use std::f64::consts::{FRAC_PI_2, TAU};

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::geometry::angle::modulo;

/// Pose of the ellipse having the same second-order moments as a mask.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EllipseFeatures {
    /// Center `(x, y)`, in mask or frame coordinates depending on context.
    pub center: (f64, f64),
    /// Orientation of the major axis in `[0, 2π)`, counter-clockwise as displayed.
    pub orientation: f64,
    pub major_axis: f64,
    pub minor_axis: f64,
}

impl EllipseFeatures {
    /// Shift the center by an integer frame offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.center.0 += dx;
        self.center.1 += dy;
    }
}

/// Raw and central moments up to second order.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    m00: f64,
    m10: f64,
    m01: f64,
    mu20: f64,
    mu11: f64,
    mu02: f64,
}

impl Moments {
    /// Single row-major pass over the raster; every non-zero pixel has unit mass.
    fn of(raster: ArrayView2<'_, u8>) -> Self {
        let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
        let (mut m20, mut m11, mut m02) = (0.0, 0.0, 0.0);
        for ((y, x), &p) in raster.indexed_iter() {
            if p == 0 {
                continue;
            }
            let (x, y) = (x as f64, y as f64);
            m00 += 1.0;
            m10 += x;
            m01 += y;
            m20 += x * x;
            m11 += x * y;
            m02 += y * y;
        }
        if m00 == 0.0 {
            return Self::default();
        }
        let cx = m10 / m00;
        let cy = m01 / m00;
        Self {
            m00,
            m10,
            m01,
            mu20: m20 - cx * m10,
            mu11: m11 - cx * m01,
            mu02: m02 - cy * m01,
        }
    }
}

/// Compute the equivalent ellipse of a binary raster.
///
/// The center is expressed in the raster's own coordinates.
pub fn extract(raster: ArrayView2<'_, u8>) -> Result<EllipseFeatures, FeatureError> {
    let moments = Moments::of(raster);
    if moments.m00 == 0.0 {
        let (rows, cols) = raster.dim();
        return Err(FeatureError::DegenerateMask { rows, cols });
    }

    let Moments {
        m00,
        m10,
        m01,
        mu20: i,
        mu11: j,
        mu02: k,
    } = moments;

    let orientation = if i + j - k != 0.0 {
        let mut theta = 0.5 * (2.0 * j / (i - k)).atan();
        if i < k {
            theta += FRAC_PI_2;
        }
        if theta < 0.0 {
            theta += TAU;
        }
        modulo(TAU - theta)
    } else {
        0.0
    };

    let spread = ((i - k) * (i - k) + 4.0 * j * j).sqrt();
    // Clamp round-off that can push the minor variance slightly below zero.
    let major_axis = 2.0 * ((0.5 * ((i + k) + spread)) / m00).max(0.0).sqrt();
    let minor_axis = 2.0 * ((0.5 * ((i + k) - spread)) / m00).max(0.0).sqrt();

    Ok(EllipseFeatures {
        center: (m10 / m00, m01 / m00),
        orientation,
        major_axis,
        minor_axis,
    })
}
