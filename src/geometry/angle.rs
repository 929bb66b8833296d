//! Angle helpers on the `[0, 2π)` circle.

use std::f64::consts::{PI, TAU};

/// Mathematical modulo `2π`: maps any finite angle into `[0, 2π)`.
#[inline]
pub fn modulo(angle: f64) -> f64 {
    let wrapped = angle - TAU * (angle / TAU).floor();
    // Rounding can land exactly on 2π for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Signed minimal difference `a - b`, in `(-π, π]`.
#[inline]
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let a = modulo(a);
    let b = modulo(b);
    PI - modulo(PI - (a - b))
}
