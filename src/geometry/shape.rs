//! Area and perimeter of a mask's outer contour.

use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;
use crate::geometry::to_gray_image;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeDescriptors {
    /// Area enclosed by the outer contour polygon.
    pub area: f64,
    /// Length of the closed outer contour.
    pub perimeter: f64,
}

/// Trace the outer contours of `raster` and describe the one enclosing the
/// largest area.
///
/// The contour runs through the centers of the border pixels, so a single
/// pixel has zero area and zero perimeter. The raster is traced inside a one
/// pixel zero border, so objects touching its edges keep their contour.
pub fn shape_descriptors(raster: ArrayView2<'_, u8>) -> Result<ShapeDescriptors, FeatureError> {
    let (rows, cols) = raster.dim();
    let image = to_gray_image(raster, 1);

    find_contours::<i64>(&image)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .map(|contour| ShapeDescriptors {
            area: polygon_area(&contour.points),
            perimeter: closed_length(&contour.points),
        })
        .max_by(|a, b| a.area.total_cmp(&b.area))
        .ok_or(FeatureError::NoContour { rows, cols })
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| p.x * q.y - q.x * p.y)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Length of the polyline through `points`, closed back to the first point.
fn closed_length(points: &[Point<i64>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p, q)| (((q.x - p.x).pow(2) + (q.y - p.y).pow(2)) as f64).sqrt())
        .sum()
}
