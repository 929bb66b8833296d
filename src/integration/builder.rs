//! Builder for assembling [`Detection`] records.

use crate::error::FeatureError;
use crate::geometry::{self, EllipseFeatures, Mask, ShapeDescriptors};
use crate::tracker::Detection;

/// Builder for creating `Detection` objects, either part by part or from a mask.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    head: EllipseFeatures,
    tail: EllipseFeatures,
    body: EllipseFeatures,
    shape: ShapeDescriptors,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(mut self, head: EllipseFeatures) -> Self {
        self.head = head;
        self
    }

    pub fn tail(mut self, tail: EllipseFeatures) -> Self {
        self.tail = tail;
        self
    }

    pub fn body(mut self, body: EllipseFeatures) -> Self {
        self.body = body;
        self
    }

    /// Set the same center and orientation on head, tail and body.
    pub fn pose(mut self, x: f64, y: f64, orientation: f64) -> Self {
        for part in [&mut self.head, &mut self.tail, &mut self.body] {
            part.center = (x, y);
            part.orientation = orientation;
        }
        self
    }

    pub fn shape(mut self, area: f64, perimeter: f64) -> Self {
        self.shape = ShapeDescriptors { area, perimeter };
        self
    }

    /// Build the final `Detection`, unstamped.
    pub fn build(self) -> Detection {
        Detection::new(self.head, self.tail, self.body, self.shape)
    }

    /// Run the full feature chain on one mask: body ellipse, shape
    /// descriptors, orientation resolution and head/tail split.
    pub fn from_mask(mask: &Mask) -> Result<Detection, FeatureError> {
        let mut body = geometry::extract(mask.pixels())?;
        let shape = geometry::shape_descriptors(mask.pixels())?;
        let resolution = geometry::resolve(mask, &mut body)?;

        let (origin_x, origin_y) = mask.origin();
        body.translate(origin_x as f64, origin_y as f64);

        Ok(Self::new()
            .head(resolution.head)
            .tail(resolution.tail)
            .body(body)
            .shape(shape.area, shape.perimeter)
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, s};

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .pose(10.0, 20.0, 0.5)
            .shape(120.0, 44.0)
            .build();

        assert_eq!(det.body.center, (10.0, 20.0));
        assert_eq!(det.head.orientation, 0.5);
        assert_eq!(det.shape.area, 120.0);
        assert_eq!(det.track_id, 0);
    }

    #[test]
    fn test_from_mask_places_body_in_frame() {
        let mut pixels = Array2::<u8>::zeros((12, 40));
        pixels.slice_mut(s![3..9, 2..14]).fill(255);
        pixels.slice_mut(s![5..7, 14..36]).fill(255);
        let local = DetectionBuilder::from_mask(&Mask::from_pixels(pixels.clone())).unwrap();
        let placed = DetectionBuilder::from_mask(&Mask::new(pixels, (200, 100))).unwrap();

        assert_abs_diff_eq!(placed.body.center.0 - local.body.center.0, 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(placed.body.center.1 - local.body.center.1, 100.0, epsilon = 1e-9);
        assert_eq!(placed.body.orientation, local.body.orientation);
        assert_eq!(placed.shape, local.shape);
        assert!(local.shape.area > 0.0 && local.shape.perimeter > 0.0);
        // The heavy block is on the left, so the head is too.
        assert!(local.head.center.0 < local.tail.center.0);
    }

    #[test]
    fn test_from_mask_filling_its_raster() {
        // Detector masks are cropped to the bounding box, so a rectangle
        // covers the whole raster.
        let mask = Mask::new(Array2::from_elem((10, 30), 255), (8, 12));
        let det = DetectionBuilder::from_mask(&mask).unwrap();
        assert_abs_diff_eq!(det.shape.area, 261.0, epsilon = 1e-9);
        assert_abs_diff_eq!(det.shape.perimeter, 76.0, epsilon = 1e-9);
        assert_abs_diff_eq!(det.body.center.0, 22.5, epsilon = 1e-9);
        assert_abs_diff_eq!(det.body.center.1, 16.5, epsilon = 1e-9);
        assert!(det.head.center.0 != det.tail.center.0);
    }

    #[test]
    fn test_from_empty_mask_fails() {
        let mask = Mask::from_pixels(Array2::zeros((6, 6)));
        assert!(matches!(
            DetectionBuilder::from_mask(&mask),
            Err(FeatureError::DegenerateMask { .. })
        ));
    }
}
