//! Trait for image-to-mask detection backends.

use ndarray::ArrayView2;

use crate::geometry::Mask;

/// Turns a frame into one binary [`Mask`] per candidate object.
///
/// Implement this trait to connect any segmentation method (background
/// subtraction, a learned model...) to the tracker.
///
/// # Example
///
/// ```ignore
/// use fasttrack_rs::{Mask, MaskSource};
/// use ndarray::ArrayView2;
///
/// struct MySegmenter;
///
/// impl MaskSource for MySegmenter {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: ArrayView2<'_, u8>) -> Result<Vec<Mask>, Self::Error> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait MaskSource {
    /// Error type for detection failures.
    type Error;

    /// Segment a grayscale frame (rows are `y`) into per-object masks, each
    /// carrying its offset in the frame.
    fn detect(&mut self, frame: ArrayView2<'_, u8>) -> Result<Vec<Mask>, Self::Error>;
}
