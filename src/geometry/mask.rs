//! Binary object mask and its rigid resampling.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array2, ArrayView2};

/// Binary silhouette of a single object, located in the full frame by `origin`.
///
/// Any non-zero pixel belongs to the object. Rows are `y`, columns are `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pixels: Array2<u8>,
    /// Frame coordinates `(x, y)` of the raster's top-left pixel.
    origin: (i64, i64),
}

impl Mask {
    pub fn new(pixels: Array2<u8>, origin: (i64, i64)) -> Self {
        Self { pixels, origin }
    }

    /// Mask located at the frame origin.
    pub fn from_pixels(pixels: Array2<u8>) -> Self {
        Self::new(pixels, (0, 0))
    }

    #[inline]
    pub fn pixels(&self) -> ArrayView2<'_, u8> {
        self.pixels.view()
    }

    #[inline]
    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    /// Raster width (number of columns).
    #[inline]
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    /// Raster height (number of rows).
    #[inline]
    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }
}

/// Rotation of a raster onto an enlarged canvas, keeping the affine map used.
#[derive(Debug, Clone)]
pub(crate) struct RotatedRaster {
    pub pixels: Array2<u8>,
    /// Maps source `(x, y, 1)` to canvas coordinates.
    pub forward: Matrix3<f64>,
    /// Maps canvas `(x, y, 1)` back to source coordinates.
    pub inverse: Matrix3<f64>,
}

impl RotatedRaster {
    pub fn to_canvas(&self, x: f64, y: f64) -> (f64, f64) {
        apply(&self.forward, x, y)
    }

    pub fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        apply(&self.inverse, x, y)
    }
}

fn apply(m: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let p = m * Vector3::new(x, y, 1.0);
    (p[0], p[1])
}

/// Copy `raster` into a binary 0/255 image surrounded by `border` zero pixels.
pub(crate) fn to_gray_image(raster: ArrayView2<'_, u8>, border: u32) -> GrayImage {
    let (rows, cols) = raster.dim();
    let pad = border as usize;
    GrayImage::from_fn(cols as u32 + 2 * border, rows as u32 + 2 * border, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let on = x >= pad
            && y >= pad
            && x - pad < cols
            && y - pad < rows
            && raster[[y - pad, x - pad]] != 0;
        Luma([if on { 255 } else { 0 }])
    })
}

/// Rotate `raster` by `angle` radians about its center (counter-clockwise as
/// displayed, y pointing down), enlarging the canvas so that nothing is clipped.
///
/// Nearest-neighbour resampling; canvas pixels outside the source are zero.
pub(crate) fn rotate_about_center(raster: ArrayView2<'_, u8>, angle: f64) -> RotatedRaster {
    let (rows, cols) = raster.dim();
    let (w, h) = (cols as f64, rows as f64);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let alpha = angle.cos();
    let beta = angle.sin();

    let new_w = h * beta.abs() + w * alpha.abs();
    let new_h = h * alpha.abs() + w * beta.abs();
    let tx = (1.0 - alpha) * cx - beta * cy + (new_w / 2.0 - cx);
    let ty = beta * cx + (1.0 - alpha) * cy + (new_h / 2.0 - cy);

    let forward = Matrix3::new(alpha, beta, tx, -beta, alpha, ty, 0.0, 0.0, 1.0);
    // A rigid transform is always invertible; fall back to the transpose-based
    // closed form if the numeric inverse ever fails.
    let inverse = forward.try_inverse().unwrap_or_else(|| rigid_inverse(&forward));

    // `Projection::rotate` turns clockwise in image coordinates, so the
    // counter-clockwise `forward` is a rotation by `-angle` then a shift.
    let projection =
        Projection::translate(tx as f32, ty as f32) * Projection::rotate(-angle as f32);
    let source = to_gray_image(raster, 0);
    let mut canvas = GrayImage::new(new_w as u32, new_h as u32);
    warp_into(
        &source,
        &projection,
        Interpolation::Nearest,
        Luma([0u8]),
        &mut canvas,
    );

    let pixels = Array2::from_shape_fn(
        (canvas.height() as usize, canvas.width() as usize),
        |(v, u)| canvas.get_pixel(u as u32, v as u32)[0],
    );

    RotatedRaster {
        pixels,
        forward,
        inverse,
    }
}

fn rigid_inverse(m: &Matrix3<f64>) -> Matrix3<f64> {
    let (a, b, tx) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (c, d, ty) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    Matrix3::new(
        a,
        c,
        -(a * tx + c * ty),
        b,
        d,
        -(b * tx + d * ty),
        0.0,
        0.0,
        1.0,
    )
}
