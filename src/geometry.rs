mod angle;
mod ellipse;
mod mask;
mod orientation;
mod shape;

pub use angle::{angle_difference, modulo};
pub use ellipse::{EllipseFeatures, extract};
pub use mask::Mask;
pub(crate) use mask::to_gray_image;
pub use orientation::{Resolution, resolve};
pub use shape::{ShapeDescriptors, shape_descriptors};
