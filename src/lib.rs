//! Multi-object tracking of deformable objects from binary silhouettes.
//!
//! Each object mask is reduced to an equivalent-ellipse pose, its head/tail
//! ambiguity is resolved from the mask's asymmetry, and the resulting
//! [`Detection`]s are matched frame to frame with an optimal assignment.

pub mod error;
pub mod geometry;
pub mod integration;
pub mod tracker;

pub use error::{ConfigError, DetectorError, FeatureError};
pub use geometry::{EllipseFeatures, Mask, ShapeDescriptors};
pub use integration::{
    BackgroundSubtractionConfig, BackgroundSubtractionDetector, DetectionBuilder, DetectionSink,
    MaskSource, MemorySink, PipelineError, TrackerPipeline,
};
pub use tracker::{Detection, ReferenceSpot, Tracker, TrackerConfig};
