//! Integration module connecting segmentation, feature extraction and tracking.
//!
//! A [`MaskSource`] turns frames into object masks, [`DetectionBuilder`]
//! measures each mask, and [`TrackerPipeline`] feeds the measurements to the
//! tracker and the results to a [`DetectionSink`].

mod background;
mod builder;
mod detector;
mod pipeline;
mod sink;

pub use background::{
    BackgroundSubtractionConfig, BackgroundSubtractionDetector, Morphology, RegionOfInterest,
};
pub use builder::DetectionBuilder;
pub use detector::MaskSource;
pub use pipeline::{PipelineError, TrackerPipeline};
pub use sink::{DetectionSink, MemorySink};
