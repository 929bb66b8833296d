//! TrackerPipeline for combining detection, feature extraction and tracking.

use ndarray::ArrayView2;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::tracker::{Detection, Tracker, TrackerConfig};

use super::{DetectionBuilder, DetectionSink, MaskSource};

/// Failure of [`TrackerPipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError<D, S> {
    #[error("detection failed at frame {frame}: {error}")]
    Detector { frame: usize, error: D },
    #[error("sink failed: {0}")]
    Sink(S),
}

/// Bundles a [`MaskSource`] with the [`Tracker`].
pub struct TrackerPipeline<D: MaskSource> {
    detector: D,
    tracker: Tracker,
}

impl<D: MaskSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detector,
            tracker: Tracker::new(config)?,
        })
    }

    /// Process a single frame and return the detections observable in it.
    ///
    /// Masks are turned into detections in parallel; masks without foreground
    /// are dropped with a warning.
    pub fn process_frame(
        &mut self,
        frame: ArrayView2<'_, u8>,
    ) -> Result<Vec<Detection>, D::Error> {
        let masks = self.detector.detect(frame)?;
        let frame_index = self.tracker.frame_index();

        let detections: Vec<Detection> = masks
            .par_iter()
            .filter_map(|mask| match DetectionBuilder::from_mask(mask) {
                Ok(detection) => Some(detection),
                Err(err) => {
                    warn!(
                        frame_index,
                        origin = ?mask.origin(),
                        pixels = mask.foreground_count(),
                        %err,
                        "mask dropped"
                    );
                    None
                }
            })
            .collect();

        debug!(
            frame_index,
            masks = masks.len(),
            detections = detections.len(),
            "frame measured"
        );
        Ok(self.tracker.update(detections))
    }

    /// Track every frame of `frames` and hand each result to `sink`.
    ///
    /// `sink` is closed exactly once, including when a frame fails. Returns the
    /// number of frames processed.
    pub fn run<'a, I, S>(
        &mut self,
        frames: I,
        sink: &mut S,
    ) -> Result<usize, PipelineError<D::Error, S::Error>>
    where
        I: IntoIterator<Item = ArrayView2<'a, u8>>,
        S: DetectionSink,
    {
        let outcome = self.feed(frames, sink);
        let closed = sink.close().map_err(PipelineError::Sink);
        let count = outcome?;
        closed?;
        Ok(count)
    }

    fn feed<'a, I, S>(
        &mut self,
        frames: I,
        sink: &mut S,
    ) -> Result<usize, PipelineError<D::Error, S::Error>>
    where
        I: IntoIterator<Item = ArrayView2<'a, u8>>,
        S: DetectionSink,
    {
        let mut count = 0;
        for frame in frames {
            let detections = self
                .process_frame(frame)
                .map_err(|error| PipelineError::Detector {
                    frame: count,
                    error,
                })?;
            sink.write_frame(&detections).map_err(PipelineError::Sink)?;
            count += 1;
        }
        Ok(count)
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }
}
