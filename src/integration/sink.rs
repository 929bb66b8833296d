//! Output side of the pipeline.

use std::convert::Infallible;

use crate::tracker::Detection;

/// Receives the tracked detections of each frame, in frame order.
pub trait DetectionSink {
    type Error;

    fn write_frame(&mut self, detections: &[Detection]) -> Result<(), Self::Error>;

    /// Flush and release resources. Called once, after the last frame.
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Sink that keeps every frame in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    frames: Vec<Vec<Detection>>,
    closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Vec<Detection>] {
        &self.frames
    }

    /// All records, flattened in frame order.
    pub fn records(&self) -> impl Iterator<Item = &Detection> {
        self.frames.iter().flatten()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DetectionSink for MemorySink {
    type Error = Infallible;

    fn write_frame(&mut self, detections: &[Detection]) -> Result<(), Self::Error> {
        self.frames.push(detections.to_vec());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.closed = true;
        Ok(())
    }
}
