//! Persistent identity bound to a slot of the tracker state.

use crate::tracker::detection::Detection;
use crate::tracker::track_state::TrackState;

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Unique track identifier
    pub track_id: u64,
    /// Latest matched detection, stale while the track is lost
    pub detection: Detection,
    /// Consecutive frames without a match
    pub miss_count: u32,
    /// Status in the most recent frame
    pub state: TrackState,
}

impl Track {
    pub fn new(track_id: u64, detection: Detection) -> Self {
        Self {
            track_id,
            detection,
            miss_count: 0,
            state: TrackState::Tracked,
        }
    }

    /// Continue the track with a fresh detection.
    pub fn update(&mut self, detection: Detection) {
        self.detection = detection;
        self.mark_tracked();
    }

    pub fn mark_tracked(&mut self) {
        self.state = TrackState::Tracked;
        self.miss_count = 0;
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
        self.miss_count += 1;
    }

    #[inline]
    pub fn is_lost(&self) -> bool {
        self.state == TrackState::Lost
    }

    /// Write frame index and identity onto the carried detection.
    pub fn stamp(&mut self, frame_index: u64) {
        self.detection.frame_index = frame_index;
        self.detection.track_id = self.track_id;
    }
}
