//! Frame-to-frame tracker combining assignment and lifecycle management.

use tracing::debug;

use crate::error::ConfigError;
use crate::tracker::config::TrackerConfig;
use crate::tracker::detection::Detection;
use crate::tracker::lifecycle::TrackerState;
use crate::tracker::matching;
use crate::tracker::track::Track;

/// Stateful multi-object tracker.
///
/// Frames must be fed strictly in order; the result of frame `n + 1` depends
/// on the state reconciled at frame `n`.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    state: Option<TrackerState>,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Track one frame's detections and return the ones observable in it,
    /// stamped with frame index and track id.
    ///
    /// The first call initializes the tracker with ids `0..K`.
    pub fn update(&mut self, detections: Vec<Detection>) -> Vec<Detection> {
        match self.state.as_mut() {
            None => {
                let (state, output) = TrackerState::initialize(detections, self.config.max_time);
                self.state = Some(state);
                output
            }
            Some(state) => {
                let previous = state.detections();
                let assignment = matching::assign(&previous, &detections, &self.config);
                debug!(
                    previous = previous.len(),
                    current = detections.len(),
                    matched = assignment.iter().flatten().count(),
                    "assignment solved"
                );
                state.process(&assignment, detections)
            }
        }
    }

    /// Forget all tracks; the next frame re-initializes identities from zero.
    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Live tracks, including the ones lost in the last frame.
    pub fn tracks(&self) -> &[Track] {
        match &self.state {
            Some(state) => state.tracks(),
            None => &[],
        }
    }

    /// Index the next frame will be stamped with.
    pub fn frame_index(&self) -> u64 {
        self.state.as_ref().map_or(0, |s| s.frame_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::detection::ReferenceSpot;

    fn config() -> TrackerConfig {
        TrackerConfig {
            reference_spot: ReferenceSpot::Body,
            norm_dist: 1.0,
            norm_angle: 0.0,
            norm_area: 0.0,
            norm_perim: 0.0,
            max_dist: 10.0,
            max_time: 2,
        }
    }

    fn det(x: f64, y: f64) -> Detection {
        let mut d = Detection::default();
        d.body.center = (x, y);
        d
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut bad = config();
        bad.norm_dist = f64::NAN;
        assert!(matches!(
            Tracker::new(bad),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_first_update_initializes() {
        let mut tracker = Tracker::new(config()).unwrap();
        assert!(!tracker.is_initialized());
        let out = tracker.update(vec![det(0.0, 0.0), det(50.0, 0.0)]);
        assert!(tracker.is_initialized());
        assert_eq!(out.iter().map(|d| d.track_id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(tracker.frame_index(), 1);
    }

    #[test]
    fn test_ids_follow_motion() {
        let mut tracker = Tracker::new(config()).unwrap();
        tracker.update(vec![det(0.0, 0.0), det(50.0, 0.0)]);
        let out = tracker.update(vec![det(52.0, 1.0), det(2.0, 1.0)]);
        let by_id = |id: u64| out.iter().find(|d| d.track_id == id).unwrap().body.center;
        assert_eq!(by_id(0), (2.0, 1.0));
        assert_eq!(by_id(1), (52.0, 1.0));
        assert!(out.iter().all(|d| d.frame_index == 1));
    }

    #[test]
    fn test_reset_restarts_numbering() {
        let mut tracker = Tracker::new(config()).unwrap();
        tracker.update(vec![det(0.0, 0.0)]);
        tracker.update(vec![det(0.0, 0.0), det(100.0, 0.0)]);
        tracker.reset();
        assert!(tracker.tracks().is_empty());
        let out = tracker.update(vec![det(5.0, 5.0)]);
        assert_eq!(out[0].track_id, 0);
        assert_eq!(out[0].frame_index, 0);
    }
}
