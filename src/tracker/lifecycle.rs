//! Track identity lifecycle: reconcile, age, evict, stamp, report.

use tracing::{debug, warn};

use crate::tracker::detection::Detection;
use crate::tracker::track::Track;

/// Slots of persistent tracks plus the identity and frame counters.
///
/// Slot order is stable across frames: the previous frame's slots keep their
/// position and births are appended, so an assignment computed against
/// [`TrackerState::detections`] indexes directly into the slots.
#[derive(Debug, Clone)]
pub struct TrackerState {
    tracks: Vec<Track>,
    next_id: u64,
    frame_index: u64,
    max_time: u32,
}

impl TrackerState {
    /// Start from the first frame's detections, numbering them `0..K`.
    pub fn initialize(detections: Vec<Detection>, max_time: u32) -> (Self, Vec<Detection>) {
        let mut tracks: Vec<Track> = detections
            .into_iter()
            .enumerate()
            .map(|(i, det)| Track::new(i as u64, det))
            .collect();
        for track in &mut tracks {
            track.stamp(0);
        }
        let output = tracks.iter().map(|t| t.detection).collect();
        debug!(tracks = tracks.len(), "tracker initialized");

        let state = Self {
            next_id: tracks.len() as u64,
            tracks,
            frame_index: 1,
            max_time,
        };
        (state, output)
    }

    /// Fold one frame's assignment into the slots and return the detections
    /// observable in this frame.
    ///
    /// `assignment[i]` is the index in `current` continuing slot `i`.
    pub fn process(
        &mut self,
        assignment: &[Option<usize>],
        current: Vec<Detection>,
    ) -> Vec<Detection> {
        if assignment.len() != self.tracks.len() {
            warn!(
                expected = self.tracks.len(),
                got = assignment.len(),
                "assignment length does not match tracker slots"
            );
        }
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let previous = self.detections();
        let reconciled = reassign(&previous, &current, assignment);
        let lost = find_lost(assignment, self.tracks.len());

        let mut lost_mask = vec![false; self.tracks.len()];
        for &i in &lost {
            lost_mask[i] = true;
        }
        let mut births = 0;
        for (i, detection) in reconciled.into_iter().enumerate() {
            match self.tracks.get_mut(i) {
                Some(track) if lost_mask[i] => track.mark_lost(),
                Some(track) => track.update(detection),
                None => {
                    self.next_id += 1;
                    self.tracks.push(Track::new(self.next_id, detection));
                    births += 1;
                }
            }
        }

        let evicted = self.evict();

        for track in &mut self.tracks {
            track.stamp(frame_index);
        }
        debug!(
            frame_index,
            births,
            lost = lost.len(),
            evicted = evicted.len(),
            alive = self.tracks.len(),
            "frame processed"
        );

        self.tracks
            .iter()
            .filter(|t| !t.is_lost())
            .map(|t| t.detection)
            .collect()
    }

    /// Remove, highest slot first, tracks lost for longer than `max_time`.
    fn evict(&mut self) -> Vec<u64> {
        let mut evicted = Vec::new();
        for i in (0..self.tracks.len()).rev() {
            if self.tracks[i].miss_count > self.max_time {
                let track = self.tracks.remove(i);
                debug!(track_id = track.track_id, "track evicted");
                evicted.push(track.track_id);
            }
        }
        evicted
    }

    /// Latest detection of every slot, stale ones included.
    pub fn detections(&self) -> Vec<Detection> {
        self.tracks.iter().map(|t| t.detection).collect()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Index the next processed frame will be stamped with.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    #[cfg(test)]
    pub(crate) fn from_tracks(tracks: Vec<Track>, next_id: u64, max_time: u32) -> Self {
        Self {
            tracks,
            next_id,
            frame_index: 1,
            max_time,
        }
    }
}

/// New slot contents after matching: matched slots take their current
/// detection, unmatched slots keep the previous one, and every current
/// detection no slot claimed is appended.
///
/// Inputs are left untouched.
pub fn reassign<T: Clone>(previous: &[T], current: &[T], assignment: &[Option<usize>]) -> Vec<T> {
    let mut claimed = vec![false; current.len()];
    let mut slots: Vec<T> = previous
        .iter()
        .enumerate()
        .map(|(i, prev)| match assignment.get(i).copied().flatten() {
            Some(j) if j < current.len() => {
                claimed[j] = true;
                current[j].clone()
            }
            _ => prev.clone(),
        })
        .collect();
    slots.extend(
        current
            .iter()
            .zip(&claimed)
            .filter(|(_, taken)| !**taken)
            .map(|(det, _)| det.clone()),
    );
    slots
}

/// Slots among the first `slots` without a match in `assignment`.
///
/// Entries missing from a short assignment count as unmatched.
pub fn find_lost(assignment: &[Option<usize>], slots: usize) -> Vec<usize> {
    (0..slots)
        .filter(|&i| assignment.get(i).copied().flatten().is_none())
        .collect()
}
