/// Per-frame status of a track slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Matched in the current frame, or born in it
    #[default]
    Tracked,
    /// Unmatched in the current frame; its detection is carried over
    Lost,
}
