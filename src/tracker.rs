mod config;
mod detection;
mod fast_tracker;
mod lifecycle;
mod matching;
mod track;
mod track_state;

pub use config::TrackerConfig;
pub(crate) use config::{parse_count, parse_f64};
pub use detection::{Detection, ReferenceSpot};
pub use fast_tracker::Tracker;
pub use lifecycle::{TrackerState, find_lost, reassign};
pub use matching::{AssignmentResult, assign, cost_matrix, linear_assignment};
pub use track::Track;
pub use track_state::TrackState;
