mod byte_tracker;
mod kalman_filter;
mod matching;
mod rect;
mod track;
mod track_phase;

pub use byte_tracker::{ByteTracker, TrackerConfig};
pub use matching::Detection;
pub use rect::Rect;
pub use track::{Identity, Track};
pub use track_phase::TrackPhase;
