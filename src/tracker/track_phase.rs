/// Lifecycle phase of a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackPhase {
    /// Newly created track, not yet confirmed
    #[default]
    New,
    /// Matched to a detection in the latest frame
    Tracked,
    /// Missed recently, may still be re-found under its old id
    Lost,
    /// Dropped for good
    Removed,
}
