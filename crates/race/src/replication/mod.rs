mod snapshot;
mod view;

pub use snapshot::{ParticipantState, RaceSnapshot, SnapshotError};
pub use view::RaceView;
