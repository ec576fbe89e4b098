pub mod error;
pub mod event;
pub mod gate;
pub mod participant;
pub mod race;
pub mod replication;

pub use error::RaceError;
pub use event::{EventLog, LoggedEvent, RaceEvent, RaceNotifier, RaceObserver, Subscription};
pub use gate::{
    AllowedDirection, CrossingCandidate, CrossingOutcome, CrossingValidator, EntityTag,
    FinishLineGate, Rejection,
};
pub use participant::{ClientId, Participant, ParticipantId, ParticipantKind, ParticipantRegistry};
pub use race::{
    Countdown, CountdownStep, CrossingReport, LapTracker, LapUpdate, RacePhase, RaceSession,
    RaceSettings, ReadyMode, ReadyRoster, Readiness, VoteOutcome, WinPolicy,
};
pub use replication::{ParticipantState, RaceSnapshot, RaceView, SnapshotError};
