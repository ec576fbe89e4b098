use crate::participant::ParticipantId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RaceError {
    #[error("participant {0} is not registered")]
    UnknownParticipant(ParticipantId),
    #[error("participant {0} is already registered")]
    DuplicateParticipant(ParticipantId),
    #[error("joining is closed once the countdown has started")]
    JoinClosed,
    #[error("ready votes are closed once the countdown has started")]
    VotingClosed,
    #[error("the race is already finished")]
    RaceFinished,
    #[error("participant {0} has already finished")]
    ParticipantFinished(ParticipantId),
}
