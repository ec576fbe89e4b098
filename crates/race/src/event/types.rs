use std::fmt;

use crate::participant::{ParticipantId, ParticipantKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceEvent {
    ReadyChanged {
        ready: usize,
        expected: usize,
    },
    CountdownTick {
        text: String,
    },
    CountdownCancelled,
    CountdownHidden,
    MovementEnabled {
        participant: ParticipantId,
        kind: ParticipantKind,
    },
    LapUpdated {
        participant: ParticipantId,
        current: u32,
        required: u32,
    },
    Winner {
        participant: ParticipantId,
        kind: ParticipantKind,
        name: String,
    },
    RaceFinished,
    RaceReset,
}

impl RaceEvent {
    pub fn countdown_tick(text: impl Into<String>) -> Self {
        Self::CountdownTick { text: text.into() }
    }

    pub fn participant(&self) -> Option<ParticipantId> {
        match self {
            Self::MovementEnabled { participant, .. }
            | Self::LapUpdated { participant, .. }
            | Self::Winner { participant, .. } => Some(*participant),
            _ => None,
        }
    }
}

impl fmt::Display for RaceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadyChanged { ready, expected } => write!(f, "{}/{} Ready", ready, expected),
            Self::CountdownTick { text } => write!(f, "countdown {}", text),
            Self::CountdownCancelled => write!(f, "countdown cancelled"),
            Self::CountdownHidden => write!(f, "countdown hidden"),
            Self::MovementEnabled { participant, kind } => {
                write!(f, "movement enabled for {} {}", kind, participant)
            }
            Self::LapUpdated {
                participant,
                current,
                required,
            } => write!(f, "participant {} lap {}/{}", participant, current, required),
            Self::Winner { name, .. } => write!(f, "{} wins the race!", name),
            Self::RaceFinished => write!(f, "race finished"),
            Self::RaceReset => write!(f, "race reset"),
        }
    }
}
