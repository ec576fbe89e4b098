use std::fmt;

use kartline::{ParticipantId, ParticipantKind, RaceEvent};

#[derive(Debug, Clone)]
pub enum ServerEvent {
    ParticipantJoined {
        id: ParticipantId,
        kind: ParticipantKind,
    },
    ParticipantLeft {
        id: ParticipantId,
    },
    Race(RaceEvent),
    Warning {
        message: String,
    },
}

impl ServerEvent {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParticipantJoined { id, kind } => write!(f, "{} {} joined", kind, id),
            Self::ParticipantLeft { id } => write!(f, "participant {} left", id),
            Self::Race(event) => write!(f, "{}", event),
            Self::Warning { message } => f.write_str(message),
        }
    }
}
