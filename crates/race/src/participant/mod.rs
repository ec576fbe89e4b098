mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use registry::ParticipantRegistry;

pub type ParticipantId = u64;
pub type ClientId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ParticipantKind {
    Player = 0,
    Npc = 1,
}

impl ParticipantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
        }
    }
}

impl From<u8> for ParticipantKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Npc,
            _ => Self::Player,
        }
    }
}

impl fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub kind: ParticipantKind,
    pub name: String,
    pub owner: Option<ClientId>,
    laps: u32,
    first_crossing_seen: bool,
}

impl Participant {
    pub fn new(id: ParticipantId, kind: ParticipantKind) -> Self {
        let name = match kind {
            ParticipantKind::Player => format!("Player {}", id),
            ParticipantKind::Npc => format!("NPC {}", id),
        };
        Self {
            id,
            kind,
            name,
            owner: None,
            laps: 0,
            first_crossing_seen: false,
        }
    }

    pub fn player(id: ParticipantId, owner: ClientId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::new(id, ParticipantKind::Player)
        }
    }

    pub fn npc(id: ParticipantId) -> Self {
        Self::new(id, ParticipantKind::Npc)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    pub fn has_crossed_once(&self) -> bool {
        self.first_crossing_seen
    }

    pub fn is_npc(&self) -> bool {
        self.kind == ParticipantKind::Npc
    }

    pub(crate) fn mark_first_crossing(&mut self) {
        self.first_crossing_seen = true;
    }

    pub(crate) fn advance_lap(&mut self) -> u32 {
        self.laps += 1;
        self.laps
    }

    pub(crate) fn reset_progress(&mut self) {
        self.laps = 0;
        self.first_crossing_seen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_participant_starts_clean() {
        let p = Participant::player(7, 1);
        assert_eq!(p.laps(), 0);
        assert!(!p.has_crossed_once());
        assert_eq!(p.owner, Some(1));
        assert_eq!(p.name, "Player 7");
    }

    #[test]
    fn kind_from_wire_byte() {
        assert_eq!(ParticipantKind::from(1), ParticipantKind::Npc);
        assert_eq!(ParticipantKind::from(0), ParticipantKind::Player);
        assert_eq!(ParticipantKind::from(9), ParticipantKind::Player);
    }
}
