use rkyv::{rancor, Archive, Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ParticipantState {
    pub id: u64,
    pub kind: u8,
    pub laps: u32,
    pub finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct RaceSnapshot {
    pub sequence: u32,
    pub phase: u8,
    pub countdown: u8,
    pub required_laps: u32,
    pub ready: u32,
    pub expected: u32,
    pub winner: Option<u64>,
    pub participants: Vec<ParticipantState>,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl RaceSnapshot {
    pub fn serialize(&self) -> Result<Vec<u8>, SnapshotError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(SnapshotError::Serialize)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, SnapshotError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(SnapshotError::Deserialize)
    }

    pub fn participant(&self, id: u64) -> Option<&ParticipantState> {
        self.participants.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_keeps_standings() {
        let snapshot = RaceSnapshot {
            sequence: 12,
            phase: 3,
            countdown: 0,
            required_laps: 3,
            ready: 2,
            expected: 2,
            winner: None,
            participants: vec![
                ParticipantState {
                    id: 1,
                    kind: 0,
                    laps: 2,
                    finished: false,
                },
                ParticipantState {
                    id: 9,
                    kind: 1,
                    laps: 1,
                    finished: false,
                },
            ],
        };

        let bytes = snapshot.serialize().unwrap();
        let decoded = RaceSnapshot::deserialize(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.participant(9).map(|p| p.laps), Some(1));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(RaceSnapshot::deserialize(&[1, 2, 3]).is_err());
    }
}
