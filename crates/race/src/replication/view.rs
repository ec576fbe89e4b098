use crate::participant::{ParticipantId, ParticipantKind};
use crate::race::{RacePhase, Readiness};

use super::snapshot::{RaceSnapshot, SnapshotError};

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[inline]
fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

#[derive(Debug, Default)]
pub struct RaceView {
    latest: Option<RaceSnapshot>,
}

impl RaceView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false for stale or duplicate snapshots.
    pub fn apply(&mut self, snapshot: RaceSnapshot) -> bool {
        if let Some(current) = &self.latest {
            if !sequence_greater_than(snapshot.sequence, current.sequence) {
                return false;
            }
        }
        self.latest = Some(snapshot);
        true
    }

    pub fn apply_bytes(&mut self, data: &[u8]) -> Result<bool, SnapshotError> {
        let snapshot = RaceSnapshot::deserialize(data)?;
        Ok(self.apply(snapshot))
    }

    pub fn sequence(&self) -> Option<u32> {
        self.latest.as_ref().map(|s| s.sequence)
    }

    pub fn phase(&self) -> RacePhase {
        self.latest
            .as_ref()
            .map(|s| RacePhase::from_code(s.phase, s.countdown))
            .unwrap_or(RacePhase::Idle)
    }

    pub fn readiness(&self) -> Readiness {
        self.latest
            .as_ref()
            .map(|s| Readiness::new(s.ready as usize, s.expected as usize))
            .unwrap_or(Readiness::new(0, 0))
    }

    pub fn laps(&self, id: ParticipantId) -> Option<u32> {
        self.latest.as_ref()?.participant(id).map(|p| p.laps)
    }

    pub fn kind(&self, id: ParticipantId) -> Option<ParticipantKind> {
        self.latest
            .as_ref()?
            .participant(id)
            .map(|p| ParticipantKind::from(p.kind))
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.latest.as_ref()?.winner
    }

    pub fn snapshot(&self) -> Option<&RaceSnapshot> {
        self.latest.as_ref()
    }
}
