use std::collections::BTreeMap;

use crate::error::RaceError;

use super::{ClientId, Participant, ParticipantId, ParticipantKind};

#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    participants: BTreeMap<ParticipantId, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, participant: Participant) -> Result<(), RaceError> {
        if self.participants.contains_key(&participant.id) {
            return Err(RaceError::DuplicateParticipant(participant.id));
        }
        self.participants.insert(participant.id, participant);
        Ok(())
    }

    pub fn remove(&mut self, id: ParticipantId) -> Option<Participant> {
        self.participants.remove(&id)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(&id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.participants.contains_key(&id)
    }

    pub fn laps(&self, id: ParticipantId) -> Option<u32> {
        self.get(id).map(Participant::laps)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.participants.keys().copied()
    }

    pub fn owned_by(&self, client: ClientId) -> impl Iterator<Item = &Participant> {
        self.participants
            .values()
            .filter(move |p| p.owner == Some(client))
    }

    pub fn count_kind(&self, kind: ParticipantKind) -> usize {
        self.participants.values().filter(|p| p.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }
}
