use crate::error::RaceError;
use crate::participant::{Participant, ParticipantId};

use super::settings::WinPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LapUpdate {
    pub participant: ParticipantId,
    pub new_count: u32,
    pub required: u32,
    pub finished: bool,
    pub won_race: bool,
}

#[derive(Debug, Clone)]
pub struct LapTracker {
    required: u32,
    policy: WinPolicy,
    winner: Option<ParticipantId>,
    finish_order: Vec<ParticipantId>,
    closed: bool,
}

impl LapTracker {
    pub fn new(required: u32, policy: WinPolicy) -> Self {
        Self {
            required: required.max(1),
            policy,
            winner: None,
            finish_order: Vec::new(),
            closed: false,
        }
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    pub fn policy(&self) -> WinPolicy {
        self.policy
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.winner
    }

    pub fn finish_order(&self) -> &[ParticipantId] {
        &self.finish_order
    }

    pub fn has_finished(&self, id: ParticipantId) -> bool {
        self.finish_order.contains(&id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn reset(&mut self) {
        self.winner = None;
        self.finish_order.clear();
        self.closed = false;
    }

    pub fn record_crossing(&mut self, participant: &mut Participant) -> Result<LapUpdate, RaceError> {
        if self.closed {
            return Err(RaceError::RaceFinished);
        }
        if self.has_finished(participant.id) {
            return Err(RaceError::ParticipantFinished(participant.id));
        }

        let new_count = participant.advance_lap();
        let finished = new_count >= self.required;
        let mut won_race = false;

        if finished {
            self.finish_order.push(participant.id);
            if self.winner.is_none() {
                self.winner = Some(participant.id);
                won_race = true;
            }
            if self.policy == WinPolicy::EndSession {
                self.closed = true;
            }
        }

        Ok(LapUpdate {
            participant: participant.id,
            new_count,
            required: self.required,
            finished,
            won_race,
        })
    }
}
