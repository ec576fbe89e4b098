use glam::Vec3;

use crate::participant::{Participant, ParticipantId};

use super::direction::AllowedDirection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityTag {
    Player,
    Player2,
    Npc,
    Other(String),
}

impl EntityTag {
    pub fn is_racer(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for EntityTag {
    fn from(value: &str) -> Self {
        match value {
            "Player" => Self::Player,
            "Player2" => Self::Player2,
            "NPC" => Self::Npc,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrossingCandidate {
    pub id: ParticipantId,
    pub position: Vec3,
    pub forward: Vec3,
    pub tag: EntityTag,
}

impl CrossingCandidate {
    pub fn new(id: ParticipantId, position: Vec3, forward: Vec3, tag: impl Into<EntityTag>) -> Self {
        Self {
            id,
            position,
            forward,
            tag: tag.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UntrackedTag,
    UnknownParticipant,
    WrongSide,
    WrongDirection,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UntrackedTag => "entity is not a racer",
            Self::UnknownParticipant => "entity is not a registered participant",
            Self::WrongSide => "entered from the forward side",
            Self::WrongDirection => "heading is not an allowed direction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingOutcome {
    Invalid(Rejection),
    FirstTouch,
    ValidCrossing,
}

impl CrossingOutcome {
    pub fn counts(&self) -> bool {
        matches!(self, Self::ValidCrossing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishLineGate {
    position: Vec3,
    forward: Vec3,
    restriction: Option<AllowedDirection>,
}

impl FinishLineGate {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.try_normalize().unwrap_or(Vec3::Z),
            restriction: None,
        }
    }

    pub fn with_restriction(mut self, allowed: AllowedDirection) -> Self {
        self.restriction = Some(allowed);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn restriction(&self) -> Option<AllowedDirection> {
        self.restriction
    }

    /// Entities are eligible only while strictly behind the gate plane.
    pub fn is_behind(&self, position: Vec3) -> bool {
        (position - self.position).dot(self.forward) < 0.0
    }

    pub fn check(&self, candidate: &CrossingCandidate) -> Result<(), Rejection> {
        if !candidate.tag.is_racer() {
            return Err(Rejection::UntrackedTag);
        }
        if !self.is_behind(candidate.position) {
            return Err(Rejection::WrongSide);
        }
        if let Some(allowed) = self.restriction {
            if !allowed.permits(candidate.forward) {
                return Err(Rejection::WrongDirection);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CrossingValidator {
    gate: FinishLineGate,
}

impl CrossingValidator {
    pub fn new(gate: FinishLineGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &FinishLineGate {
        &self.gate
    }

    pub fn validate(
        &self,
        candidate: &CrossingCandidate,
        participant: Option<&mut Participant>,
    ) -> CrossingOutcome {
        if let Err(rejection) = self.gate.check(candidate) {
            log::debug!(
                "Entity {} crossing rejected: {}",
                candidate.id,
                rejection.as_str()
            );
            return CrossingOutcome::Invalid(rejection);
        }

        let Some(participant) = participant else {
            log::debug!("Entity {} is not tracked, ignoring crossing", candidate.id);
            return CrossingOutcome::Invalid(Rejection::UnknownParticipant);
        };

        if !participant.has_crossed_once() {
            participant.mark_first_crossing();
            log::debug!("Entity {} touched the finish line for the first time", candidate.id);
            return CrossingOutcome::FirstTouch;
        }

        CrossingOutcome::ValidCrossing
    }
}
