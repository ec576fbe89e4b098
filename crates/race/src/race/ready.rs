use std::collections::BTreeSet;
use std::fmt;

use crate::error::RaceError;
use crate::participant::ParticipantId;

use super::settings::ReadyMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Ready,
    AlreadyReady,
    Retracted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub ready: usize,
    pub expected: usize,
}

impl Readiness {
    pub fn new(ready: usize, expected: usize) -> Self {
        Self { ready, expected }
    }

    pub fn is_complete(&self) -> bool {
        self.expected > 0 && self.ready == self.expected
    }

    pub fn awaiting(&self) -> usize {
        self.expected.saturating_sub(self.ready)
    }

    pub fn label(&self) -> String {
        format!("{}/{} Ready", self.ready, self.expected)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected == 0 {
            write!(f, "awaiting participants")
        } else if self.is_complete() {
            write!(f, "all {} participants ready", self.expected)
        } else {
            write!(
                f,
                "awaiting {} more ready votes ({}/{})",
                self.awaiting(),
                self.ready,
                self.expected
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadyRoster {
    mode: ReadyMode,
    votes: BTreeSet<ParticipantId>,
    closed: bool,
}

impl ReadyRoster {
    pub fn new(mode: ReadyMode) -> Self {
        Self {
            mode,
            votes: BTreeSet::new(),
            closed: false,
        }
    }

    pub fn mode(&self) -> ReadyMode {
        self.mode
    }

    pub fn vote(&mut self, id: ParticipantId) -> Result<VoteOutcome, RaceError> {
        if self.closed {
            return Err(RaceError::VotingClosed);
        }

        if !self.votes.insert(id) {
            return Ok(match self.mode {
                ReadyMode::OneShot => VoteOutcome::AlreadyReady,
                ReadyMode::Toggle => {
                    self.votes.remove(&id);
                    VoteOutcome::Retracted
                }
            });
        }

        Ok(VoteOutcome::Ready)
    }

    pub fn is_ready(&self, id: ParticipantId) -> bool {
        self.votes.contains(&id)
    }

    pub fn forget(&mut self, id: ParticipantId) -> bool {
        self.votes.remove(&id)
    }

    pub fn retain(&mut self, keep: impl FnMut(&ParticipantId) -> bool) {
        self.votes.retain(keep);
    }

    pub fn count(&self) -> usize {
        self.votes.len()
    }

    pub fn readiness(&self, expected: usize) -> Readiness {
        Readiness::new(self.votes.len(), expected)
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn reopen(&mut self) {
        self.closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn clear(&mut self) {
        self.votes.clear();
        self.closed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_ignores_repeat_votes() {
        let mut roster = ReadyRoster::new(ReadyMode::OneShot);
        assert_eq!(roster.vote(1), Ok(VoteOutcome::Ready));
        assert_eq!(roster.vote(1), Ok(VoteOutcome::AlreadyReady));
        assert_eq!(roster.count(), 1);
    }

    #[test]
    fn toggle_retracts() {
        let mut roster = ReadyRoster::new(ReadyMode::Toggle);
        assert_eq!(roster.vote(1), Ok(VoteOutcome::Ready));
        assert_eq!(roster.vote(1), Ok(VoteOutcome::Retracted));
        assert!(!roster.is_ready(1));
        assert_eq!(roster.vote(1), Ok(VoteOutcome::Ready));
    }

    #[test]
    fn closed_roster_rejects() {
        let mut roster = ReadyRoster::new(ReadyMode::OneShot);
        roster.close();
        assert_eq!(roster.vote(3), Err(RaceError::VotingClosed));
        roster.reopen();
        assert!(roster.vote(3).is_ok());
    }

    #[test]
    fn clear_drops_votes_and_reopens() {
        let mut roster = ReadyRoster::new(ReadyMode::OneShot);
        roster.vote(1).unwrap();
        roster.close();

        roster.clear();
        assert_eq!(roster.count(), 0);
        assert!(!roster.is_closed());
        assert_eq!(roster.vote(1), Ok(VoteOutcome::Ready));
    }

    #[test]
    fn readiness_reporting() {
        let stalled = Readiness::new(1, 2);
        assert!(!stalled.is_complete());
        assert_eq!(stalled.awaiting(), 1);
        assert_eq!(stalled.to_string(), "awaiting 1 more ready votes (1/2)");
        assert_eq!(stalled.label(), "1/2 Ready");

        assert!(Readiness::new(2, 2).is_complete());
        assert!(!Readiness::new(0, 0).is_complete());
    }
}
