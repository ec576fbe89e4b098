use std::time::Duration;

use crate::error::RaceError;
use crate::event::{RaceEvent, RaceNotifier};
use crate::gate::{CrossingCandidate, CrossingOutcome, CrossingValidator, FinishLineGate};
use crate::participant::{Participant, ParticipantId, ParticipantKind, ParticipantRegistry};
use crate::replication::{ParticipantState, RaceSnapshot};

use super::countdown::{Countdown, CountdownStep};
use super::laps::{LapTracker, LapUpdate};
use super::ready::{ReadyRoster, Readiness, VoteOutcome};
use super::settings::{RaceSettings, WinPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RacePhase {
    Idle,
    AwaitingReady,
    CountingDown(u8),
    Racing,
    Finished,
}

impl RacePhase {
    pub fn code(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::AwaitingReady => 1,
            Self::CountingDown(_) => 2,
            Self::Racing => 3,
            Self::Finished => 4,
        }
    }

    pub fn from_code(code: u8, countdown: u8) -> Self {
        match code {
            1 => Self::AwaitingReady,
            2 => Self::CountingDown(countdown),
            3 => Self::Racing,
            4 => Self::Finished,
            _ => Self::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingReady => "awaiting ready",
            Self::CountingDown(_) => "counting down",
            Self::Racing => "racing",
            Self::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossingReport {
    pub outcome: CrossingOutcome,
    pub lap: Option<LapUpdate>,
}

#[derive(Debug)]
pub struct RaceSession {
    settings: RaceSettings,
    registry: ParticipantRegistry,
    validator: CrossingValidator,
    laps: LapTracker,
    ready: ReadyRoster,
    countdown: Option<Countdown>,
    countdown_started: bool,
    phase: RacePhase,
    notifier: RaceNotifier,
}

impl RaceSession {
    pub fn new(settings: RaceSettings, gate: FinishLineGate, notifier: RaceNotifier) -> Self {
        Self {
            registry: ParticipantRegistry::new(),
            validator: CrossingValidator::new(gate),
            laps: LapTracker::new(settings.required_laps, settings.win_policy),
            ready: ReadyRoster::new(settings.ready_mode),
            countdown: None,
            countdown_started: false,
            phase: RacePhase::Idle,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &RaceSettings {
        &self.settings
    }

    pub fn notifier(&self) -> &RaceNotifier {
        &self.notifier
    }

    pub fn gate(&self) -> &FinishLineGate {
        self.validator.gate()
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    pub fn participants(&self) -> &ParticipantRegistry {
        &self.registry
    }

    pub fn laps(&self, id: ParticipantId) -> Option<u32> {
        self.registry.laps(id)
    }

    pub fn required_laps(&self) -> u32 {
        self.laps.required()
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.laps.winner()
    }

    pub fn finish_order(&self) -> &[ParticipantId] {
        self.laps.finish_order()
    }

    pub fn is_ready(&self, id: ParticipantId) -> bool {
        self.ready.is_ready(id)
    }

    pub fn is_countdown_started(&self) -> bool {
        self.countdown_started
    }

    pub fn readiness(&self) -> Readiness {
        self.ready.readiness(self.registry.len())
    }

    pub fn on_participant_connected(
        &mut self,
        id: ParticipantId,
        kind: ParticipantKind,
    ) -> Result<(), RaceError> {
        self.join(Participant::new(id, kind))
    }

    pub fn join(&mut self, participant: Participant) -> Result<(), RaceError> {
        if self.countdown_started {
            return Err(RaceError::JoinClosed);
        }

        let id = participant.id;
        let kind = participant.kind;
        self.registry.insert(participant)?;
        log::info!("{} {} joined the session", kind, id);

        if kind == ParticipantKind::Npc && self.settings.npc_auto_ready {
            self.ready.vote(id)?;
        }

        if self.phase == RacePhase::Idle {
            self.phase = RacePhase::AwaitingReady;
        }

        self.announce_readiness();
        self.check_readiness();
        Ok(())
    }

    pub fn on_participant_disconnected(&mut self, id: ParticipantId) -> Option<Participant> {
        let participant = self.registry.remove(id)?;
        self.ready.forget(id);
        log::info!("{} {} left the session", participant.kind, id);

        match self.phase {
            RacePhase::Idle | RacePhase::AwaitingReady => {
                if self.registry.is_empty() {
                    self.phase = RacePhase::Idle;
                }
                self.announce_readiness();
                self.check_readiness();
            }
            RacePhase::CountingDown(_) if self.registry.is_empty() => {
                log::info!("Everyone left before the start");
                self.abort_countdown();
            }
            RacePhase::Racing if self.registry.is_empty() => {
                log::info!("Everyone left mid-race");
                self.laps.close();
                self.finish();
            }
            RacePhase::Racing => self.finish_if_everyone_done(),
            RacePhase::CountingDown(_) | RacePhase::Finished => {}
        }

        Some(participant)
    }

    pub fn on_ready_input(&mut self, id: ParticipantId) -> Result<VoteOutcome, RaceError> {
        if !self.registry.contains(id) {
            return Err(RaceError::UnknownParticipant(id));
        }

        let outcome = self.ready.vote(id)?;
        if outcome != VoteOutcome::AlreadyReady {
            log::info!("Participant {} vote: {:?} ({})", id, outcome, self.readiness());
            self.announce_readiness();
            self.check_readiness();
        }
        Ok(outcome)
    }

    pub fn on_enter_finish_line(&mut self, candidate: CrossingCandidate) -> CrossingReport {
        let outcome = self
            .validator
            .validate(&candidate, self.registry.get_mut(candidate.id));

        let mut report = CrossingReport { outcome, lap: None };
        if !outcome.counts() {
            return report;
        }

        if self.phase != RacePhase::Racing {
            log::debug!(
                "Crossing by {} ignored while {}",
                candidate.id,
                self.phase.as_str()
            );
            return report;
        }

        let Some(participant) = self.registry.get_mut(candidate.id) else {
            return report;
        };

        let update = match self.laps.record_crossing(participant) {
            Ok(update) => update,
            Err(e) => {
                log::debug!("Crossing by {} not counted: {}", candidate.id, e);
                return report;
            }
        };
        let kind = participant.kind;
        let name = participant.name.clone();

        log::info!(
            "Participant {} reached the finish line! Lap {}/{}",
            update.participant,
            update.new_count,
            update.required
        );
        self.notifier.notify(RaceEvent::LapUpdated {
            participant: update.participant,
            current: update.new_count,
            required: update.required,
        });

        if update.won_race {
            log::info!("{} wins the race!", name);
            self.notifier.notify(RaceEvent::Winner {
                participant: update.participant,
                kind,
                name,
            });
        }

        if self.laps.is_closed() {
            self.finish();
        } else {
            self.finish_if_everyone_done();
        }

        report.lap = Some(update);
        report
    }

    pub fn update(&mut self, dt: Duration) {
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };

        let steps = countdown.advance(dt);
        if countdown.is_finished() {
            self.countdown = None;
        }

        for step in steps {
            self.apply_countdown_step(step);
        }
    }

    pub fn cancel_countdown(&mut self) -> bool {
        let cancellable = self.countdown.as_ref().is_some_and(Countdown::can_cancel);
        if !cancellable {
            return false;
        }
        self.abort_countdown();
        true
    }

    /// Clears laps, first touches, votes and results; everyone stays seated.
    pub fn reset(&mut self) {
        self.countdown = None;
        self.countdown_started = false;
        self.laps.reset();
        self.ready.clear();
        for participant in self.registry.iter_mut() {
            participant.reset_progress();
        }
        self.phase = if self.registry.is_empty() {
            RacePhase::Idle
        } else {
            RacePhase::AwaitingReady
        };

        log::info!("Race reset with {} participants", self.registry.len());
        self.notifier.notify(RaceEvent::RaceReset);
        let required = self.laps.required();
        for participant in self.registry.iter() {
            self.notifier.notify(RaceEvent::LapUpdated {
                participant: participant.id,
                current: 0,
                required,
            });
        }

        if self.settings.npc_auto_ready {
            let npcs: Vec<ParticipantId> = self
                .registry
                .iter()
                .filter(|p| p.is_npc())
                .map(|p| p.id)
                .collect();
            for id in npcs {
                let _ = self.ready.vote(id);
            }
        }
        self.announce_readiness();
        self.check_readiness();
    }

    pub fn snapshot(&self, sequence: u32) -> RaceSnapshot {
        let readiness = self.readiness();
        let countdown = match self.phase {
            RacePhase::CountingDown(n) => n,
            _ => 0,
        };

        RaceSnapshot {
            sequence,
            phase: self.phase.code(),
            countdown,
            required_laps: self.laps.required(),
            ready: readiness.ready as u32,
            expected: readiness.expected as u32,
            winner: self.laps.winner(),
            participants: self
                .registry
                .iter()
                .map(|p| ParticipantState {
                    id: p.id,
                    kind: p.kind as u8,
                    laps: p.laps(),
                    finished: self.laps.has_finished(p.id),
                })
                .collect(),
        }
    }

    fn abort_countdown(&mut self) {
        self.countdown = None;
        self.countdown_started = false;
        self.ready.reopen();
        let registry = &self.registry;
        self.ready
            .retain(|id| registry.get(*id).is_some_and(Participant::is_npc));
        self.phase = if self.registry.is_empty() {
            RacePhase::Idle
        } else {
            RacePhase::AwaitingReady
        };

        log::info!("Countdown cancelled ({})", self.readiness());
        self.notifier.notify(RaceEvent::CountdownCancelled);
        self.announce_readiness();
    }

    fn announce_readiness(&self) {
        let readiness = self.readiness();
        self.notifier.notify(RaceEvent::ReadyChanged {
            ready: readiness.ready,
            expected: readiness.expected,
        });
    }

    fn check_readiness(&mut self) {
        if self.countdown_started {
            return;
        }

        let readiness = self.readiness();
        if readiness.is_complete() {
            self.start_countdown();
        } else {
            log::debug!("Session {}", readiness);
        }
    }

    fn start_countdown(&mut self) {
        self.countdown_started = true;
        self.ready.close();
        self.countdown = Some(Countdown::new(
            self.settings.countdown_from,
            self.settings.tick_interval(),
            self.settings.hide_delay(),
        ));
        log::info!("All {} participants ready, starting countdown", self.registry.len());
        self.update(Duration::ZERO);
    }

    fn apply_countdown_step(&mut self, step: CountdownStep) {
        match step {
            CountdownStep::Tick(n) => {
                self.phase = RacePhase::CountingDown(n);
                self.notifier.notify(RaceEvent::countdown_tick(n.to_string()));
            }
            CountdownStep::Go => {
                self.phase = RacePhase::Racing;
                self.notifier.notify(RaceEvent::countdown_tick("Go!"));
                log::info!("Race started with {} participants", self.registry.len());
                for participant in self.registry.iter() {
                    self.notifier.notify(RaceEvent::MovementEnabled {
                        participant: participant.id,
                        kind: participant.kind,
                    });
                }
            }
            CountdownStep::Hide => self.notifier.notify(RaceEvent::CountdownHidden),
        }
    }

    fn finish_if_everyone_done(&mut self) {
        if self.laps.policy() != WinPolicy::FinishParticipant || self.phase != RacePhase::Racing {
            return;
        }
        let everyone_done = !self.registry.is_empty()
            && self.registry.ids().all(|id| self.laps.has_finished(id));
        if everyone_done {
            self.laps.close();
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.phase == RacePhase::Finished {
            return;
        }
        self.phase = RacePhase::Finished;
        log::info!("Race over, finish order: {:?}", self.laps.finish_order());
        self.notifier.notify(RaceEvent::RaceFinished);
    }
}
