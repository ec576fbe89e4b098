use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, ensure};
use kartline::{
    EventLog, Participant, ParticipantId, ParticipantKind, RaceError, RaceEvent, RaceNotifier,
    RacePhase, RaceSession, Readiness, Subscription, VoteOutcome,
};

use crate::config::ServerConfig;
use crate::events::ServerEvent;
use crate::simulation::{Kart, detect_gate_entry, drive};
use crate::track::Track;

pub const HOST_ID: ParticipantId = 1;
const HOST_CLIENT: u64 = 0;
const FIRST_NPC_ID: ParticipantId = 1000;
const NPC_SPEED_STEP: f32 = 0.75;

pub struct RaceServer {
    config: ServerConfig,
    session: RaceSession,
    track: Track,
    karts: Vec<Kart>,
    race_events: Arc<EventLog>,
    _subscription: Subscription,
    pending_events: VecDeque<ServerEvent>,
    tick: u32,
    tick_duration: Duration,
    last_tick_time: Instant,
    accumulator: Duration,
    running: Arc<AtomicBool>,
    start_time: Instant,
    next_npc_id: ParticipantId,
    grid_votes: bool,
    finished_at: Option<Instant>,
    countdown_text: Option<String>,
}

impl RaceServer {
    pub fn new(config: ServerConfig) -> Result<Self> {
        ensure!(
            config.host_player || config.npc_count > 0,
            "no host seat and no NPCs, nobody could ever ready up"
        );

        let track = Track::oval(config.gate_directions);
        let notifier = RaceNotifier::new();
        let race_events = Arc::new(EventLog::new(config.event_log_capacity));
        let subscription = notifier.subscribe(race_events.clone());

        // Without a host the server votes for NPCs itself, after the grid is seated.
        let mut race = config.race.clone();
        let grid_votes = !config.host_player && race.npc_auto_ready;
        if grid_votes {
            race.npc_auto_ready = false;
        }
        let session = RaceSession::new(race, track.gate(), notifier);
        let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);

        let mut server = Self {
            session,
            track,
            karts: Vec::new(),
            race_events,
            _subscription: subscription,
            pending_events: VecDeque::new(),
            tick: 0,
            tick_duration,
            last_tick_time: Instant::now(),
            accumulator: Duration::ZERO,
            running: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
            next_npc_id: FIRST_NPC_ID,
            grid_votes,
            finished_at: None,
            countdown_text: None,
            config,
        };

        if server.config.host_player {
            server.spawn(Participant::player(HOST_ID, HOST_CLIENT).with_name("Host"))?;
        }
        for _ in 0..server.config.npc_count {
            server.seat_npc()?;
        }
        server.cast_grid_votes();
        server.collect_race_events();

        Ok(server)
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn session(&self) -> &RaceSession {
        &self.session
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_tick_time;
        self.last_tick_time = now;
        self.accumulator += delta;

        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.tick();
        }
    }

    pub fn tick(&mut self) {
        self.session.update(self.tick_duration);
        // Movement is switched on by the Go broadcast.
        self.collect_race_events();

        let dt = self.tick_duration.as_secs_f32();
        let mut entries = Vec::new();
        for kart in &mut self.karts {
            drive(kart, self.track.waypoints(), dt);
            if let Some(candidate) = detect_gate_entry(kart, &self.track) {
                entries.push(candidate);
            }
        }

        for candidate in entries {
            self.session.on_enter_finish_line(candidate);
        }
        self.collect_race_events();

        if self.session.phase() == RacePhase::Finished && self.finished_at.is_none() {
            self.finished_at = Some(Instant::now());
            for kart in &mut self.karts {
                kart.moving = false;
            }
        }

        self.tick = self.tick.wrapping_add(1);
    }

    pub fn ready_host(&mut self) {
        match self.session.on_ready_input(HOST_ID) {
            Ok(VoteOutcome::AlreadyReady) => self.warn("Host is already ready"),
            Ok(_) => {}
            Err(e) => self.warn(format!("Ready vote rejected: {}", e)),
        }
        self.collect_race_events();
    }

    pub fn spawn_npc(&mut self) -> Result<ParticipantId, RaceError> {
        let id = self.seat_npc()?;
        self.cast_grid_votes();
        self.collect_race_events();
        Ok(id)
    }

    pub fn reset_or_spawn_npc(&mut self) {
        match self.spawn_npc() {
            Ok(_) => {}
            Err(RaceError::JoinClosed) => {
                let Some(slot) = self.karts.iter().rposition(|k| k.kind == ParticipantKind::Npc) else {
                    self.warn("Grid is closed and there is no NPC to reset");
                    return;
                };
                let spawn = self.track.spawn_point(slot);
                let kart = &mut self.karts[slot];
                kart.return_to(spawn);
                let id = kart.id;
                self.warn(format!("Grid is closed, NPC {} sent back to its slot", id));
            }
            Err(e) => self.warn(format!("Cannot add NPC: {}", e)),
        }
    }

    pub fn restart_race(&mut self) {
        self.session.reset();
        for (slot, kart) in self.karts.iter_mut().enumerate() {
            kart.return_to(self.track.spawn_point(slot));
        }
        self.finished_at = None;
        self.countdown_text = None;
        self.cast_grid_votes();
        self.collect_race_events();
    }

    pub fn remove_newest_npc(&mut self) {
        let Some(index) = self.karts.iter().rposition(|k| k.kind == ParticipantKind::Npc) else {
            self.warn("No NPC to remove");
            return;
        };

        let kart = self.karts.remove(index);
        if self.session.on_participant_disconnected(kart.id).is_some() {
            self.pending_events
                .push_back(ServerEvent::ParticipantLeft { id: kart.id });
        }
        self.collect_race_events();
    }

    pub fn toggle_npc_movement(&mut self) {
        if self.session.phase() != RacePhase::Racing {
            self.warn("NPC movement can only be toggled during the race");
            return;
        }
        for kart in self.karts.iter_mut().filter(|k| k.kind == ParticipantKind::Npc) {
            kart.moving = !kart.moving;
        }
    }

    pub fn cancel_countdown(&mut self) {
        if !self.session.cancel_countdown() {
            self.warn("No countdown to cancel");
        }
        self.collect_race_events();
    }

    pub fn finished_for(&self) -> Option<Duration> {
        self.finished_at.map(|at| at.elapsed())
    }

    pub fn should_exit(&self) -> bool {
        self.finished_for()
            .is_some_and(|d| d >= Duration::from_secs(self.config.linger_secs))
    }

    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        let ids: Vec<ParticipantId> = self.karts.drain(..).map(|k| k.id).collect();
        for id in ids {
            self.session.on_participant_disconnected(id);
        }
        self.collect_race_events();
    }

    pub fn stats(&self) -> ServerStats {
        let session = &self.session;
        let standings = session
            .participants()
            .iter()
            .map(|p| Standing {
                id: p.id,
                name: p.name.clone(),
                kind: p.kind,
                laps: p.laps(),
                ready: session.is_ready(p.id),
                finished: session.finish_order().contains(&p.id),
            })
            .collect();

        let winner = session
            .winner()
            .and_then(|id| session.participants().get(id))
            .map(|p| p.name.clone());

        ServerStats {
            tick: self.tick,
            uptime_secs: self.start_time.elapsed().as_secs(),
            phase: session.phase(),
            readiness: session.readiness(),
            required_laps: session.required_laps(),
            countdown_text: self.countdown_text.clone(),
            winner,
            standings,
            snapshot_bytes: session.snapshot(self.tick).serialize().map_or(0, |b| b.len()),
        }
    }

    fn spawn(&mut self, participant: Participant) -> Result<(), RaceError> {
        let id = participant.id;
        let kind = participant.kind;
        self.session.join(participant)?;

        let slot = self.karts.len();
        let speed = self.config.npc_speed + slot as f32 * NPC_SPEED_STEP;
        self.karts
            .push(Kart::new(id, kind, self.track.spawn_point(slot), speed));
        self.pending_events
            .push_back(ServerEvent::ParticipantJoined { id, kind });
        Ok(())
    }

    fn seat_npc(&mut self) -> Result<ParticipantId, RaceError> {
        let id = self.next_npc_id;
        self.spawn(Participant::npc(id))?;
        self.next_npc_id += 1;
        Ok(id)
    }

    fn cast_grid_votes(&mut self) {
        if !self.grid_votes || self.session.is_countdown_started() {
            return;
        }
        let waiting: Vec<ParticipantId> = self
            .karts
            .iter()
            .filter(|k| k.kind == ParticipantKind::Npc && !self.session.is_ready(k.id))
            .map(|k| k.id)
            .collect();
        for id in waiting {
            if let Err(e) = self.session.on_ready_input(id) {
                log::warn!("Grid vote for NPC {} rejected: {}", id, e);
            }
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.pending_events.push_back(ServerEvent::Warning {
            message: message.into(),
        });
    }

    fn collect_race_events(&mut self) {
        for logged in self.race_events.drain() {
            match &logged.event {
                RaceEvent::MovementEnabled {
                    participant,
                    kind: ParticipantKind::Npc,
                } => {
                    if let Some(kart) = self.karts.iter_mut().find(|k| k.id == *participant) {
                        kart.moving = true;
                    }
                }
                RaceEvent::CountdownTick { text } => self.countdown_text = Some(text.clone()),
                RaceEvent::CountdownCancelled
                | RaceEvent::CountdownHidden
                | RaceEvent::RaceReset => {
                    self.countdown_text = None;
                }
                _ => {}
            }
            self.pending_events.push_back(ServerEvent::Race(logged.event));
        }
    }
}

#[derive(Debug, Clone)]
pub struct Standing {
    pub id: ParticipantId,
    pub name: String,
    pub kind: ParticipantKind,
    pub laps: u32,
    pub ready: bool,
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub tick: u32,
    pub uptime_secs: u64,
    pub phase: RacePhase,
    pub readiness: Readiness,
    pub required_laps: u32,
    pub countdown_text: Option<String>,
    pub winner: Option<String>,
    pub standings: Vec<Standing>,
    pub snapshot_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(npc_count: usize, host_player: bool) -> ServerConfig {
        ServerConfig {
            npc_count,
            host_player,
            npc_speed: 20.0,
            ..Default::default()
        }
    }

    #[test]
    fn host_blocks_start_until_ready() {
        let mut server = RaceServer::new(config(2, true)).unwrap();
        for _ in 0..300 {
            server.tick();
        }
        assert_eq!(server.session().phase(), RacePhase::AwaitingReady);
        assert_eq!(server.stats().readiness.awaiting(), 1);

        server.ready_host();
        assert_eq!(server.session().phase(), RacePhase::CountingDown(3));
        for _ in 0..(60 * 3 + 10) {
            server.tick();
        }
        assert_eq!(server.session().phase(), RacePhase::Racing);
        for kart in &server.karts {
            assert_eq!(kart.moving, kart.kind == ParticipantKind::Npc);
        }
    }

    #[test]
    fn npc_race_runs_to_a_winner() {
        let mut server = RaceServer::new(config(2, false)).unwrap();
        for _ in 0..(60 * 120) {
            server.tick();
            if server.session().phase() == RacePhase::Finished {
                break;
            }
        }

        assert_eq!(server.session().phase(), RacePhase::Finished);
        let stats = server.stats();
        assert!(stats.winner.is_some());
        assert!(stats.standings.iter().any(|s| s.laps == 3));

        let events: Vec<ServerEvent> = server.drain_events().collect();
        let winners = events
            .iter()
            .filter(|e| matches!(e, ServerEvent::Race(RaceEvent::Winner { .. })))
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn spawning_after_countdown_is_refused() {
        let mut server = RaceServer::new(config(1, false)).unwrap();
        assert!(server.session().is_countdown_started());
        assert_eq!(server.spawn_npc(), Err(RaceError::JoinClosed));
        assert_eq!(server.karts.len(), 1);
    }

    #[test]
    fn empty_grid_without_host_is_refused() {
        assert!(RaceServer::new(config(0, false)).is_err());
    }

    #[test]
    fn late_npc_votes_when_there_is_no_host() {
        let mut server = RaceServer::new(config(2, false)).unwrap();
        server.cancel_countdown();
        assert_eq!(server.session().phase(), RacePhase::AwaitingReady);

        let id = server.spawn_npc().unwrap();
        assert!(server.session().is_ready(id));
        assert!(server.session().is_countdown_started());
        for _ in 0..(60 * 3 + 10) {
            server.tick();
        }
        assert_eq!(server.session().phase(), RacePhase::Racing);
    }

    #[test]
    fn closed_grid_parks_the_newest_npc() {
        let mut server = RaceServer::new(config(2, true)).unwrap();
        server.ready_host();
        for _ in 0..(60 * 5) {
            server.tick();
        }
        let newest = server.karts.len() - 1;
        assert!(server.karts[newest].moving);

        server.reset_or_spawn_npc();
        assert_eq!(server.karts.len(), 3);
        assert!(!server.karts[newest].moving);
        assert_eq!(server.karts[newest].position, server.track.spawn_point(newest));
        assert!(server.karts[newest - 1].moving);
    }

    #[test]
    fn restart_puts_everyone_back_on_the_grid() {
        let mut server = RaceServer::new(config(2, false)).unwrap();
        for _ in 0..(60 * 120) {
            server.tick();
            if server.session().phase() == RacePhase::Finished {
                break;
            }
        }
        assert_eq!(server.session().phase(), RacePhase::Finished);

        server.restart_race();
        assert!(server.finished_for().is_none());
        for (slot, kart) in server.karts.iter().enumerate() {
            assert_eq!(kart.position, server.track.spawn_point(slot));
            assert!(!kart.moving);
        }
        assert!(server.stats().standings.iter().all(|s| s.laps == 0 && !s.finished));
        assert!(server.session().is_countdown_started());

        for _ in 0..(60 * 120) {
            server.tick();
            if server.session().phase() == RacePhase::Finished {
                break;
            }
        }
        assert!(server.stats().winner.is_some());
    }

    #[test]
    fn removing_npc_updates_readiness() {
        let mut server = RaceServer::new(config(2, true)).unwrap();
        assert_eq!(server.stats().readiness, Readiness::new(2, 3));
        server.remove_newest_npc();
        assert_eq!(server.stats().readiness, Readiness::new(1, 2));
        assert_eq!(server.karts.len(), 2);
    }
}
