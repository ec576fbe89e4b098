use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use proptest::prelude::*;

use kartline::{
    AllowedDirection, CrossingCandidate, CrossingOutcome, EventLog, FinishLineGate, Participant,
    ParticipantKind, RaceEvent, RaceNotifier, RacePhase, RaceSession, RaceSettings, RaceView,
    RaceSnapshot, WinPolicy,
};

const SECOND: Duration = Duration::from_secs(1);

fn gate() -> FinishLineGate {
    FinishLineGate::new(Vec3::new(0.0, 0.0, 50.0), Vec3::Z)
}

fn behind_gate(id: u64, tag: &str) -> CrossingCandidate {
    CrossingCandidate::new(id, Vec3::new(1.0, 0.0, 49.2), Vec3::Z, tag)
}

fn ahead_of_gate(id: u64) -> CrossingCandidate {
    CrossingCandidate::new(id, Vec3::new(1.0, 0.0, 50.8), Vec3::Z, "Player")
}

fn ready_and_go(session: &mut RaceSession) {
    let players: Vec<u64> = session
        .participants()
        .iter()
        .filter(|p| p.kind == ParticipantKind::Player && !session.is_ready(p.id))
        .map(|p| p.id)
        .collect();
    for id in players {
        session.on_ready_input(id).unwrap();
    }
    for _ in 0..3 {
        session.update(SECOND);
    }
    assert_eq!(session.phase(), RacePhase::Racing);
}

#[test]
fn test_full_race_with_npc_and_two_players() {
    let notifier = RaceNotifier::new();
    let log = Arc::new(EventLog::new(512));
    let _subscription = notifier.subscribe(log.clone());

    let mut session = RaceSession::new(RaceSettings::default(), gate(), notifier);
    session
        .join(Participant::player(100, 1).with_name("Host"))
        .unwrap();
    session.join(Participant::player(101, 2)).unwrap();
    session.join(Participant::npc(500)).unwrap();

    assert_eq!(session.readiness().to_string(), "awaiting 2 more ready votes (1/3)");
    ready_and_go(&mut session);

    let enabled: Vec<u64> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            RaceEvent::MovementEnabled { participant, .. } => Some(*participant),
            _ => None,
        })
        .collect();
    assert_eq!(enabled, vec![100, 101, 500]);

    // Everyone touches once after leaving the grid.
    for (id, tag) in [(100, "Player"), (101, "Player2"), (500, "NPC")] {
        assert_eq!(
            session.on_enter_finish_line(behind_gate(id, tag)).outcome,
            CrossingOutcome::FirstTouch
        );
    }

    for _ in 0..2 {
        session.on_enter_finish_line(behind_gate(500, "NPC"));
        session.on_enter_finish_line(behind_gate(101, "Player2"));
    }
    session.on_enter_finish_line(ahead_of_gate(100));
    let winning = session.on_enter_finish_line(behind_gate(101, "Player2"));

    assert!(winning.lap.unwrap().won_race);
    assert_eq!(session.winner(), Some(101));
    assert_eq!(session.phase(), RacePhase::Finished);
    assert_eq!(session.laps(100), Some(0));
    assert_eq!(session.laps(500), Some(2));

    let tail: Vec<RaceEvent> = log.events().into_iter().rev().take(3).collect();
    assert_eq!(tail[0], RaceEvent::RaceFinished);
    assert_eq!(
        tail[1],
        RaceEvent::Winner {
            participant: 101,
            kind: ParticipantKind::Player,
            name: "Player 101".to_string(),
        }
    );
    assert_eq!(
        tail[2],
        RaceEvent::LapUpdated {
            participant: 101,
            current: 3,
            required: 3,
        }
    );
}

#[test]
fn test_observer_replica_follows_authority() {
    let mut session = RaceSession::new(RaceSettings::default(), gate(), RaceNotifier::new());
    let mut view = RaceView::new();

    session.on_participant_connected(1, ParticipantKind::Player).unwrap();
    session.on_participant_connected(2, ParticipantKind::Player).unwrap();
    session.on_ready_input(2).unwrap();

    let bytes = session.snapshot(1).serialize().unwrap();
    assert!(view.apply_bytes(&bytes).unwrap());
    assert_eq!(view.phase(), RacePhase::AwaitingReady);
    assert_eq!(view.readiness().awaiting(), 1);

    ready_and_go(&mut session);
    session.on_enter_finish_line(behind_gate(1, "Player"));
    session.on_enter_finish_line(behind_gate(1, "Player"));

    let newer = session.snapshot(2);
    let stale = session.snapshot(1);
    assert!(view.apply(newer));
    assert!(!view.apply(stale));
    assert_eq!(view.laps(1), Some(1));
    assert_eq!(view.kind(2), Some(ParticipantKind::Player));
    assert_eq!(view.phase(), RacePhase::Racing);
}

#[test]
fn test_disconnect_mid_race_keeps_others_scoring() {
    let settings = RaceSettings {
        required_laps: 2,
        win_policy: WinPolicy::FinishParticipant,
        ..Default::default()
    };
    let mut session = RaceSession::new(settings, gate(), RaceNotifier::new());
    session.on_participant_connected(1, ParticipantKind::Player).unwrap();
    session.on_participant_connected(2, ParticipantKind::Player).unwrap();
    ready_and_go(&mut session);

    for id in [1, 2] {
        session.on_enter_finish_line(behind_gate(id, "Player"));
    }
    session.on_enter_finish_line(behind_gate(1, "Player"));
    session.on_enter_finish_line(behind_gate(1, "Player"));
    assert_eq!(session.winner(), Some(1));
    assert_eq!(session.phase(), RacePhase::Racing);

    let gone = session.on_participant_disconnected(2).unwrap();
    assert_eq!(gone.laps(), 0);
    assert_eq!(session.phase(), RacePhase::Finished);
}

#[test]
fn test_restricted_gate_accepts_only_allowed_headings() {
    let gate = gate().with_restriction(AllowedDirection::FORWARD | AllowedDirection::RIGHT);
    let mut session = RaceSession::new(RaceSettings::default(), gate, RaceNotifier::new());
    session.on_participant_connected(1, ParticipantKind::Player).unwrap();
    ready_and_go(&mut session);

    let heading = |dir: Vec3| CrossingCandidate::new(1, Vec3::new(0.0, 0.0, 49.0), dir, "Player");

    assert!(matches!(
        session.on_enter_finish_line(heading(Vec3::NEG_X)).outcome,
        CrossingOutcome::Invalid(_)
    ));
    assert_eq!(
        session.on_enter_finish_line(heading(Vec3::X)).outcome,
        CrossingOutcome::FirstTouch
    );
    assert_eq!(
        session.on_enter_finish_line(heading(Vec3::new(0.2, 0.0, 1.0))).outcome,
        CrossingOutcome::ValidCrossing
    );
    assert_eq!(session.laps(1), Some(1));
}

#[test]
fn test_snapshot_survives_serialization() {
    let mut session = RaceSession::new(RaceSettings::default(), gate(), RaceNotifier::new());
    session.on_participant_connected(3, ParticipantKind::Npc).unwrap();

    let snapshot = session.snapshot(9);
    let decoded = RaceSnapshot::deserialize(&snapshot.serialize().unwrap()).unwrap();
    assert_eq!(decoded, snapshot);
    assert_eq!(RacePhase::from_code(decoded.phase, decoded.countdown), RacePhase::CountingDown(3));
}

#[derive(Debug, Clone)]
enum Touch {
    Behind(u64),
    Ahead(u64),
    Backward(u64),
}

fn touch_strategy() -> impl Strategy<Value = Touch> {
    (0u8..3, 1u64..4).prop_map(|(kind, id)| match kind {
        0 => Touch::Behind(id),
        1 => Touch::Ahead(id),
        _ => Touch::Backward(id),
    })
}

proptest! {
    #[test]
    fn laps_never_decrease_and_step_by_one(touches in prop::collection::vec(touch_strategy(), 0..80)) {
        let settings = RaceSettings {
            required_laps: 5,
            win_policy: WinPolicy::FinishParticipant,
            ..Default::default()
        };
        let gate = gate().with_restriction(AllowedDirection::FORWARD);
        let mut session = RaceSession::new(settings, gate, RaceNotifier::new());
        for id in 1..4 {
            session.on_participant_connected(id, ParticipantKind::Player).unwrap();
        }
        ready_and_go(&mut session);

        let mut first_touches = 0;
        let mut wins = 0;
        for touch in touches {
            let (id, candidate) = match touch {
                Touch::Behind(id) => (id, behind_gate(id, "Player")),
                Touch::Ahead(id) => (id, ahead_of_gate(id)),
                Touch::Backward(id) => (
                    id,
                    CrossingCandidate::new(id, Vec3::new(0.0, 0.0, 49.0), Vec3::NEG_Z, "Player"),
                ),
            };

            let before = session.laps(id).unwrap();
            let report = session.on_enter_finish_line(candidate);
            let after = session.laps(id).unwrap();

            prop_assert!(after >= before);
            match report.lap {
                Some(update) => {
                    prop_assert_eq!(after, before + 1);
                    prop_assert_eq!(update.new_count, after);
                    if update.won_race {
                        wins += 1;
                    }
                }
                None => {
                    prop_assert_eq!(after, before);
                }
            }
            if report.outcome == CrossingOutcome::FirstTouch {
                first_touches += 1;
            }
            prop_assert!(after <= 5);
        }

        prop_assert!(first_touches <= 3);
        prop_assert!(wins <= 1);
    }
}
