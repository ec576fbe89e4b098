use glam::{Quat, Vec3};

use kartline::{CrossingCandidate, ParticipantId, ParticipantKind};

use crate::track::Track;

const WAYPOINT_REACHED: f32 = 0.1;
const ROTATION_SPEED: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct Kart {
    pub id: ParticipantId,
    pub kind: ParticipantKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub speed: f32,
    pub moving: bool,
    next_waypoint: usize,
    in_trigger: bool,
}

impl Kart {
    pub fn new(id: ParticipantId, kind: ParticipantKind, position: Vec3, speed: f32) -> Self {
        Self {
            id,
            kind,
            position,
            rotation: Quat::IDENTITY,
            speed,
            moving: false,
            next_waypoint: 0,
            in_trigger: false,
        }
    }

    pub fn return_to(&mut self, position: Vec3) {
        self.position = position;
        self.rotation = Quat::IDENTITY;
        self.moving = false;
        self.next_waypoint = 0;
        self.in_trigger = false;
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn tag(&self) -> &'static str {
        match self.kind {
            ParticipantKind::Player => "Player",
            ParticipantKind::Npc => "NPC",
        }
    }
}

fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let to_target = target - current;
    let distance = to_target.length();
    if distance <= max_delta || distance == 0.0 {
        target
    } else {
        current + to_target / distance * max_delta
    }
}

pub fn drive(kart: &mut Kart, waypoints: &[Vec3], dt: f32) {
    if !kart.moving || waypoints.is_empty() {
        return;
    }

    let waypoint = waypoints[kart.next_waypoint % waypoints.len()];
    let target = Vec3::new(waypoint.x, kart.position.y, waypoint.z);
    let direction = target - kart.position;

    kart.position = move_towards(kart.position, target, kart.speed * dt);

    if direction.length_squared() > 0.01 {
        let facing = Quat::from_rotation_arc(Vec3::Z, direction.normalize());
        kart.rotation = kart
            .rotation
            .slerp(facing, (ROTATION_SPEED * dt).min(1.0))
            .normalize();
    }

    if kart.position.distance(target) < WAYPOINT_REACHED {
        kart.next_waypoint = (kart.next_waypoint + 1) % waypoints.len();
    }
}

pub fn detect_gate_entry(kart: &mut Kart, track: &Track) -> Option<CrossingCandidate> {
    let inside = track.trigger_contains(kart.position);
    let entered = inside && !kart.in_trigger;
    kart.in_trigger = inside;

    entered.then(|| CrossingCandidate::new(kart.id, kart.position, kart.forward(), kart.tag()))
}
