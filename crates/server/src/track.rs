use glam::Vec3;
use kartline::{AllowedDirection, FinishLineGate};

pub struct Track {
    waypoints: Vec<Vec3>,
    gate: FinishLineGate,
    trigger_half_extents: Vec3,
}

impl Default for Track {
    fn default() -> Self {
        Self::oval(None)
    }
}

impl Track {
    const STRAIGHT: f32 = 25.0;
    const WIDTH: f32 = 30.0;
    const GRID_Z: f32 = -4.0;
    const GRID_ROW_GAP: f32 = 3.0;
    const GRID_LANE: f32 = 1.5;

    pub fn oval(restriction: Option<AllowedDirection>) -> Self {
        let s = Self::STRAIGHT;
        let w = Self::WIDTH;
        let waypoints = vec![
            Vec3::new(0.0, 0.0, s),
            Vec3::new(w * 0.5, 0.0, s + 15.0),
            Vec3::new(w, 0.0, s),
            Vec3::new(w, 0.0, -s),
            Vec3::new(w * 0.5, 0.0, -s - 15.0),
            Vec3::new(0.0, 0.0, -s),
        ];

        let mut gate = FinishLineGate::new(Vec3::ZERO, Vec3::Z);
        if let Some(allowed) = restriction {
            gate = gate.with_restriction(allowed);
        }

        Self {
            waypoints,
            gate,
            trigger_half_extents: Vec3::new(6.0, 3.0, 1.5),
        }
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn gate(&self) -> FinishLineGate {
        self.gate
    }

    pub fn trigger_contains(&self, position: Vec3) -> bool {
        let offset = (position - self.gate.position()).abs();
        offset.cmple(self.trigger_half_extents).all()
    }

    pub fn spawn_point(&self, slot: usize) -> Vec3 {
        let row = (slot / 2) as f32;
        let lane = if slot % 2 == 0 { -Self::GRID_LANE } else { Self::GRID_LANE };
        Vec3::new(lane, 0.0, Self::GRID_Z - row * Self::GRID_ROW_GAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_behind_and_outside_the_trigger() {
        let track = Track::default();
        for slot in 0..8 {
            let spawn = track.spawn_point(slot);
            assert!(!track.trigger_contains(spawn));
            assert!(track.gate().is_behind(spawn));
        }
    }

    #[test]
    fn trigger_straddles_the_line() {
        let track = Track::default();
        assert!(track.trigger_contains(Vec3::new(0.0, 0.5, -1.0)));
        assert!(track.trigger_contains(Vec3::new(2.0, 0.5, 1.0)));
        assert!(!track.trigger_contains(Vec3::new(0.0, 0.0, 3.0)));
        assert!(!track.trigger_contains(Vec3::new(10.0, 0.0, 0.0)));
    }
}
