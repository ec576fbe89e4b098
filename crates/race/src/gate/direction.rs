use glam::Vec3;

pub const DIRECTION_THRESHOLD: f32 = 0.5;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AllowedDirection: u8 {
        const FORWARD = 1 << 0;
        const BACKWARD = 1 << 1;
        const RIGHT = 1 << 2;
        const LEFT = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const ANY = Self::FORWARD.bits()
            | Self::BACKWARD.bits()
            | Self::RIGHT.bits()
            | Self::LEFT.bits()
            | Self::UP.bits()
            | Self::DOWN.bits();
    }
}

const AXES: [(AllowedDirection, Vec3); 6] = [
    (AllowedDirection::FORWARD, Vec3::Z),
    (AllowedDirection::BACKWARD, Vec3::NEG_Z),
    (AllowedDirection::RIGHT, Vec3::X),
    (AllowedDirection::LEFT, Vec3::NEG_X),
    (AllowedDirection::UP, Vec3::Y),
    (AllowedDirection::DOWN, Vec3::NEG_Y),
];

impl AllowedDirection {
    pub fn parse_label(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(Self::FORWARD),
            "backward" => Some(Self::BACKWARD),
            "right" => Some(Self::RIGHT),
            "left" => Some(Self::LEFT),
            "up" => Some(Self::UP),
            "down" => Some(Self::DOWN),
            "any" => Some(Self::ANY),
            _ => None,
        }
    }

    pub fn axes(self) -> impl Iterator<Item = Vec3> {
        AXES.into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, axis)| axis)
    }

    pub fn permits(self, heading: Vec3) -> bool {
        let heading = heading.normalize_or_zero();
        if heading == Vec3::ZERO {
            return false;
        }
        self.axes().any(|axis| heading.dot(axis) > DIRECTION_THRESHOLD)
    }
}
