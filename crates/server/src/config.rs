use std::path::Path;

use anyhow::{Context, Result};
use kartline::{AllowedDirection, RaceSettings};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub tick_rate: u32,
    pub race: RaceSettings,
    pub npc_count: usize,
    pub npc_speed: f32,
    pub host_player: bool,
    pub gate_directions: Option<AllowedDirection>,
    pub event_log_capacity: usize,
    pub linger_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            race: RaceSettings::default(),
            npc_count: 3,
            npc_speed: 12.0,
            host_player: true,
            gate_directions: None,
            event_log_capacity: 256,
            linger_secs: 3,
        }
    }
}

pub fn parse_race_settings(text: &str) -> Result<RaceSettings> {
    toml::from_str(text).context("invalid race settings")
}

pub fn load_race_settings(path: &Path) -> Result<RaceSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_race_settings(&text)
}

pub fn parse_directions(names: &[String]) -> Result<Option<AllowedDirection>> {
    if names.is_empty() {
        return Ok(None);
    }

    let mut mask = AllowedDirection::empty();
    for name in names {
        let direction = AllowedDirection::parse_label(name)
            .with_context(|| format!("unknown gate direction '{}'", name))?;
        mask |= direction;
    }
    Ok(Some(mask))
}
