use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyMode {
    #[default]
    OneShot,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinPolicy {
    #[default]
    EndSession,
    FinishParticipant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceSettings {
    pub required_laps: u32,
    pub countdown_from: u8,
    pub tick_interval_ms: u64,
    pub hide_delay_ms: u64,
    pub ready_mode: ReadyMode,
    pub win_policy: WinPolicy,
    pub npc_auto_ready: bool,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            required_laps: 3,
            countdown_from: 3,
            tick_interval_ms: 1000,
            hide_delay_ms: 1000,
            ready_mode: ReadyMode::OneShot,
            win_policy: WinPolicy::EndSession,
            npc_auto_ready: true,
        }
    }
}

impl RaceSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }
}
