mod countdown;
mod laps;
mod ready;
mod session;
mod settings;

pub use countdown::{Countdown, CountdownStep};
pub use laps::{LapTracker, LapUpdate};
pub use ready::{ReadyRoster, Readiness, VoteOutcome};
pub use session::{CrossingReport, RacePhase, RaceSession};
pub use settings::{RaceSettings, ReadyMode, WinPolicy};
