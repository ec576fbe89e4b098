mod buffer;
mod notifier;
mod types;

pub use buffer::{EventLog, LoggedEvent};
pub use notifier::{RaceNotifier, RaceObserver, Subscription};
pub use types::RaceEvent;
