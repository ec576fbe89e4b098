use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    Tick(u8),
    Go,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Pending,
    Counting(u8),
    Going,
    Done,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    from: u8,
    interval: Duration,
    hide_delay: Duration,
    elapsed: Duration,
    stage: Stage,
}

impl Countdown {
    pub fn new(from: u8, interval: Duration, hide_delay: Duration) -> Self {
        Self {
            from,
            interval,
            hide_delay,
            elapsed: Duration::ZERO,
            stage: Stage::Pending,
        }
    }

    pub fn advance(&mut self, dt: Duration) -> Vec<CountdownStep> {
        let mut steps = Vec::new();
        self.elapsed += dt;

        loop {
            match self.stage {
                Stage::Pending => {
                    if self.from == 0 {
                        self.stage = Stage::Going;
                        steps.push(CountdownStep::Go);
                    } else {
                        self.stage = Stage::Counting(self.from);
                        steps.push(CountdownStep::Tick(self.from));
                    }
                }
                Stage::Counting(n) => {
                    if self.elapsed < self.interval {
                        break;
                    }
                    self.elapsed -= self.interval;
                    if n > 1 {
                        self.stage = Stage::Counting(n - 1);
                        steps.push(CountdownStep::Tick(n - 1));
                    } else {
                        self.stage = Stage::Going;
                        steps.push(CountdownStep::Go);
                    }
                }
                Stage::Going => {
                    if self.elapsed < self.hide_delay {
                        break;
                    }
                    self.elapsed = Duration::ZERO;
                    self.stage = Stage::Done;
                    steps.push(CountdownStep::Hide);
                }
                Stage::Done => break,
            }
        }

        steps
    }

    pub fn current(&self) -> Option<u8> {
        match self.stage {
            Stage::Counting(n) => Some(n),
            _ => None,
        }
    }

    /// Only a countdown that has not shown Go yet may be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self.stage, Stage::Pending | Stage::Counting(_))
    }

    pub fn has_gone(&self) -> bool {
        matches!(self.stage, Stage::Going | Stage::Done)
    }

    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}
