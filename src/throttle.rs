use std::time::{Duration, Instant};

pub const PAUSE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Idle,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Too fast; the pause window has just been (re)started.
    Jam { elapsed: Duration },
}

#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_accepted: Option<Instant>,
    paused_until: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Throttle {
            min_interval,
            last_accepted: None,
            paused_until: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn state(&self, now: Instant) -> PauseState {
        match self.paused_until {
            Some(deadline) if now < deadline => PauseState::Paused,
            _ => PauseState::Idle,
        }
    }

    pub fn is_paused(&self, now: Instant) -> bool {
        self.state(now) == PauseState::Paused
    }

    /// Judges a keystroke arriving at `now`.
    pub fn check(&mut self, now: Instant) -> Verdict {
        if let Some(last) = self.last_accepted {
            let elapsed = now.saturating_duration_since(last);
            if !self.min_interval.is_zero() && elapsed < self.min_interval {
                self.paused_until = Some(now + PAUSE_WINDOW);
                return Verdict::Jam { elapsed };
            }
        }
        self.last_accepted = Some(now);
        self.paused_until = None;
        Verdict::Accept
    }
}
