//! Per-question countdown arithmetic.
//!
//! The countdown itself never sleeps; a driver calls [`Countdown::tick`] once per
//! elapsed time unit and reacts to [`Tick::Expired`].

/// Default number of time units a question stays current.
pub const QUESTION_SECONDS: u32 = 15;

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Still counting; carries the remaining units.
    Running(u32),
    /// Reached zero from one. The countdown has already been reset to full.
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    duration: u32,
    remaining: u32,
}

impl Countdown {
    /// Creates a countdown starting full. A zero duration is clamped to one.
    #[must_use]
    pub fn new(duration: u32) -> Self {
        let duration = duration.max(1);
        Self {
            duration,
            remaining: duration,
        }
    }

    #[must_use]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Back to full duration; nothing carries over.
    pub fn restart(&mut self) {
        self.remaining = self.duration;
    }

    pub fn tick(&mut self) -> Tick {
        if self.remaining <= 1 {
            self.restart();
            return Tick::Expired;
        }
        self.remaining -= 1;
        Tick::Running(self.remaining)
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(QUESTION_SECONDS)
    }
}
