use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::playback::action::Action;

/// Spacing between countdown ticks.
pub const PERIOD: Duration = Duration::from_secs(1);

/// Shared flag that invalidates an in-flight request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The timed tail of a wait plan: `periods` ticks, the first after
/// `first_tick`, then one per [`PERIOD`]. Every tick but the last counts
/// the wait down; the last one starts playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub periods: u32,
    pub first_tick: Duration,
}

impl Countdown {
    /// Countdown for a request `deficit_ms` ahead of recorded content.
    pub fn for_deficit(deficit_ms: i64) -> Self {
        debug_assert!(deficit_ms > 0);
        Self {
            periods: (deficit_ms / 1000) as u32 + 1,
            first_tick: Duration::from_millis((deficit_ms % 1000) as u64),
        }
    }

    /// Offset of tick `i` from the moment the countdown was scheduled.
    pub fn offset(&self, i: u32) -> Duration {
        self.first_tick + PERIOD * i
    }

    pub fn action(&self, i: u32) -> Action {
        if i + 1 < self.periods {
            Action::SetWaiting(self.periods - 1 - i)
        } else {
            Action::Play
        }
    }

    #[cfg(test)]
    pub fn steps(&self) -> impl Iterator<Item = (Duration, Action)> + '_ {
        (0..self.periods).map(|i| (self.offset(i), self.action(i)))
    }
}

/// A countdown that has been started, bound to the request that started it.
#[derive(Debug)]
pub struct ScheduledCountdown {
    countdown: Countdown,
    started_at: Instant,
    fired: u32,
    token: CancelToken,
}

impl ScheduledCountdown {
    pub fn new(countdown: Countdown, started_at: Instant, token: CancelToken) -> Self {
        Self {
            countdown,
            started_at,
            fired: 0,
            token,
        }
    }

    /// Ticks due at `now` that have not fired yet, oldest first. Nothing
    /// fires once the owning request is cancelled.
    pub fn due(&mut self, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        while !self.is_finished()
            && self.started_at + self.countdown.offset(self.fired) <= now
        {
            actions.push(self.countdown.action(self.fired));
            self.fired += 1;
        }
        actions
    }

    pub fn is_finished(&self) -> bool {
        self.token.is_cancelled() || self.fired >= self.countdown.periods
    }

    #[cfg(test)]
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.is_finished() {
            None
        } else {
            Some(self.started_at + self.countdown.offset(self.fired))
        }
    }
}
