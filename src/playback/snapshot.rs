use std::time::{Duration, Instant};

use crate::clock::millis_between;
use crate::playback::state::Mode;

/// Everything the engine needs to know about time, taken at one instant.
///
/// Never mutated: take a new one instead. Every derived quantity is a
/// method so nothing can go stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSnapshot {
    pub now: Instant,
    pub recording_started_at: Option<Instant>,
    pub last_chunk_at: Option<Instant>,
    pub buffered_end_s: Option<f64>,
    pub playback_position_s: Option<f64>,
}

impl TimeSnapshot {
    /// A snapshot of a session where nothing has happened yet.
    pub fn empty(now: Instant) -> Self {
        Self {
            now,
            recording_started_at: None,
            last_chunk_at: None,
            buffered_end_s: None,
            playback_position_s: None,
        }
    }

    pub fn time_since_last_chunk_ms(&self) -> i64 {
        self.last_chunk_at
            .map(|at| millis_between(at, self.now))
            .unwrap_or(0)
    }

    /// The buffered horizon as elapsed recording time: what is buffered
    /// plus what has surely been captured since the last chunk.
    pub fn absolute_end_ms(&self) -> i64 {
        match (self.last_chunk_at, self.buffered_end_s) {
            (Some(_), Some(end_s)) => secs_to_ms(end_s) + self.time_since_last_chunk_ms(),
            _ => 0,
        }
    }

    pub fn delay_ms(&self, mode: Mode) -> i64 {
        if mode == Mode::Live {
            return 0;
        }
        self.absolute_end_ms() - secs_to_ms(self.playback_position_s.unwrap_or(0.0))
    }

    pub fn total_time_s(&self, ended: bool) -> f64 {
        let buffered = self.buffered_end_s.unwrap_or(0.0);
        if ended {
            buffered
        } else {
            buffered + self.time_since_last_chunk_ms() as f64 / 1000.0
        }
    }

    pub fn current_time_s(&self, mode: Mode) -> f64 {
        if mode == Mode::Live {
            self.total_time_s(false)
        } else {
            self.playback_position_s.unwrap_or(0.0)
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.recording_started_at
            .map(|at| self.now.saturating_duration_since(at))
            .unwrap_or_default()
    }
}

pub fn secs_to_ms(s: f64) -> i64 {
    (s * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(since_ms: u64, buffered_end_s: Option<f64>, position_s: Option<f64>) -> TimeSnapshot {
        let start = Instant::now();
        let last = start + Duration::from_secs(10);
        TimeSnapshot {
            now: last + Duration::from_millis(since_ms),
            recording_started_at: Some(start),
            last_chunk_at: Some(last),
            buffered_end_s,
            playback_position_s: position_s,
        }
    }

    #[test]
    fn absolute_end_adds_time_since_last_chunk() {
        let s = snapshot(250, Some(9.5), None);
        assert_eq!(s.time_since_last_chunk_ms(), 250);
        assert_eq!(s.absolute_end_ms(), 9750);
    }

    #[test]
    fn nothing_buffered_means_zero_horizon() {
        let s = snapshot(250, None, None);
        assert_eq!(s.absolute_end_ms(), 0);

        let empty = TimeSnapshot::empty(Instant::now());
        assert_eq!(empty.absolute_end_ms(), 0);
        assert_eq!(empty.time_since_last_chunk_ms(), 0);
        assert_eq!(empty.elapsed(), Duration::ZERO);
    }

    #[test]
    fn buffered_without_a_chunk_timestamp_means_zero_horizon() {
        let s = TimeSnapshot {
            last_chunk_at: None,
            ..snapshot(250, Some(10.0), Some(4.0))
        };
        assert_eq!(s.time_since_last_chunk_ms(), 0);
        assert_eq!(s.absolute_end_ms(), 0);
        assert_eq!(s.delay_ms(Mode::Delayed), -4000);
    }

    #[test]
    fn delay_is_zero_when_live() {
        let s = snapshot(0, Some(20.0), Some(5.0));
        assert_eq!(s.delay_ms(Mode::Live), 0);
        assert_eq!(s.delay_ms(Mode::Delayed), 15_000);
    }

    #[test]
    fn total_time_stops_growing_once_ended() {
        let s = snapshot(400, Some(3.0), Some(1.0));
        assert!((s.total_time_s(false) - 3.4).abs() < 1e-9);
        assert_eq!(s.total_time_s(true), 3.0);
        assert!((s.current_time_s(Mode::Live) - 3.4).abs() < 1e-9);
        assert_eq!(s.current_time_s(Mode::Delayed), 1.0);
    }
}
