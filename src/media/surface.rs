use std::sync::Arc;
use std::time::Instant;

use crate::clock::Clock;

/// Something that can play, pause and seek a stream of media.
pub trait PlaybackSurface {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, time_s: f64);
    fn duration(&self) -> f64;

    /// Called when the backing media grows. Surfaces bound to a live
    /// stream ignore it.
    fn set_duration(&mut self, _duration_s: f64) {}
}

/// A surface whose position advances with the clock while playing and
/// stalls at the end of the available media, the way a video element
/// waits for more data. Seeking past the end is allowed: the playhead
/// parks there until the media catches up.
pub struct VirtualSurface {
    clock: Arc<dyn Clock>,
    playing: bool,
    /// Position at `anchor_at`.
    anchor_s: f64,
    anchor_at: Instant,
    duration_s: f64,
}

impl VirtualSurface {
    /// A surface over growing buffered media, initially empty.
    pub fn buffered(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            clock,
            playing: false,
            anchor_s: 0.0,
            anchor_at: now,
            duration_s: 0.0,
        }
    }

    /// A surface bound to a live stream: always at its own edge.
    pub fn live(clock: Arc<dyn Clock>) -> Self {
        let mut surface = Self::buffered(clock);
        surface.duration_s = f64::INFINITY;
        surface
    }

    fn position_at(&self, now: Instant) -> f64 {
        if !self.playing {
            return self.anchor_s;
        }
        let elapsed = now.saturating_duration_since(self.anchor_at).as_secs_f64();
        (self.anchor_s + elapsed).min(self.duration_s.max(self.anchor_s))
    }

    fn re_anchor(&mut self) {
        let now = self.clock.now();
        self.anchor_s = self.position_at(now);
        self.anchor_at = now;
    }
}

impl PlaybackSurface for VirtualSurface {
    fn play(&mut self) {
        if !self.playing {
            self.anchor_at = self.clock.now();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.re_anchor();
            self.playing = false;
        }
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_time(&self) -> f64 {
        self.position_at(self.clock.now())
    }

    fn set_current_time(&mut self, time_s: f64) {
        self.anchor_s = time_s.max(0.0);
        self.anchor_at = self.clock.now();
    }

    fn duration(&self) -> f64 {
        self.duration_s
    }

    fn set_duration(&mut self, duration_s: f64) {
        if self.duration_s.is_infinite() {
            return;
        }
        // A stalled playhead resumes from where it stalled, not from
        // where the wall clock would have taken it.
        self.re_anchor();
        self.duration_s = duration_s.max(0.0);
    }
}
