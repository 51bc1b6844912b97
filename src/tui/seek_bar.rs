use crate::session::Session;

/// Shortest span the seek bar shows while recording.
const MIN_WIDTH_S: f64 = 60.0;

/// Seek bar geometry. While recording the bar spans a window that grows
/// with the target delay; once ended it spans the whole recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekBar {
    pub total_time_s: f64,
    pub current_time_s: f64,
    pub target_delay_s: f64,
    pub displayed_delay_s: f64,
    pub is_ended: bool,
}

impl SeekBar {
    pub fn from_session(session: &Session) -> Self {
        Self {
            total_time_s: session.total_time_s(),
            current_time_s: session.current_time_s(),
            target_delay_s: session.target_delay_seconds(),
            displayed_delay_s: session.displayed_delay_seconds(),
            is_ended: session.is_ended(),
        }
    }

    pub fn width_s(&self) -> f64 {
        if self.is_ended {
            self.total_time_s
        } else {
            (self.target_delay_s * 1.5).max(MIN_WIDTH_S)
        }
    }

    pub fn time_to_end_s(&self) -> f64 {
        if self.is_ended {
            self.total_time_s - self.current_time_s
        } else if self.target_delay_s > self.total_time_s {
            self.target_delay_s
        } else {
            self.displayed_delay_s
        }
    }

    /// Knob position, 0.0 at the left edge, 1.0 at the live edge.
    pub fn knob_ratio(&self) -> f64 {
        let width = self.width_s();
        if width <= 0.0 {
            return 1.0;
        }
        (1.0 - self.time_to_end_s() / width).clamp(0.0, 1.0)
    }

    /// How much of the bar is covered by recorded content.
    pub fn buffer_ratio(&self) -> f64 {
        let width = self.width_s();
        if width <= 0.0 {
            return 0.0;
        }
        (self.total_time_s / width).min(1.0)
    }
}
