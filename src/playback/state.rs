use crate::media::capture::CaptureError;
use crate::playback::countdown::CancelToken;

/// Where the viewer is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Watching the camera directly. Zero delay.
    #[default]
    Live,
    /// Watching the recording, behind the live edge.
    Delayed,
    /// Asked for more delay than has been recorded. Paused at the start
    /// until the recording catches up.
    WaitingBeforeStart,
    /// Recording stopped. Terminal.
    Ended,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Delayed => "DELAYED",
            Self::WaitingBeforeStart => "WAITING",
            Self::Ended => "ENDED",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Live => ">>",
            Self::Delayed => "> ",
            Self::WaitingBeforeStart => "..",
            Self::Ended => "[]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Ok,
    PermissionDenied,
    NotFound,
    UnknownError,
    Unsupported,
}

impl Status {
    pub fn is_error(self) -> bool {
        self != Self::Ok
    }
}

impl From<&CaptureError> for Status {
    fn from(err: &CaptureError) -> Self {
        match err {
            CaptureError::PermissionDenied => Self::PermissionDenied,
            CaptureError::NotFound => Self::NotFound,
            CaptureError::Unsupported => Self::Unsupported,
            CaptureError::Unknown(_) => Self::UnknownError,
        }
    }
}

/// The single mutable record of a viewing session.
///
/// Read by the engine, written only by the executor (and reset by the
/// session on init).
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub mode: Mode,
    /// Requested distance from the live edge, never negative.
    pub target_delay_ms: i64,
    pub wait_periods_remaining: u32,
    /// The delayed surface played through to the end of a finished recording.
    pub is_stopped: bool,
    pub status: Status,
    /// Token of the most recent user request; cancelled when superseded.
    pub active_request: Option<CancelToken>,
}

impl SessionState {
    pub fn is_live(&self) -> bool {
        self.mode == Mode::Live
    }

    pub fn is_ended(&self) -> bool {
        self.mode == Mode::Ended
    }

    pub fn is_waiting(&self) -> bool {
        self.mode == Mode::WaitingBeforeStart
    }

    /// Moves to `mode` unless the session has ended. Returns whether the
    /// mode changed.
    pub fn transition(&mut self, mode: Mode) -> bool {
        if self.mode == Mode::Ended || self.mode == mode {
            return false;
        }
        self.mode = mode;
        true
    }

    /// Installs `token` as the active request, cancelling the previous one.
    pub fn supersede(&mut self, token: CancelToken) {
        if let Some(previous) = self.active_request.replace(token) {
            previous.cancel();
        }
    }

    pub fn cancel_active(&mut self) {
        if let Some(token) = self.active_request.take() {
            token.cancel();
        }
    }
}
