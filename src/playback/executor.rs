use tracing::{debug, info};

use crate::media::surface::PlaybackSurface;
use crate::playback::action::Action;
use crate::playback::countdown::CancelToken;
use crate::playback::engine::Plan;
use crate::playback::state::{Mode, SessionState};

/// The three independent surfaces of a session.
pub struct Surfaces {
    pub live: Box<dyn PlaybackSurface>,
    pub delayed: Box<dyn PlaybackSurface>,
    pub preview: Box<dyn PlaybackSurface>,
}

/// Whatever has to be shut down when recording stops.
pub trait Recorder {
    /// Stops capture tracks and the recorder, then closes the buffer.
    fn finalize(&mut self);
}

/// Starts carrying out `plan`: supersedes the previous request and records
/// the new target delay. The plan's actions are applied separately.
pub fn begin(plan: &Plan, token: CancelToken, state: &mut SessionState) {
    state.supersede(token);
    state.target_delay_ms = plan.target_delay_ms.max(0);
}

/// Applies one action to the session state and the surfaces.
pub fn apply(
    action: Action,
    state: &mut SessionState,
    surfaces: &mut Surfaces,
    recorder: &mut dyn Recorder,
) {
    debug!(?action, mode = ?state.mode, "apply");
    match action {
        Action::Pause => {
            leave_live(state, surfaces);
            surfaces.delayed.pause();
        }
        Action::Play => {
            leave_live(state, surfaces);
            surfaces.delayed.play();
            state.transition(Mode::Delayed);
            state.wait_periods_remaining = 0;
            state.is_stopped = false;
        }
        Action::SetTime(time_s) => {
            surfaces.delayed.set_current_time(time_s);
        }
        Action::SetWaiting(periods) => {
            leave_live(state, surfaces);
            surfaces.delayed.set_current_time(0.0);
            if state.transition(Mode::WaitingBeforeStart) || state.is_waiting() {
                state.wait_periods_remaining = periods;
            }
        }
        Action::SetLive => {
            if state.is_live() || state.is_ended() {
                return;
            }
            surfaces.live.play();
            surfaces.delayed.pause();
            state.wait_periods_remaining = 0;
            state.transition(Mode::Live);
        }
        Action::GoToEnd => {
            let end = surfaces.delayed.duration();
            surfaces.delayed.set_current_time(end);
        }
        Action::DoStopRecord => {
            if state.is_ended() {
                return;
            }
            leave_live(state, surfaces);
            surfaces.delayed.play();
            recorder.finalize();
            state.transition(Mode::Ended);
            state.wait_periods_remaining = 0;
            state.cancel_active();
            info!("recording stopped");
        }
    }
}

/// The delayed surface played through to the end of a finished recording.
pub fn finish_playback(state: &mut SessionState) {
    if state.is_ended() && !state.is_stopped {
        state.is_stopped = true;
        info!("playback reached end of recording");
    }
}

/// Hands the screen from the live surface to the delayed one. Only the
/// first call after being live touches the live surface.
fn leave_live(state: &mut SessionState, surfaces: &mut Surfaces) {
    if state.is_live() {
        surfaces.live.pause();
        surfaces.delayed.play();
        state.transition(Mode::Delayed);
    }
}
