//! Delay reconciliation.
//!
//! Pure functions from a [`TimeSnapshot`] and the current [`SessionState`]
//! to the [`Plan`] the executor should carry out. Nothing here touches a
//! surface or the clock, so the same inputs always give the same plan no
//! matter how time got there.

use tracing::debug;

use crate::playback::action::Action;
use crate::playback::countdown::Countdown;
use crate::playback::snapshot::TimeSnapshot;
use crate::playback::state::SessionState;

/// Delay change applied by one `more`/`less` press.
pub const DEFAULT_STEP_MS: i64 = 5000;

/// A user or system event that asks for the delay to be reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Less,
    More,
    StopRecord,
    Foregrounded,
}

/// What the executor should do for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub target_delay_ms: i64,
    /// Applied immediately, in order.
    pub actions: Vec<Action>,
    /// Applied later, tick by tick, unless superseded.
    pub countdown: Option<Countdown>,
}

/// The numbers the reconciliation works from, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DelayInputs {
    target_delay_ms: i64,
    current_delay_ms: i64,
    since_last_chunk_ms: i64,
    absolute_end_ms: i64,
    ended: bool,
}

impl DelayInputs {
    fn capture(snapshot: &TimeSnapshot, state: &SessionState) -> Self {
        Self {
            target_delay_ms: state.target_delay_ms,
            current_delay_ms: snapshot.delay_ms(state.mode),
            since_last_chunk_ms: snapshot.time_since_last_chunk_ms(),
            absolute_end_ms: snapshot.absolute_end_ms(),
            ended: state.is_ended(),
        }
    }
}

pub fn plan(request: Request, step_ms: i64, snapshot: &TimeSnapshot, state: &SessionState) -> Plan {
    let plan = match request {
        Request::Less => change_delay(-step_ms, snapshot, state, false),
        Request::More => change_delay(step_ms, snapshot, state, false),
        Request::StopRecord => stop_record(snapshot, state),
        Request::Foregrounded => change_delay(0, snapshot, state, false),
    };
    debug!(?request, ?plan, "planned");
    plan
}

/// Plans a move of `delta_ms` away from the live edge (negative moves
/// toward it). With `no_wait` the target is clamped to what has been
/// recorded so playback never waits for content.
pub fn change_delay(
    delta_ms: i64,
    snapshot: &TimeSnapshot,
    state: &SessionState,
    no_wait: bool,
) -> Plan {
    reconcile(delta_ms, &DelayInputs::capture(snapshot, state), no_wait)
}

/// Stops recording, then snaps playback onto what is buffered.
///
/// The follow-up is planned as if the session had already ended, starting
/// from the requested delay rather than wherever playback drifted to.
pub fn stop_record(snapshot: &TimeSnapshot, state: &SessionState) -> Plan {
    let mut inputs = DelayInputs::capture(snapshot, state);
    inputs.current_delay_ms = state.target_delay_ms;
    inputs.ended = true;
    let follow_up = reconcile(0, &inputs, true);

    let mut actions = Vec::with_capacity(follow_up.actions.len() + 1);
    actions.push(Action::DoStopRecord);
    actions.extend(follow_up.actions);
    Plan {
        target_delay_ms: follow_up.target_delay_ms,
        actions,
        countdown: follow_up.countdown,
    }
}

fn reconcile(delta_ms: i64, inputs: &DelayInputs, no_wait: bool) -> Plan {
    let since = inputs.since_last_chunk_ms;
    let absolute_end = inputs.absolute_end_ms;

    let mut target = if inputs.ended {
        // Nothing newer than the last chunk will ever exist.
        (inputs.current_delay_ms + delta_ms).max(since)
    } else {
        (inputs.target_delay_ms + delta_ms).max(0)
    };
    if no_wait || inputs.ended {
        target = target.min(absolute_end);
    }

    let headroom = absolute_end - target;
    if headroom < 0 {
        let countdown = Countdown::for_deficit(-headroom);
        return Plan {
            target_delay_ms: target,
            actions: vec![
                Action::Pause,
                Action::SetTime(0.0),
                Action::SetWaiting(countdown.periods),
            ],
            countdown: Some(countdown),
        };
    }

    if target <= since && !inputs.ended {
        return Plan {
            target_delay_ms: target,
            actions: vec![Action::SetLive],
            countdown: None,
        };
    }

    let mut actions = vec![Action::SetTime((absolute_end - target) as f64 / 1000.0)];
    if target > since {
        actions.push(Action::Play);
    }
    Plan {
        target_delay_ms: target,
        actions,
        countdown: None,
    }
}
