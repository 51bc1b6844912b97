//! Session lifecycle: capture start, chunk ingestion, the chunk-request
//! timer, wait countdowns, and the user-facing commands and queries.
//!
//! Everything runs on the caller's thread. Timers are deadlines checked by
//! [`Session::tick`], which the front end calls from its event loop.

pub mod view;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::media::buffer::BufferSink;
use crate::media::capture::{
    CaptureConstraints, CaptureError, CaptureSource, Chunk, MediaHandle, negotiate_format,
};
use crate::playback::action::Action;
use crate::playback::countdown::{CancelToken, ScheduledCountdown};
use crate::playback::engine::{self, DEFAULT_STEP_MS, Request};
use crate::playback::executor::{self, Recorder, Surfaces};
use crate::playback::snapshot::TimeSnapshot;
use crate::playback::state::{Mode, SessionState, Status};
use crate::session::view::ViewState;

/// Slack when deciding the delayed surface has reached the end.
const END_EPSILON_S: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Delay change per `more`/`less`.
    pub step_ms: i64,
    /// How often the recorder is asked to flush a chunk.
    pub chunk_interval: Duration,
    pub constraints: CaptureConstraints,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            step_ms: DEFAULT_STEP_MS,
            chunk_interval: Duration::from_secs(1),
            constraints: CaptureConstraints::default(),
        }
    }
}

/// The capture handle and the buffer it feeds.
struct Recording {
    handle: Option<Box<dyn MediaHandle>>,
    sink: Box<dyn BufferSink>,
}

impl Recorder for Recording {
    fn finalize(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.stop();
        }
        self.sink.end_of_stream();
    }
}

pub struct Session {
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
    capture: Box<dyn CaptureSource>,
    recording: Recording,
    surfaces: Surfaces,
    state: SessionState,
    view: ViewState,
    initialized: bool,
    format: Option<&'static str>,
    chunks: Option<Receiver<Chunk>>,
    started_at: Option<Instant>,
    last_chunk_at: Option<Instant>,
    next_chunk_request: Option<Instant>,
    countdown: Option<ScheduledCountdown>,
    published: TimeSnapshot,
}

impl Session {
    pub fn new(
        settings: SessionSettings,
        clock: Arc<dyn Clock>,
        capture: Box<dyn CaptureSource>,
        sink: Box<dyn BufferSink>,
        surfaces: Surfaces,
    ) -> Self {
        let now = clock.now();
        Self {
            settings,
            clock,
            capture,
            recording: Recording { handle: None, sink },
            surfaces,
            state: SessionState::default(),
            view: ViewState::default(),
            initialized: false,
            format: None,
            chunks: None,
            started_at: None,
            last_chunk_at: None,
            next_chunk_request: None,
            countdown: None,
            published: TimeSnapshot::empty(now),
        }
    }

    // -- Lifecycle --

    /// Resets the session and starts capturing. A failure is terminal for
    /// this session: it is recorded in [`Session::status`] and returned.
    pub fn init(&mut self) -> Result<(), CaptureError> {
        self.countdown = None;
        self.state.cancel_active();
        if let Some(mut handle) = self.recording.handle.take() {
            handle.stop();
        }
        self.recording.sink.reset();
        self.state = SessionState::default();
        self.view = ViewState::default();
        self.initialized = false;
        self.format = None;
        self.chunks = None;
        self.started_at = None;
        self.last_chunk_at = None;
        self.next_chunk_request = None;
        self.surfaces.delayed.set_duration(0.0);
        self.published = TimeSnapshot::empty(self.clock.now());

        let Some(format) = negotiate_format(self.capture.as_ref()) else {
            return self.fail(CaptureError::Unsupported);
        };

        let (tx, rx) = mpsc::channel();
        let mut handle = match self.capture.start(&self.settings.constraints, format, tx) {
            Ok(handle) => handle,
            Err(err) => return self.fail(err),
        };

        let now = self.clock.now();
        self.surfaces.delayed.set_current_time(0.0);
        self.surfaces.delayed.pause();
        self.surfaces.live.play();
        self.surfaces.preview.pause();

        handle.request_chunk();
        self.recording.handle = Some(handle);
        self.chunks = Some(rx);
        self.format = Some(format);
        self.started_at = Some(now);
        self.next_chunk_request = Some(now + self.settings.chunk_interval);
        self.initialized = true;
        self.published = self.snapshot(now);

        info!(format, camera = %self.settings.constraints.camera, "session started");
        Ok(())
    }

    fn fail(&mut self, err: CaptureError) -> Result<(), CaptureError> {
        self.state.status = Status::from(&err);
        warn!(error = %err, status = ?self.state.status, "capture failed to start");
        Err(err)
    }

    /// Advances timers: ingests chunks, asks for the next one when due,
    /// fires due countdown ticks and refreshes the published snapshot.
    pub fn tick(&mut self) {
        if !self.is_running() {
            return;
        }
        let now = self.clock.now();
        self.poll_capture(now);
        self.fire_countdown(now);

        if self.state.is_ended() && !self.state.is_stopped {
            let delayed = &self.surfaces.delayed;
            if delayed.is_playing() && delayed.current_time() >= delayed.duration() - END_EPSILON_S {
                executor::finish_playback(&mut self.state);
            }
        }

        self.published = self.snapshot(self.clock.now());
    }

    /// Requests a chunk if the chunk timer is due, then ingests whatever
    /// has arrived.
    fn poll_capture(&mut self, now: Instant) {
        if !self.state.is_ended()
            && let Some(due) = self.next_chunk_request
            && now >= due
        {
            if let Some(handle) = self.recording.handle.as_mut() {
                handle.request_chunk();
            }
            self.next_chunk_request = Some(now + self.settings.chunk_interval);
        }
        self.drain_chunks();
    }

    fn drain_chunks(&mut self) {
        let arrived: Vec<Chunk> = match &self.chunks {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for chunk in arrived {
            self.on_chunk(chunk);
        }
    }

    fn on_chunk(&mut self, chunk: Chunk) {
        let now = self.clock.now();
        self.last_chunk_at = Some(now);
        if self.state.is_ended() {
            debug!(bytes = chunk.bytes.len(), "chunk after stop, not buffered");
            return;
        }

        self.recording.sink.append(&chunk);
        if let Some(end_s) = self.recording.sink.buffered_end_seconds() {
            self.surfaces.delayed.set_duration(end_s);
        }
        self.published = self.snapshot(now);
    }

    fn fire_countdown(&mut self, now: Instant) {
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        let due = countdown.due(now);
        let finished = countdown.is_finished();

        for action in due {
            if self.state.is_ended() {
                break;
            }
            self.apply(action);
        }
        if finished || self.state.is_ended() {
            self.countdown = None;
        }
    }

    fn snapshot(&self, now: Instant) -> TimeSnapshot {
        TimeSnapshot {
            now,
            recording_started_at: self.started_at,
            last_chunk_at: self.last_chunk_at,
            buffered_end_s: self.recording.sink.buffered_end_seconds(),
            playback_position_s: Some(self.surfaces.delayed.current_time()),
        }
    }

    fn apply(&mut self, action: Action) {
        executor::apply(action, &mut self.state, &mut self.surfaces, &mut self.recording);
        if self.state.is_ended() {
            self.next_chunk_request = None;
        }
    }

    /// Runs one request to completion, superseding whatever ran before.
    fn request(&mut self, request: Request) {
        if !self.is_running() {
            debug!(?request, "session not running, ignoring request");
            return;
        }
        if request == Request::StopRecord && self.state.is_ended() {
            debug!("already stopped");
            return;
        }

        // Timers may not have run for a while (e.g. while backgrounded):
        // bring the recording up to date before planning against it.
        let now = self.clock.now();
        self.poll_capture(now);
        let snapshot = self.snapshot(now);
        let plan = engine::plan(request, self.settings.step_ms, &snapshot, &self.state);

        let token = CancelToken::new();
        executor::begin(&plan, token.clone(), &mut self.state);
        self.countdown = None;

        for &action in &plan.actions {
            self.apply(action);
        }
        if let Some(countdown) = plan.countdown
            && !self.state.is_ended()
        {
            self.countdown = Some(ScheduledCountdown::new(countdown, now, token));
        }

        self.published = self.snapshot(self.clock.now());
    }

    // -- Commands --

    pub fn less(&mut self) {
        self.request(Request::Less);
    }

    pub fn more(&mut self) {
        if self.is_running() {
            self.view.on_more(self.state.is_ended());
            self.sync_preview();
        }
        self.request(Request::More);
    }

    pub fn stop_record(&mut self) {
        if self.is_running() && !self.state.is_ended() {
            self.view.on_stop();
            self.sync_preview();
        }
        self.request(Request::StopRecord);
    }

    /// The app became visible again: re-derive the position from the clock.
    pub fn foregrounded(&mut self) {
        self.request(Request::Foregrounded);
    }

    /// Jumps to the end of a finished recording.
    pub fn go_to_end(&mut self) {
        if self.is_running() && self.state.is_ended() {
            self.apply(Action::GoToEnd);
        }
    }

    pub fn toggle_preview(&mut self) {
        self.view.toggle_preview();
        self.sync_preview();
    }

    pub fn dismiss_wizard(&mut self) {
        self.view.dismiss_wizard();
    }

    fn sync_preview(&mut self) {
        if !self.initialized {
            return;
        }
        if self.view.show_preview {
            self.surfaces.preview.play();
        } else {
            self.surfaces.preview.pause();
        }
    }

    // -- Queries --

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_running(&self) -> bool {
        self.initialized && !self.state.status.is_error()
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_ended()
    }

    pub fn is_waiting(&self) -> bool {
        self.state.is_waiting()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped
    }

    pub fn wait_periods_remaining(&self) -> u32 {
        self.state.wait_periods_remaining
    }

    pub fn target_delay_seconds(&self) -> f64 {
        self.state.target_delay_ms as f64 / 1000.0
    }

    pub fn displayed_delay_seconds(&self) -> f64 {
        self.published.delay_ms(self.state.mode) as f64 / 1000.0
    }

    pub fn total_time_s(&self) -> f64 {
        self.published.total_time_s(self.state.is_ended())
    }

    pub fn current_time_s(&self) -> f64 {
        self.published.current_time_s(self.state.mode)
    }

    pub fn elapsed(&self) -> Duration {
        self.published.elapsed()
    }

    #[cfg(test)]
    pub fn has_pending_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn show_preview(&self) -> bool {
        self.view.show_preview
    }

    pub fn show_wizard(&self) -> bool {
        self.view.show_wizard
    }

    pub fn format(&self) -> Option<&'static str> {
        self.format
    }

    pub fn step_seconds(&self) -> f64 {
        self.settings.step_ms as f64 / 1000.0
    }

    #[cfg(test)]
    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(mut handle) = self.recording.handle.take() {
            handle.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::media::buffer::MediaBuffer;
    use crate::media::surface::VirtualSurface;
    use crate::media::synthetic::SyntheticCamera;

    fn session_with(camera: SyntheticCamera, clock: Arc<ManualClock>) -> Session {
        let surfaces = Surfaces {
            live: Box::new(VirtualSurface::live(clock.clone())),
            delayed: Box::new(VirtualSurface::buffered(clock.clone())),
            preview: Box::new(VirtualSurface::live(clock.clone())),
        };
        Session::new(
            SessionSettings::default(),
            clock,
            Box::new(camera),
            Box::new(MediaBuffer::new()),
            surfaces,
        )
    }

    fn started() -> (Arc<ManualClock>, Session) {
        let clock = Arc::new(ManualClock::new());
        let mut session = session_with(SyntheticCamera::new(clock.clone()), clock.clone());
        session.init().unwrap();
        session.tick();
        (clock, session)
    }

    /// Advances the clock in 100ms steps, ticking after each.
    fn run(clock: &ManualClock, session: &mut Session, ms: u64) {
        for _ in 0..ms / 100 {
            clock.advance_ms(100);
            session.tick();
        }
    }

    #[test]
    fn init_starts_live() {
        let (_clock, session) = started();
        assert!(session.is_initialized());
        assert_eq!(session.status(), Status::Ok);
        assert_eq!(session.mode(), Mode::Live);
        assert_eq!(session.target_delay_seconds(), 0.0);
        assert!(session.surfaces().live.is_playing());
        assert!(!session.surfaces().delayed.is_playing());
        assert!(!session.surfaces().preview.is_playing());
        assert!(session.show_wizard());
        assert_eq!(session.format(), Some("video/webm;codecs=vp9"));
    }

    #[test]
    fn denied_permission_is_terminal() {
        let clock = Arc::new(ManualClock::new());
        let camera = SyntheticCamera::new(clock.clone()).denying_permission();
        let mut session = session_with(camera, clock.clone());

        assert_eq!(session.init(), Err(CaptureError::PermissionDenied));
        assert_eq!(session.status(), Status::PermissionDenied);

        session.more();
        run(&clock, &mut session, 2000);
        assert_eq!(session.mode(), Mode::Live);
        assert_eq!(session.target_delay_seconds(), 0.0);
        assert!(!session.surfaces().live.is_playing());
        assert!(!session.is_running());
    }

    #[test]
    fn unsupported_format_fails_init() {
        let clock = Arc::new(ManualClock::new());
        let camera = SyntheticCamera::new(clock.clone()).with_formats(vec!["video/mp4".into()]);
        let mut session = session_with(camera, clock);

        assert_eq!(session.init(), Err(CaptureError::Unsupported));
        assert_eq!(session.status(), Status::Unsupported);
    }

    #[test]
    fn chunks_grow_the_recording() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 3000);

        assert!((session.total_time_s() - 3.0).abs() < 1e-9);
        assert_eq!(session.displayed_delay_seconds(), 0.0);
        assert_eq!(session.surfaces().delayed.duration(), 3.0);
    }

    #[test]
    fn more_before_anything_is_recorded_waits_then_plays() {
        let (clock, mut session) = started();

        session.more();
        assert_eq!(session.mode(), Mode::WaitingBeforeStart);
        assert!(session.is_waiting());
        assert_eq!(session.wait_periods_remaining(), 6);
        assert_eq!(session.target_delay_seconds(), 5.0);
        assert!(session.show_preview());
        assert!(session.surfaces().preview.is_playing());
        assert!(!session.surfaces().live.is_playing());

        // First tick is due immediately.
        session.tick();
        assert_eq!(session.wait_periods_remaining(), 5);

        run(&clock, &mut session, 4900);
        assert_eq!(session.mode(), Mode::WaitingBeforeStart);
        assert_eq!(session.wait_periods_remaining(), 1);

        run(&clock, &mut session, 100);
        assert_eq!(session.mode(), Mode::Delayed);
        assert!(!session.is_waiting());
        assert_eq!(session.wait_periods_remaining(), 0);
        assert!(session.surfaces().delayed.is_playing());
        assert!(!session.has_pending_countdown());
        assert!((session.displayed_delay_seconds() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn stop_during_wait_cancels_the_countdown() {
        let (clock, mut session) = started();
        session.more();
        session.tick();
        assert!(session.has_pending_countdown());

        session.stop_record();
        assert_eq!(session.mode(), Mode::Ended);
        assert!(!session.has_pending_countdown());

        run(&clock, &mut session, 10_000);
        assert_eq!(session.mode(), Mode::Ended);
        assert_eq!(session.wait_periods_remaining(), 0);
        assert!(!session.has_pending_countdown());
    }

    #[test]
    fn new_request_supersedes_pending_countdown() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 2000);

        session.more();
        assert!(session.has_pending_countdown());

        session.less();
        assert!(!session.has_pending_countdown());
        assert_eq!(session.mode(), Mode::Live);

        run(&clock, &mut session, 6000);
        assert_eq!(session.mode(), Mode::Live);
    }

    #[test]
    fn more_then_less_round_trips() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 20_000);

        session.more();
        assert_eq!(session.mode(), Mode::Delayed);
        assert_eq!(session.target_delay_seconds(), 5.0);
        assert!((session.surfaces().delayed.current_time() - 15.0).abs() < 1e-9);

        session.less();
        assert_eq!(session.mode(), Mode::Live);
        assert_eq!(session.target_delay_seconds(), 0.0);
        assert!(session.surfaces().live.is_playing());
        assert!(!session.surfaces().delayed.is_playing());
    }

    #[test]
    fn foregrounded_corrects_for_time_spent_in_background() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 20_000);
        session.more();

        // Backgrounded: no ticks for 30s. The delayed view stalled at the
        // end of what was buffered.
        clock.advance_ms(30_000);
        session.foregrounded();
        assert!((session.surfaces().delayed.current_time() - 45.0).abs() < 1e-9);
        assert!(session.surfaces().delayed.is_playing());

        session.tick();
        assert!((session.total_time_s() - 50.0).abs() < 1e-9);
        assert!((session.displayed_delay_seconds() - 5.0).abs() < 1e-9);
        assert_eq!(session.target_delay_seconds(), 5.0);
    }

    #[test]
    fn without_foregrounded_background_time_becomes_extra_delay() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 20_000);
        session.more();

        clock.advance_ms(30_000);
        session.tick();
        assert!((session.displayed_delay_seconds() - 30.0).abs() < 1e-9);
        assert_eq!(session.target_delay_seconds(), 5.0);
    }

    #[test]
    fn stop_while_delayed_plays_out_the_recording() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 20_000);
        session.more();
        run(&clock, &mut session, 2000);

        session.stop_record();
        assert!(session.is_ended());
        assert!(!session.is_live());
        assert!(!session.show_preview());
        assert!(!session.show_wizard());
        assert!((session.surfaces().delayed.current_time() - 17.0).abs() < 1e-9);
        assert!(session.surfaces().delayed.is_playing());

        run(&clock, &mut session, 3000);
        assert!(!session.is_stopped());
        assert_eq!(session.total_time_s(), 22.0);

        run(&clock, &mut session, 3000);
        assert!(session.is_stopped());

        // Stopping twice does nothing.
        session.stop_record();
        assert!(session.is_ended());
    }

    #[test]
    fn stop_while_live_shows_end_of_recording() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 10_000);

        session.stop_record();
        assert!(session.is_ended());
        assert!(!session.surfaces().live.is_playing());
        assert!((session.surfaces().delayed.current_time() - 10.0).abs() < 1e-9);

        session.tick();
        assert!(session.is_stopped());
    }

    #[test]
    fn go_to_end_after_stop_finishes_playback() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 20_000);
        session.more();
        session.more();
        session.stop_record();
        assert!(!session.is_stopped());

        session.go_to_end();
        session.tick();
        assert!(session.is_stopped());
        assert!((session.current_time_s() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn less_after_stop_is_floored_at_end_of_recording() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 20_000);
        session.more();
        session.more();
        session.stop_record();

        session.less();
        session.less();
        session.less();
        assert!(session.is_ended());
        assert!((session.surfaces().delayed.current_time() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn chunk_requests_stop_after_end() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 5000);
        session.stop_record();

        run(&clock, &mut session, 5000);
        assert_eq!(session.total_time_s(), 5.0);
        assert_eq!(session.surfaces().delayed.duration(), 5.0);
    }

    #[test]
    fn toggle_preview_plays_and_pauses_preview_surface() {
        let (_clock, mut session) = started();
        session.toggle_preview();
        assert!(session.show_preview());
        assert!(session.surfaces().preview.is_playing());

        session.toggle_preview();
        assert!(!session.show_preview());
        assert!(!session.surfaces().preview.is_playing());

        session.dismiss_wizard();
        assert!(!session.show_wizard());
    }

    #[test]
    fn init_again_starts_a_fresh_session() {
        let (clock, mut session) = started();
        run(&clock, &mut session, 5000);
        session.stop_record();

        session.init().unwrap();
        session.tick();
        assert_eq!(session.mode(), Mode::Live);
        assert_eq!(session.total_time_s(), 0.0);
        assert!(!session.is_stopped());
        assert!(session.show_wizard());
    }
}
