use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Instant;

use tracing::{debug, info};

use crate::clock::Clock;
use crate::media::capture::{CaptureConstraints, CaptureError, CaptureSource, Chunk, MediaHandle};

/// Cameras the synthetic source pretends to have.
const CAMERAS: [&str; 2] = ["user", "environment"];

/// A stand-in camera that produces filler chunks covering exactly the wall
/// time elapsed since the previous chunk.
pub struct SyntheticCamera {
    clock: Arc<dyn Clock>,
    deny_permission: bool,
    formats: Vec<String>,
}

impl SyntheticCamera {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            deny_permission: false,
            formats: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm;codecs=vp8".to_string(),
            ],
        }
    }

    /// Behaves as if the user refused camera access.
    pub fn denying_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }

    #[cfg(test)]
    pub fn with_formats(mut self, formats: Vec<String>) -> Self {
        self.formats = formats;
        self
    }
}

impl CaptureSource for SyntheticCamera {
    fn supported_formats(&self) -> Vec<String> {
        self.formats.clone()
    }

    fn start(
        &mut self,
        constraints: &CaptureConstraints,
        format: &str,
        chunks: Sender<Chunk>,
    ) -> Result<Box<dyn MediaHandle>, CaptureError> {
        if self.deny_permission {
            return Err(CaptureError::from_name("NotAllowedError"));
        }
        if !CAMERAS.contains(&constraints.camera.as_str()) {
            return Err(CaptureError::from_name("NotFoundError"));
        }
        if !self.formats.iter().any(|f| f == format) {
            return Err(CaptureError::Unsupported);
        }

        info!(camera = %constraints.camera, format, "synthetic capture started");
        let now = self.clock.now();
        Ok(Box::new(SyntheticHandle {
            clock: self.clock.clone(),
            chunks,
            bytes_per_second: constraints.quality.bytes_per_second(),
            last_flush: now,
            position_s: 0.0,
            stopped: false,
        }))
    }
}

struct SyntheticHandle {
    clock: Arc<dyn Clock>,
    chunks: Sender<Chunk>,
    bytes_per_second: usize,
    last_flush: Instant,
    position_s: f64,
    stopped: bool,
}

impl SyntheticHandle {
    fn flush(&mut self) {
        let now = self.clock.now();
        let duration_s = now.saturating_duration_since(self.last_flush).as_secs_f64();
        self.last_flush = now;

        let len = (duration_s * self.bytes_per_second as f64) as usize;
        let chunk = Chunk {
            bytes: vec![0u8; len],
            start_s: self.position_s,
            duration_s,
        };
        self.position_s += duration_s;

        if self.chunks.send(chunk).is_err() {
            debug!("chunk receiver gone, dropping chunk");
        }
    }
}

impl MediaHandle for SyntheticHandle {
    fn request_chunk(&mut self) {
        if !self.stopped {
            self.flush();
        }
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        // Like a real recorder, hand over whatever is pending.
        self.flush();
        self.stopped = true;
        info!(recorded_s = self.position_s, "synthetic capture stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn chunks_cover_elapsed_time_back_to_back() {
        let clock = Arc::new(ManualClock::new());
        let mut camera = SyntheticCamera::new(clock.clone());
        let (tx, rx) = mpsc::channel();
        let mut handle = camera
            .start(&CaptureConstraints::default(), "video/webm;codecs=vp9", tx)
            .unwrap();

        clock.advance_ms(1000);
        handle.request_chunk();
        clock.advance_ms(500);
        handle.request_chunk();

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.start_s, 0.0);
        assert!((first.duration_s - 1.0).abs() < 1e-9);
        assert!((second.start_s - 1.0).abs() < 1e-9);
        assert!((second.duration_s - 0.5).abs() < 1e-9);
        assert_eq!(first.bytes.len(), 320_000);
    }

    #[test]
    fn stop_flushes_once_and_silences_requests() {
        let clock = Arc::new(ManualClock::new());
        let mut camera = SyntheticCamera::new(clock.clone());
        let (tx, rx) = mpsc::channel();
        let mut handle = camera
            .start(&CaptureConstraints::default(), "video/webm;codecs=vp8", tx)
            .unwrap();

        clock.advance_ms(200);
        handle.stop();
        handle.stop();
        handle.request_chunk();

        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn start_failures_are_classified() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
        let (tx, _rx) = mpsc::channel();

        let mut denied = SyntheticCamera::new(clock.clone()).denying_permission();
        let err = denied
            .start(&CaptureConstraints::default(), "video/webm;codecs=vp9", tx.clone())
            .err();
        assert_eq!(err, Some(CaptureError::PermissionDenied));

        let mut camera = SyntheticCamera::new(clock);
        let constraints = CaptureConstraints {
            camera: "rear-left".to_string(),
            ..CaptureConstraints::default()
        };
        let err = camera.start(&constraints, "video/webm;codecs=vp9", tx).err();
        assert_eq!(err, Some(CaptureError::NotFound));
    }
}
