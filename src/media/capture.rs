use std::sync::mpsc::Sender;

/// Recording formats in order of preference.
pub const PREFERRED_FORMATS: [&str; 2] = ["video/webm;codecs=vp9", "video/webm;codecs=vp8"];

/// One unit of captured media. Timing travels with the payload so the
/// buffer can track which time ranges it holds without demuxing.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub bytes: Vec<u8>,
    /// Media time at which this chunk starts, in seconds.
    pub start_s: f64,
    pub duration_s: f64,
}

impl Chunk {
    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    /// Nominal encoded bitrate, used to size synthetic chunks.
    pub fn bytes_per_second(self) -> usize {
        match self {
            Self::Low => 32_000,
            Self::Medium => 128_000,
            Self::High => 320_000,
        }
    }
}

/// Opaque capture preferences handed to the capture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Camera identifier or facing mode, e.g. "user" or "environment".
    pub camera: String,
    pub quality: Quality,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            camera: "user".to_string(),
            quality: Quality::High,
        }
    }
}

/// Why capture could not be started. Terminal for the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera found")]
    NotFound,

    #[error("no supported recording format")]
    Unsupported,

    #[error("capture failed: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Classifies a platform error name into the capture error taxonomy.
    pub fn from_name(name: &str) -> Self {
        match name {
            "PermissionDeniedError" | "NotAllowedError" => Self::PermissionDenied,
            "NotFoundError" => Self::NotFound,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// A running capture. Chunks arrive on the sender given to
/// [`CaptureSource::start`].
pub trait MediaHandle {
    /// Asks the recorder to flush whatever it has captured so far.
    fn request_chunk(&mut self);

    /// Stops all tracks and the recorder. The recorder may deliver one
    /// final chunk.
    fn stop(&mut self);
}

pub trait CaptureSource {
    fn supported_formats(&self) -> Vec<String>;

    fn start(
        &mut self,
        constraints: &CaptureConstraints,
        format: &str,
        chunks: Sender<Chunk>,
    ) -> Result<Box<dyn MediaHandle>, CaptureError>;
}

/// Picks the first preferred format the source can record.
pub fn negotiate_format(source: &dyn CaptureSource) -> Option<&'static str> {
    let supported = source.supported_formats();
    PREFERRED_FORMATS
        .iter()
        .copied()
        .find(|f| supported.iter().any(|s| s == f))
}
