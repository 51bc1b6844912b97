/// One-shot instruction produced by the engine and consumed, in order, by
/// the executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Pause,
    Play,
    /// Seek the delayed surface, in seconds from the start of the recording.
    SetTime(f64),
    /// Seconds left before playback can start.
    SetWaiting(u32),
    SetLive,
    GoToEnd,
    DoStopRecord,
}
