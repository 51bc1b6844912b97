use tracing::debug;

use crate::media::capture::Chunk;

/// Two ranges closer than this are treated as contiguous (float noise).
const GAP_TOLERANCE_S: f64 = 1e-6;

/// Where captured chunks go, and what time ranges they cover.
pub trait BufferSink {
    fn append(&mut self, chunk: &Chunk);

    /// End of the zeroth contiguous buffered range, or `None` if nothing
    /// is buffered yet.
    fn buffered_end_seconds(&self) -> Option<f64>;

    /// No more data will be appended.
    fn end_of_stream(&mut self);

    /// Discards everything so a new session can start.
    fn reset(&mut self);
}

/// An append-only media buffer.
///
/// Bytes are never evicted: the whole session stays seekable. Buffered
/// time is kept as a sorted list of disjoint `[start, end)` ranges, merged
/// whenever chunks touch.
#[derive(Debug, Default)]
pub struct MediaBuffer {
    data: Vec<u8>,
    ranges: Vec<(f64, f64)>,
    ended: bool,
}

impl MediaBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    #[cfg(test)]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn insert_range(&mut self, start: f64, end: f64) {
        let idx = self.ranges.partition_point(|&(s, _)| s < start);
        self.ranges.insert(idx, (start, end));

        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(self.ranges.len());
        for &(s, e) in &self.ranges {
            match merged.last_mut() {
                Some(last) if s <= last.1 + GAP_TOLERANCE_S => last.1 = last.1.max(e),
                _ => merged.push((s, e)),
            }
        }
        self.ranges = merged;
    }
}

impl BufferSink for MediaBuffer {
    fn append(&mut self, chunk: &Chunk) {
        if self.ended {
            debug!("dropping chunk appended after end of stream");
            return;
        }
        self.data.extend_from_slice(&chunk.bytes);
        if chunk.duration_s > 0.0 {
            self.insert_range(chunk.start_s, chunk.end_s());
        }
    }

    fn buffered_end_seconds(&self) -> Option<f64> {
        self.ranges.first().map(|&(_, end)| end)
    }

    fn end_of_stream(&mut self) {
        self.ended = true;
    }

    fn reset(&mut self) {
        self.data.clear();
        self.ranges.clear();
        self.ended = false;
    }
}
