//! Write scheduler (component C6): chunks producer writes and bounds how
//! long a single pump spends inside the parser before yielding, per
//! spec.md §4.5.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Upper bound on bytes handed to the parser per pump iteration. spec.md
/// §4.5 frames this budget in code points; approximated in bytes since
/// the scheduler queues raw input before any UTF-8 decoding happens, and
/// a chunk boundary landing inside a multi-byte sequence is harmless —
/// the parser's state survives across `pump` calls.
const MAX_CHUNK_BYTES: usize = 4096;
const YIELD_BUDGET: Duration = Duration::from_millis(16);

/// What the engine should tell its collaborators after a pump: keep
/// rendering immediately, or wait for the next scheduled tick.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RefreshSignal {
    /// The queue drained; collaborators should refresh now.
    Immediate,
    /// The yield budget was hit with more queued; a refresh will follow
    /// once the rest has been pumped.
    Soon,
}

/// An unbounded producer queue plus a "pump already scheduled" flag, so
/// the engine only schedules one processing task at a time.
#[derive(Default)]
pub struct WriteScheduler {
    queue: VecDeque<u8>,
    scheduled: bool,
}

impl WriteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn mark_scheduled(&mut self) {
        self.scheduled = true;
    }

    /// Feed `process` chunks of at most [`MAX_CHUNK_BYTES`] until either
    /// the queue drains or the 16ms wall-clock budget is exceeded.
    /// Never processes the same byte twice.
    pub fn pump(&mut self, mut process: impl FnMut(&[u8])) -> RefreshSignal {
        let start = Instant::now();
        self.scheduled = false;
        loop {
            if self.queue.is_empty() {
                return RefreshSignal::Immediate;
            }
            let chunk = self.take_chunk();
            process(&chunk);
            if start.elapsed() >= YIELD_BUDGET {
                self.scheduled = true;
                return RefreshSignal::Soon;
            }
        }
    }

    /// Synchronously drain the whole queue, ignoring the yield budget.
    pub fn flush(&mut self, mut process: impl FnMut(&[u8])) {
        while !self.queue.is_empty() {
            let chunk = self.take_chunk();
            process(&chunk);
        }
        self.scheduled = false;
    }

    fn take_chunk(&mut self) -> Vec<u8> {
        let n = self.queue.len().min(MAX_CHUNK_BYTES);
        self.queue.drain(..n).collect()
    }
}
