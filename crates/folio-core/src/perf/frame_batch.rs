#![forbid(unsafe_code)]

//! Read/write batching per animation frame, and a frame-rate gate.
//!
//! Interleaving layout reads and style writes forces the browser to reflow
//! repeatedly. [`FrameBatch`] queues callbacks into a read phase and a write
//! phase; the next frame runs every read before any write.
//!
//! Enqueueing only reports that a frame is needed for the first callback of a
//! batch, so the host requests at most one animation frame per batch.
//! Callbacks enqueued while a batch runs land in the following batch.

use std::fmt;
use std::time::Duration;

/// A deferred zero-argument callback.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Pending read and write callbacks for the next frame.
#[derive(Default)]
pub struct FrameBatch {
    reads: Vec<FrameCallback>,
    writes: Vec<FrameCallback>,
    frame_requested: bool,
}

impl fmt::Debug for FrameBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBatch")
            .field("reads", &self.reads.len())
            .field("writes", &self.writes.len())
            .field("frame_requested", &self.frame_requested)
            .finish()
    }
}

impl FrameBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a layout read. Returns `true` when a frame must be requested.
    pub fn schedule_read(&mut self, callback: FrameCallback) -> bool {
        self.reads.push(callback);
        self.request_frame()
    }

    /// Queue a DOM write. Returns `true` when a frame must be requested.
    pub fn schedule_write(&mut self, callback: FrameCallback) -> bool {
        self.writes.push(callback);
        self.request_frame()
    }

    fn request_frame(&mut self) -> bool {
        !std::mem::replace(&mut self.frame_requested, true)
    }

    /// Whether callbacks are waiting for a frame.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.frame_requested
    }

    /// Detach the queued callbacks so they can run without holding `self`.
    pub fn take(&mut self) -> ReadyBatch {
        self.frame_requested = false;
        ReadyBatch {
            reads: std::mem::take(&mut self.reads),
            writes: std::mem::take(&mut self.writes),
        }
    }
}

/// Callbacks detached from a [`FrameBatch`], ready to run.
#[derive(Default)]
pub struct ReadyBatch {
    reads: Vec<FrameCallback>,
    writes: Vec<FrameCallback>,
}

impl ReadyBatch {
    /// Run every read, then every write. Returns how many callbacks ran.
    pub fn run(self) -> usize {
        let count = self.reads.len() + self.writes.len();
        for read in self.reads {
            read();
        }
        for write in self.writes {
            write();
        }
        count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty() && self.writes.is_empty()
    }
}

/// Target rate for [`FrameGate`].
pub const TARGET_FPS: u32 = 60;

/// Admits animation frames no faster than [`TARGET_FPS`].
///
/// A frame is admitted when strictly more than one interval has elapsed since
/// the last admitted frame. The remainder is carried over so the cadence does
/// not drift.
#[derive(Debug, Clone, Copy)]
pub struct FrameGate {
    interval: Duration,
    last: Duration,
}

impl FrameGate {
    #[must_use]
    pub fn new(now: Duration) -> Self {
        Self {
            interval: Duration::from_secs(1) / TARGET_FPS,
            last: now,
        }
    }

    pub fn admit(&mut self, now: Duration) -> bool {
        let elapsed = now.saturating_sub(self.last);
        if elapsed <= self.interval {
            return false;
        }
        let carry = Duration::from_nanos(
            (elapsed.as_nanos() % self.interval.as_nanos()).min(u128::from(u64::MAX)) as u64,
        );
        self.last = now - carry;
        true
    }
}
