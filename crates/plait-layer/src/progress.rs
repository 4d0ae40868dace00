//! Progress reporting that another thread can poll, and call timings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use plait_types::Technique;

/// Shared progress of one encode, decode or repair call.
///
/// The codec advances `current` after finishing each read-in; any thread
/// holding a reference may take a [`snapshot`](ProgressContext::snapshot).
#[derive(Debug)]
pub struct ProgressContext {
    technique: Technique,
    total: AtomicUsize,
    current: AtomicUsize,
}

/// A point-in-time copy of a [`ProgressContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub technique: Technique,
    pub current_readin: usize,
    pub total_readins: usize,
}

impl ProgressSnapshot {
    /// Fraction completed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total_readins == 0 {
            0.0
        } else {
            self.current_readin as f64 / self.total_readins as f64
        }
    }
}

impl ProgressContext {
    pub fn new(technique: Technique) -> Self {
        Self {
            technique,
            total: AtomicUsize::new(0),
            current: AtomicUsize::new(0),
        }
    }

    pub(crate) fn start(&self, total: usize) {
        self.current.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    pub(crate) fn advance(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            technique: self.technique,
            current_readin: self.current.load(Ordering::Relaxed),
            total_readins: self.total.load(Ordering::Relaxed),
        }
    }
}

/// Timings of one encode, decode or repair call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CodecStats {
    /// Object (or fragment) bytes processed.
    pub bytes: u64,
    /// Time spent in base coding and the coupling transform.
    pub coding: Duration,
    /// Wall-clock time of the whole call, including fragment I/O.
    pub total: Duration,
}

impl CodecStats {
    fn rate(bytes: u64, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            bytes as f64 / (1024.0 * 1024.0) / secs
        }
    }

    /// Coding throughput in MiB/s.
    pub fn coding_rate(&self) -> f64 {
        Self::rate(self.bytes, self.coding)
    }

    /// End-to-end throughput in MiB/s.
    pub fn total_rate(&self) -> f64 {
        Self::rate(self.bytes, self.total)
    }
}
