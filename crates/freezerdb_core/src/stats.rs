//! Freezer statistics.
//!
//! Counters are updated on every append and fetch and can be read at any
//! time without blocking the write path.
//!
//! ```rust,ignore
//! let freezer = Freezer::open_in_memory()?;
//! freezer.append_receipts(&[b"r0", b"r1"])?;
//!
//! let stats = freezer.stats();
//! println!("appends: {}, compressed bytes: {}", stats.appends, stats.bytes_written);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Freezer statistics.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct FreezerStats {
    /// Records appended.
    appends: AtomicU64,
    /// Records fetched.
    reads: AtomicU64,
    /// Compressed payload bytes written.
    bytes_written: AtomicU64,
    /// Uncompressed bytes returned to readers.
    bytes_read: AtomicU64,
    /// Segments sealed and replaced by a new one.
    rotations: AtomicU64,
    /// Index reconstructions from segment frames.
    index_rebuilds: AtomicU64,
    /// Failed appends and fetches.
    errors: AtomicU64,
}

impl FreezerStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_append(&self, compressed_bytes: u64) {
        self.appends.fetch_add(1, Ordering::Relaxed);
        self.bytes_written
            .fetch_add(compressed_bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: u64) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_rebuild(&self) {
        self.index_rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of records appended.
    pub fn appends(&self) -> u64 {
        self.appends.load(Ordering::Relaxed)
    }

    /// Returns the number of records fetched.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of errors seen by appends and fetches.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            appends: self.appends(),
            reads: self.reads(),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
            index_rebuilds: self.index_rebuilds.load(Ordering::Relaxed),
            errors: self.errors(),
        }
    }
}

/// A point-in-time snapshot of freezer statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Records appended.
    pub appends: u64,
    /// Records fetched.
    pub reads: u64,
    /// Compressed payload bytes written.
    pub bytes_written: u64,
    /// Uncompressed bytes returned to readers.
    pub bytes_read: u64,
    /// Segment rotations.
    pub rotations: u64,
    /// Index reconstructions.
    pub index_rebuilds: u64,
    /// Failed appends and fetches.
    pub errors: u64,
}
