//! Error types for freezerdb core.

use crate::types::SegmentId;
use freezerdb_storage::StorageError;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type FreezerResult<T> = Result<T, FreezerError>;

/// Coarse classification of a [`FreezerError`].
///
/// Callers use the kind to decide between "not yet written" and
/// "unrecoverable" without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The sequence number has not been committed yet.
    NotFound,
    /// A physical location does not exist in the segment store.
    OutOfRange,
    /// The append contract was violated.
    OutOfOrder,
    /// The storage medium failed. Nothing was committed.
    IoFailure,
    /// Stored data is damaged.
    Corruption,
    /// Another process holds the freezer directory.
    Locked,
    /// On-disk data does not match what this build understands.
    InvalidFormat,
    /// The operation is not permitted in the current mode.
    InvalidOperation,
    /// The freezer has been closed.
    Closed,
}

/// Errors that can occur in freezer operations.
#[derive(Debug, Error)]
pub enum FreezerError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Sequence number not yet committed.
    #[error("receipt {sequence} not found: head is {head}")]
    NotFound {
        /// The requested sequence number.
        sequence: u64,
        /// The head at the time of the lookup.
        head: u64,
    },

    /// A physical location lies outside the segment store.
    #[error("location out of range in {segment}: offset {offset}, len {len}")]
    OutOfRange {
        /// The segment addressed.
        segment: SegmentId,
        /// The requested offset.
        offset: u64,
        /// The requested length.
        len: u64,
    },

    /// An index entry was recorded out of sequence.
    #[error("out-of-order append: expected sequence {expected}, got {actual}")]
    OutOfOrder {
        /// The current head.
        expected: u64,
        /// The sequence number supplied.
        actual: u64,
    },

    /// Stored data is damaged.
    #[error("corruption: {message} (last good sequence: {last_good:?})")]
    Corruption {
        /// Description of the corruption.
        message: String,
        /// Highest sequence number known to be intact, if any.
        last_good: Option<u64>,
    },

    /// The freezer directory is locked by another process.
    #[error("freezer locked: another process has exclusive access")]
    Locked,

    /// Invalid freezer format or version.
    #[error("invalid freezer format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// The freezer is closed.
    #[error("freezer is closed")]
    Closed,

    /// A batch append stopped part way through.
    ///
    /// Records before the failing one are durable and remain committed.
    #[error("batch append stopped after {committed} of {requested} records: {source}")]
    PartialBatch {
        /// Sequence number of the last committed record, if any exist.
        last_committed: Option<u64>,
        /// Number of records from this batch that were committed.
        committed: usize,
        /// Number of records in the batch.
        requested: usize,
        /// The failure that stopped the batch.
        #[source]
        source: Box<FreezerError>,
    },
}

impl FreezerError {
    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>, last_good: Option<u64>) -> Self {
        Self::Corruption {
            message: message.into(),
            last_good,
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(StorageError::ReadOnly) => ErrorKind::InvalidOperation,
            Self::Storage(StorageError::ReadPastEnd { .. }) => ErrorKind::OutOfRange,
            Self::Storage(_) | Self::Io(_) => ErrorKind::IoFailure,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::OutOfOrder { .. } => ErrorKind::OutOfOrder,
            Self::Corruption { .. } => ErrorKind::Corruption,
            Self::Locked => ErrorKind::Locked,
            Self::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::Closed => ErrorKind::Closed,
            Self::PartialBatch { source, .. } => source.kind(),
        }
    }

    /// Returns true if repeating the operation later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound | ErrorKind::IoFailure)
    }

    /// Returns the last known-good sequence number carried by a corruption error.
    #[must_use]
    pub fn last_good(&self) -> Option<u64> {
        match self {
            Self::Corruption { last_good, .. } => *last_good,
            Self::PartialBatch { source, .. } => source.last_good(),
            _ => None,
        }
    }

    /// Fills in the last known-good sequence number on a corruption error
    /// raised below the index, where sequence numbers are not known.
    #[must_use]
    pub fn with_last_good(self, sequence: Option<u64>) -> Self {
        match self {
            Self::Corruption {
                message,
                last_good: None,
            } => Self::Corruption {
                message,
                last_good: sequence,
            },
            other => other,
        }
    }
}
