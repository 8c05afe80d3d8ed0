//! In-memory view of the index backed by the append-only index file.

use crate::error::{FreezerError, FreezerResult};
use crate::types::{IndexEntry, Location};
use freezerdb_storage::StorageBackend;
use parking_lot::{Mutex, RwLock};
use tracing::warn;

/// Maps sequence numbers to record locations.
///
/// Lookups read an in-memory copy of the entries. New entries are written
/// to the backing file first and published only once that write has been
/// flushed, so readers never observe an entry that is not on disk.
pub struct Index {
    backend: Mutex<Box<dyn StorageBackend>>,
    entries: RwLock<Vec<IndexEntry>>,
    sync_on_append: bool,
}

impl Index {
    /// Creates an index over `backend`, whose contents must match `entries`.
    pub fn new(
        backend: Box<dyn StorageBackend>,
        entries: Vec<IndexEntry>,
        sync_on_append: bool,
    ) -> Self {
        Self {
            backend: Mutex::new(backend),
            entries: RwLock::new(entries),
            sync_on_append,
        }
    }

    /// Returns the number of committed entries, which is also the next
    /// sequence number.
    pub fn head(&self) -> u64 {
        self.entries.read().len() as u64
    }

    /// Records the location of `sequence`.
    ///
    /// # Errors
    ///
    /// - `OutOfOrder` if `sequence` is not the current head
    /// - a storage error if the entry could not be written; any partial
    ///   write is cut off again
    pub fn record(&self, sequence: u64, location: Location) -> FreezerResult<()> {
        let mut backend = self.backend.lock();

        let head = self.head();
        if sequence != head {
            return Err(FreezerError::OutOfOrder {
                expected: head,
                actual: sequence,
            });
        }

        let entry = IndexEntry { sequence, location };
        let offset = backend.size()?;
        let written = backend.append(&entry.encode()).and_then(|_| {
            if self.sync_on_append {
                backend.sync()
            } else {
                backend.flush()
            }
        });

        if let Err(err) = written {
            warn!("Index write for sequence {} failed: {}", sequence, err);
            if let Err(rollback) = backend.truncate(offset) {
                warn!("Index rollback to {} failed: {}", offset, rollback);
            }
            return Err(err.into());
        }

        self.entries.write().push(entry);
        Ok(())
    }

    /// Returns the location of `sequence`.
    ///
    /// # Errors
    ///
    /// `NotFound` if `sequence` has not been committed.
    pub fn lookup(&self, sequence: u64) -> FreezerResult<Location> {
        let entries = self.entries.read();
        usize::try_from(sequence)
            .ok()
            .and_then(|i| entries.get(i))
            .map(|entry| entry.location)
            .ok_or(FreezerError::NotFound {
                sequence,
                head: entries.len() as u64,
            })
    }

    /// Returns a copy of all entries.
    pub fn entries(&self) -> Vec<IndexEntry> {
        self.entries.read().clone()
    }

    /// Swaps in a freshly rebuilt index.
    pub(crate) fn replace(&self, backend: Box<dyn StorageBackend>, entries: Vec<IndexEntry>) {
        let mut current = self.backend.lock();
        *current = backend;
        *self.entries.write() = entries;
    }

    /// Flushes the index file.
    pub fn flush(&self) -> FreezerResult<()> {
        self.backend.lock().flush()?;
        Ok(())
    }

    /// Syncs the index file to durable storage.
    pub fn sync(&self) -> FreezerResult<()> {
        self.backend.lock().sync()?;
        Ok(())
    }
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("head", &self.head())
            .field("sync_on_append", &self.sync_on_append)
            .finish_non_exhaustive()
    }
}
