//! Where a freezer keeps its bytes.
//!
//! The segment store and the index only see [`StorageBackend`]s. A
//! [`Layout`] hands those out: one per segment plus one for the index.
//! [`crate::FreezerDir`] maps them onto files in a directory;
//! [`MemoryLayout`] keeps everything on the heap.

use crate::error::{FreezerError, FreezerResult};
use crate::types::SegmentId;
use freezerdb_storage::{InMemoryBackend, StorageBackend};
use std::fmt;

/// Source of storage backends for segments and the index.
pub trait Layout: Send + Sync + fmt::Debug {
    /// Returns true if backends handed out reject writes.
    fn is_read_only(&self) -> bool;

    /// Lists existing segments in ascending order.
    fn segment_ids(&self) -> FreezerResult<Vec<SegmentId>>;

    /// Opens an existing segment.
    fn open_segment(&self, id: SegmentId) -> FreezerResult<Box<dyn StorageBackend>>;

    /// Creates a new, empty segment.
    fn create_segment(&self, id: SegmentId) -> FreezerResult<Box<dyn StorageBackend>>;

    /// Opens the index, or returns `None` if no index has been written.
    fn open_index(&self) -> FreezerResult<Option<Box<dyn StorageBackend>>>;

    /// Atomically replaces the index with `contents` and returns a backend
    /// positioned to append after them.
    fn replace_index(&self, contents: &[u8]) -> FreezerResult<Box<dyn StorageBackend>>;
}

/// A layout that keeps all segments and the index in memory.
///
/// Nothing survives the freezer; used for tests and scratch stores.
#[derive(Debug, Default)]
pub struct MemoryLayout;

impl MemoryLayout {
    /// Creates a new in-memory layout.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Layout for MemoryLayout {
    fn is_read_only(&self) -> bool {
        false
    }

    fn segment_ids(&self) -> FreezerResult<Vec<SegmentId>> {
        Ok(Vec::new())
    }

    fn open_segment(&self, id: SegmentId) -> FreezerResult<Box<dyn StorageBackend>> {
        Err(FreezerError::invalid_operation(format!(
            "in-memory layout has no persisted {id}"
        )))
    }

    fn create_segment(&self, _id: SegmentId) -> FreezerResult<Box<dyn StorageBackend>> {
        Ok(Box::new(InMemoryBackend::new()))
    }

    fn open_index(&self) -> FreezerResult<Option<Box<dyn StorageBackend>>> {
        Ok(Some(Box::new(InMemoryBackend::new())))
    }

    fn replace_index(&self, contents: &[u8]) -> FreezerResult<Box<dyn StorageBackend>> {
        Ok(Box::new(InMemoryBackend::with_data(contents.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_layout_starts_empty() {
        let layout = MemoryLayout::new();
        assert!(layout.segment_ids().unwrap().is_empty());
        assert!(!layout.is_read_only());

        let index = layout.open_index().unwrap().unwrap();
        assert_eq!(index.size().unwrap(), 0);
    }

    #[test]
    fn memory_layout_replace_index_keeps_contents() {
        let layout = MemoryLayout::new();
        let index = layout.replace_index(&[1, 2, 3]).unwrap();
        assert_eq!(index.read_at(0, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn memory_layout_cannot_open_unknown_segment() {
        let layout = MemoryLayout::new();
        assert!(layout.open_segment(SegmentId::new(0)).is_err());
        assert_eq!(
            layout.create_segment(SegmentId::new(0)).unwrap().size().unwrap(),
            0
        );
    }
}
