//! Segment store management.

use crate::compression::Codec;
use crate::error::{FreezerError, FreezerResult};
use crate::layout::Layout;
use crate::segment::frame::{FrameHeader, SegmentHeader, FRAME_HEADER_SIZE, SEGMENT_HEADER_SIZE};
use crate::stats::FreezerStats;
use crate::types::{Location, SegmentId};
use freezerdb_storage::{StorageBackend, StorageError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One segment file and what is known about it.
struct Segment {
    id: SegmentId,
    backend: RwLock<Box<dyn StorageBackend>>,
    sealed: AtomicBool,
    record_count: AtomicU32,
}

impl Segment {
    fn new(id: SegmentId, backend: Box<dyn StorageBackend>, header: SegmentHeader) -> Self {
        Self {
            id,
            backend: RwLock::new(backend),
            sealed: AtomicBool::new(header.is_sealed()),
            record_count: AtomicU32::new(header.record_count.unwrap_or(0)),
        }
    }

    fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    fn record_count(&self) -> u32 {
        self.record_count.load(Ordering::Acquire)
    }
}

/// Summary of one segment, for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    /// Segment identifier.
    pub id: SegmentId,
    /// File size in bytes, header included.
    pub size: u64,
    /// Whether the segment has been sealed.
    pub sealed: bool,
    /// Number of records stored in the segment.
    pub record_count: u32,
}

/// Result of walking every frame of a segment.
#[derive(Debug, Clone)]
pub struct SegmentScan {
    /// The segment that was scanned.
    pub segment: SegmentId,
    /// Locations of all intact frames, in file order.
    pub frames: Vec<Location>,
    /// Offset just past the last intact frame.
    pub valid_len: u64,
    /// File size at the time of the scan.
    pub size: u64,
    /// Record count stored in the header of a sealed segment.
    pub sealed_count: Option<u32>,
    /// Offset of the first damaged frame, if the walk stopped on one.
    pub damaged_at: Option<u64>,
}

impl SegmentScan {
    /// Returns true if the current segment ends in an interrupted append.
    #[must_use]
    pub fn has_torn_tail(&self) -> bool {
        self.damaged_at.is_none() && self.valid_len < self.size
    }

    /// Fails with `Corruption` if the walk stopped on a damaged frame, or if
    /// a sealed segment holds a different number of frames than its header
    /// says.
    pub fn check(&self) -> FreezerResult<()> {
        if let Some(offset) = self.damaged_at {
            return Err(FreezerError::corruption(
                format!("damaged frame in {} at offset {offset}", self.segment),
                None,
            ));
        }
        if let Some(count) = self.sealed_count {
            if count as usize != self.frames.len() {
                return Err(FreezerError::corruption(
                    format!(
                        "{} is sealed with {count} records but holds {}",
                        self.segment,
                        self.frames.len()
                    ),
                    None,
                ));
            }
        }
        Ok(())
    }
}

/// Manages the ordered list of segments.
///
/// Appends go to the last segment. When it would grow past
/// `max_segment_size` it is sealed and a new segment is created. Sealed
/// segments are only ever read.
pub struct SegmentStore {
    layout: Arc<dyn Layout>,
    codec: Arc<dyn Codec>,
    max_segment_size: u64,
    sync_on_append: bool,
    segments: RwLock<Vec<Arc<Segment>>>,
    writer: Mutex<()>,
    stats: Arc<FreezerStats>,
}

impl SegmentStore {
    /// Opens every segment the layout knows about.
    ///
    /// # Errors
    ///
    /// - `Corruption` if segment ids have gaps or a segment other than the
    ///   last one is still open
    /// - `InvalidFormat` if a segment was written with a different codec or
    ///   a newer format version
    pub fn open(
        layout: Arc<dyn Layout>,
        codec: Arc<dyn Codec>,
        max_segment_size: u64,
        sync_on_append: bool,
        stats: Arc<FreezerStats>,
    ) -> FreezerResult<Self> {
        let ids = layout.segment_ids()?;
        let mut segments = Vec::with_capacity(ids.len());

        for (position, &id) in ids.iter().enumerate() {
            if id.as_u32() as usize != position {
                return Err(FreezerError::corruption(
                    format!("segment seg:{position} is missing, found {id}"),
                    None,
                ));
            }
            let is_last = position + 1 == ids.len();

            let mut backend = layout.open_segment(id)?;
            if backend.size()? < SEGMENT_HEADER_SIZE {
                if !is_last {
                    return Err(FreezerError::corruption(
                        format!("{id} is shorter than its header"),
                        None,
                    ));
                }
                if layout.is_read_only() {
                    warn!("Ignoring {} with incomplete header", id);
                    continue;
                }
                // Interrupted while the segment was being created.
                warn!("Reinitialising {} with incomplete header", id);
                let header = SegmentHeader::open(codec.tag());
                backend.truncate(0)?;
                backend.append(&header.encode())?;
                backend.sync()?;
                segments.push(Arc::new(Segment::new(id, backend, header)));
                continue;
            }

            let header = SegmentHeader::decode(&backend.read_at(0, SEGMENT_HEADER_SIZE as usize)?)?;
            if header.codec_tag != codec.tag() {
                return Err(FreezerError::invalid_format(format!(
                    "{id} uses codec tag {}, freezer is configured for {} ({})",
                    header.codec_tag,
                    codec.name(),
                    codec.tag()
                )));
            }
            if !header.is_sealed() && !is_last {
                return Err(FreezerError::corruption(
                    format!("{id} is not sealed but is followed by another segment"),
                    None,
                ));
            }

            segments.push(Arc::new(Segment::new(id, backend, header)));
        }

        debug!("Opened {} segments", segments.len());

        Ok(Self {
            layout,
            codec,
            max_segment_size,
            sync_on_append,
            segments: RwLock::new(segments),
            writer: Mutex::new(()),
            stats,
        })
    }

    /// Reads the codec tag stored in the first segment, if any segment exists.
    pub fn stored_codec_tag(layout: &dyn Layout) -> FreezerResult<Option<u8>> {
        let Some(&first) = layout.segment_ids()?.first() else {
            return Ok(None);
        };
        let backend = layout.open_segment(first)?;
        if backend.size()? < SEGMENT_HEADER_SIZE {
            return Ok(None);
        }
        let header = SegmentHeader::decode(&backend.read_at(0, SEGMENT_HEADER_SIZE as usize)?)?;
        Ok(Some(header.codec_tag))
    }

    /// Returns the codec used for new frames.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Appends one record and returns where it was written.
    ///
    /// The frame is flushed (or synced, with `sync_on_append`) before this
    /// returns. On failure the segment is cut back to its previous size.
    pub fn append(&self, record: &[u8]) -> FreezerResult<Location> {
        let compressed = self.codec.compress(record);
        let header = FrameHeader::for_payload(&compressed, record.len())?;
        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE as usize + compressed.len());
        frame.extend_from_slice(&header.encode());
        frame.extend_from_slice(&compressed);

        let _writer = self.writer.lock();
        let segment = self.writable_segment(frame.len() as u64)?;

        // The backend is only locked to place the frame. The index entry is
        // recorded after this returns, so no reader can reach the frame
        // while it is being synced.
        let offset = {
            let mut backend = segment.backend.write();
            let offset = backend.size()?;
            if let Err(err) = write_frame(&mut **backend, &frame) {
                warn!("Append to {} failed at offset {}: {}", segment.id, offset, err);
                if let Err(rollback) = backend.truncate(offset) {
                    warn!("Rollback of {} to {} failed: {}", segment.id, offset, rollback);
                }
                return Err(err.into());
            }
            offset
        };

        if self.sync_on_append {
            let synced = segment.backend.read().sync();
            if let Err(err) = synced {
                warn!("Sync of {} failed at offset {}: {}", segment.id, offset, err);
                if let Err(rollback) = segment.backend.write().truncate(offset) {
                    warn!("Rollback of {} to {} failed: {}", segment.id, offset, rollback);
                }
                return Err(err.into());
            }
        }

        segment.record_count.fetch_add(1, Ordering::AcqRel);

        Ok(Location {
            segment: segment.id,
            offset,
            compressed_len: header.compressed_len,
            uncompressed_len: header.uncompressed_len,
        })
    }

    /// Returns the segment the next frame goes to, rotating if needed.
    ///
    /// Called with the writer lock held. The segment table is only locked
    /// to look up the current segment and to push a new one, never while
    /// a segment is being sealed or created.
    fn writable_segment(&self, frame_len: u64) -> FreezerResult<Arc<Segment>> {
        let current = self.segments.read().last().cloned();

        if let Some(current) = &current {
            if !current.is_sealed() {
                let size = current.backend.read().size()?;
                let full =
                    current.record_count() > 0 && size + frame_len > self.max_segment_size;
                if !full {
                    return Ok(Arc::clone(current));
                }
                self.seal(current)?;
                self.stats.record_rotation();
            }
        }

        let id = current.map_or(SegmentId::new(0), |s| s.id.next());
        let segment = self.create_segment(id)?;
        self.segments.write().push(Arc::clone(&segment));
        debug!("Rotated to {}", id);
        Ok(segment)
    }

    fn seal(&self, segment: &Segment) -> FreezerResult<()> {
        let count = segment.record_count();
        let header = SegmentHeader::open(self.codec.tag()).sealed(count);

        segment.backend.write().write_at(0, &header.encode())?;
        segment.backend.read().sync()?;
        segment.sealed.store(true, Ordering::Release);

        info!("Sealed {} with {} records", segment.id, count);
        Ok(())
    }

    fn create_segment(&self, id: SegmentId) -> FreezerResult<Arc<Segment>> {
        let header = SegmentHeader::open(self.codec.tag());
        let mut backend = self.layout.create_segment(id)?;
        backend.append(&header.encode())?;
        backend.sync()?;
        Ok(Arc::new(Segment::new(id, backend, header)))
    }

    fn segment(&self, id: SegmentId) -> Option<Arc<Segment>> {
        self.segments.read().get(id.as_u32() as usize).cloned()
    }

    /// Reads exactly `len` raw bytes from a segment.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if the segment does not exist or the range runs past
    /// its end.
    pub fn read(&self, id: SegmentId, offset: u64, len: usize) -> FreezerResult<Vec<u8>> {
        let out_of_range = || FreezerError::OutOfRange {
            segment: id,
            offset,
            len: len as u64,
        };

        let segment = self.segment(id).ok_or_else(out_of_range)?;
        let backend = segment.backend.read();
        backend.read_at(offset, len).map_err(|err| match err {
            StorageError::ReadPastEnd { .. } => out_of_range(),
            other => other.into(),
        })
    }

    /// Reads, verifies and decompresses the record at `location`.
    pub fn read_frame(&self, location: &Location) -> FreezerResult<Vec<u8>> {
        let raw = self.read(location.segment, location.offset, location.frame_len() as usize)?;
        let header = FrameHeader::decode(&raw)?;

        if header.compressed_len != location.compressed_len
            || header.uncompressed_len != location.uncompressed_len
        {
            return Err(FreezerError::corruption(
                format!(
                    "frame at {} offset {} does not match its index entry",
                    location.segment, location.offset
                ),
                None,
            ));
        }

        let payload = &raw[FRAME_HEADER_SIZE as usize..];
        header.verify(payload)?;
        self.codec
            .decompress(payload, location.uncompressed_len as usize)
    }

    /// Walks every frame in a segment.
    ///
    /// In the current (unsealed) segment, trailing bytes that do not form a
    /// complete frame are reported as a torn tail: fewer bytes than a frame
    /// header, or an intact header whose payload runs past the end of the
    /// file. A payload checksum failure on a frame that ends exactly at the
    /// end of the current segment is treated the same way. A header that
    /// fails its own checksum, and any damage elsewhere, stops the walk and
    /// is reported through [`SegmentScan::damaged_at`].
    pub fn scan(&self, id: SegmentId) -> FreezerResult<SegmentScan> {
        let segment = self.segment(id).ok_or(FreezerError::OutOfRange {
            segment: id,
            offset: 0,
            len: 0,
        })?;
        let sealed = segment.is_sealed();
        let backend = segment.backend.read();
        let size = backend.size()?;

        let mut frames = Vec::new();
        let mut offset = SEGMENT_HEADER_SIZE;
        let mut damaged_at = None;

        while offset < size {
            let remaining = size - offset;
            if remaining < FRAME_HEADER_SIZE {
                damaged_at = sealed.then_some(offset);
                break;
            }

            let Ok(header) =
                FrameHeader::decode(&backend.read_at(offset, FRAME_HEADER_SIZE as usize)?)
            else {
                damaged_at = Some(offset);
                break;
            };
            let frame_len = FRAME_HEADER_SIZE + u64::from(header.compressed_len);
            if frame_len > remaining {
                damaged_at = sealed.then_some(offset);
                break;
            }

            let payload =
                backend.read_at(offset + FRAME_HEADER_SIZE, header.compressed_len as usize)?;
            if header.verify(&payload).is_err() {
                let torn = !sealed && offset + frame_len == size;
                damaged_at = (!torn).then_some(offset);
                break;
            }

            frames.push(Location {
                segment: id,
                offset,
                compressed_len: header.compressed_len,
                uncompressed_len: header.uncompressed_len,
            });
            offset += frame_len;
        }

        Ok(SegmentScan {
            segment: id,
            frames,
            valid_len: offset.min(size),
            size,
            sealed_count: sealed.then(|| segment.record_count()),
            damaged_at,
        })
    }

    /// Cuts the current segment back to `len` bytes.
    pub fn truncate_tail(&self, id: SegmentId, len: u64) -> FreezerResult<()> {
        let segment = self.segment(id).ok_or(FreezerError::OutOfRange {
            segment: id,
            offset: len,
            len: 0,
        })?;
        if segment.is_sealed() {
            return Err(FreezerError::invalid_operation(format!(
                "cannot truncate sealed {id}"
            )));
        }

        let mut backend = segment.backend.write();
        backend.truncate(len)?;
        backend.sync()?;
        Ok(())
    }

    /// Removes the frame at `location`, which must be the last one written.
    pub fn rollback(&self, location: &Location) -> FreezerResult<()> {
        self.truncate_tail(location.segment, location.offset)?;
        if let Some(segment) = self.segment(location.segment) {
            // A count already at zero was reset by recovery and stays there.
            segment
                .record_count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .ok();
        }
        Ok(())
    }

    /// Sets the record count of the current segment once it is known.
    pub(crate) fn set_record_count(&self, id: SegmentId, count: u32) {
        if let Some(segment) = self.segment(id) {
            if !segment.is_sealed() {
                segment.record_count.store(count, Ordering::Release);
            }
        }
    }

    /// Returns the ids of all segments in order.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        self.segments.read().iter().map(|s| s.id).collect()
    }

    /// Returns the size of a segment in bytes.
    pub fn segment_size(&self, id: SegmentId) -> FreezerResult<u64> {
        let segment = self.segment(id).ok_or(FreezerError::OutOfRange {
            segment: id,
            offset: 0,
            len: 0,
        })?;
        let size = segment.backend.read().size()?;
        Ok(size)
    }

    /// Returns a summary of each segment.
    pub fn segment_info(&self) -> FreezerResult<Vec<SegmentInfo>> {
        self.segments
            .read()
            .iter()
            .map(|s| {
                Ok(SegmentInfo {
                    id: s.id,
                    size: s.backend.read().size()?,
                    sealed: s.is_sealed(),
                    record_count: s.record_count(),
                })
            })
            .collect()
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Returns the combined size of all segments.
    pub fn total_size(&self) -> FreezerResult<u64> {
        let mut total = 0;
        for segment in self.segments.read().iter() {
            total += segment.backend.read().size()?;
        }
        Ok(total)
    }

    /// Flushes the current segment.
    pub fn flush(&self) -> FreezerResult<()> {
        let current = self.segments.read().last().cloned();
        if let Some(current) = current {
            if !self.layout.is_read_only() {
                current.backend.write().flush()?;
            }
        }
        Ok(())
    }

    /// Syncs the current segment to durable storage.
    pub fn sync(&self) -> FreezerResult<()> {
        let current = self.segments.read().last().cloned();
        if let Some(current) = current {
            if !self.layout.is_read_only() {
                current.backend.read().sync()?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStore")
            .field("codec", &self.codec.name())
            .field("max_segment_size", &self.max_segment_size)
            .field("segments", &self.segment_count())
            .finish_non_exhaustive()
    }
}

fn write_frame(backend: &mut dyn StorageBackend, frame: &[u8]) -> Result<(), StorageError> {
    backend.append(frame)?;
    backend.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::Compression;
    use crate::dir::FreezerDir;
    use crate::layout::MemoryLayout;
    use crate::ErrorKind;
    use tempfile::tempdir;

    // Uncompressed so that frame sizes are predictable.
    fn memory_store(max_segment_size: u64) -> SegmentStore {
        SegmentStore::open(
            Arc::new(MemoryLayout::new()),
            Arc::new(Compression::None),
            max_segment_size,
            true,
            Arc::new(FreezerStats::new()),
        )
        .unwrap()
    }

    fn dir_store(path: &std::path::Path, max_segment_size: u64) -> SegmentStore {
        let dir = FreezerDir::open(path, true, false).unwrap();
        SegmentStore::open(
            Arc::new(dir),
            Arc::new(Compression::Lz4),
            max_segment_size,
            true,
            Arc::new(FreezerStats::new()),
        )
        .unwrap()
    }

    #[test]
    fn append_and_read_frame() {
        let store = memory_store(1024);

        let a = store.append(b"r0").unwrap();
        let b = store.append(b"r1").unwrap();

        assert_eq!(a.segment, SegmentId::new(0));
        assert_eq!(a.offset, SEGMENT_HEADER_SIZE);
        assert_eq!(b.offset, a.end());
        assert_eq!(store.read_frame(&a).unwrap(), b"r0");
        assert_eq!(store.read_frame(&b).unwrap(), b"r1");
    }

    #[test]
    fn rotation_seals_previous_segment() {
        let store = memory_store(64);
        let record = vec![0xA5u8; 40];

        let first = store.append(&record).unwrap();
        let second = store.append(&record).unwrap();

        assert_eq!(first.segment, SegmentId::new(0));
        assert_eq!(second.segment, SegmentId::new(1));
        assert_eq!(second.offset, SEGMENT_HEADER_SIZE);

        let info = store.segment_info().unwrap();
        assert!(info[0].sealed);
        assert_eq!(info[0].record_count, 1);
        assert!(!info[1].sealed);

        let header = SegmentHeader::decode(&store.read(SegmentId::new(0), 0, 8).unwrap()).unwrap();
        assert_eq!(header.record_count, Some(1));
        assert_eq!(store.read_frame(&first).unwrap(), record);
    }

    #[test]
    fn oversized_record_gets_its_own_segment() {
        let store = memory_store(32);
        let big: Vec<u8> = (0..=255u8).collect();

        let a = store.append(b"small").unwrap();
        let b = store.append(&big).unwrap();
        let c = store.append(b"after").unwrap();

        assert_eq!(a.segment, SegmentId::new(0));
        assert_eq!(b.segment, SegmentId::new(1));
        assert_eq!(c.segment, SegmentId::new(2));
        assert_eq!(store.read_frame(&b).unwrap(), big);
    }

    #[test]
    fn read_outside_segment_is_out_of_range() {
        let store = memory_store(1024);
        store.append(b"r0").unwrap();

        let err = store.read(SegmentId::new(0), 0, 4096).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = store.read(SegmentId::new(7), 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn scan_lists_frames_and_torn_tail() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("scan");
        let (last, expected_len) = {
            let store = dir_store(&path, 1 << 20);
            store.append(b"r0").unwrap();
            let last = store.append(b"r1").unwrap();
            (last, last.end())
        };

        let seg_path = path.join("segments").join("seg-000000.dat");
        let mut bytes = std::fs::read(&seg_path).unwrap();
        bytes.extend_from_slice(&[0x10, 0, 0, 0, 0x10]);
        std::fs::write(&seg_path, &bytes).unwrap();

        let store = dir_store(&path, 1 << 20);
        let scan = store.scan(SegmentId::new(0)).unwrap();
        assert_eq!(scan.frames.len(), 2);
        assert_eq!(scan.frames[1], last);
        assert_eq!(scan.valid_len, expected_len);
        assert!(scan.has_torn_tail());

        store.truncate_tail(SegmentId::new(0), scan.valid_len).unwrap();
        assert!(!store.scan(SegmentId::new(0)).unwrap().has_torn_tail());
    }

    #[test]
    fn scan_reports_damage_before_the_tail() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("damaged");
        let first = {
            let store = dir_store(&path, 1 << 20);
            let first = store.append(b"receipt-zero").unwrap();
            store.append(b"receipt-one").unwrap();
            first
        };

        let seg_path = path.join("segments").join("seg-000000.dat");
        let mut bytes = std::fs::read(&seg_path).unwrap();
        bytes[(first.offset + FRAME_HEADER_SIZE) as usize] ^= 0xFF;
        std::fs::write(&seg_path, &bytes).unwrap();

        let store = dir_store(&path, 1 << 20);
        let scan = store.scan(SegmentId::new(0)).unwrap();
        assert_eq!(scan.damaged_at, Some(first.offset));
        assert!(scan.frames.is_empty());
        assert!(!scan.has_torn_tail());
        assert_eq!(scan.check().unwrap_err().kind(), ErrorKind::Corruption);
        assert_eq!(store.read_frame(&first).unwrap_err().kind(), ErrorKind::Corruption);
    }

    #[test]
    fn damaged_length_in_open_segment_is_not_a_torn_tail() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("length");
        let second = {
            let store = dir_store(&path, 1 << 20);
            store.append(b"receipt-zero").unwrap();
            let second = store.append(b"receipt-one").unwrap();
            store.append(b"receipt-two").unwrap();
            second
        };

        let seg_path = path.join("segments").join("seg-000000.dat");
        let mut bytes = std::fs::read(&seg_path).unwrap();
        bytes[second.offset as usize + 3] = 0x7f;
        std::fs::write(&seg_path, &bytes).unwrap();

        let store = dir_store(&path, 1 << 20);
        let scan = store.scan(SegmentId::new(0)).unwrap();
        assert_eq!(scan.frames.len(), 1);
        assert_eq!(scan.damaged_at, Some(second.offset));
        assert!(!scan.has_torn_tail());
        assert_eq!(scan.check().unwrap_err().kind(), ErrorKind::Corruption);
    }

    #[test]
    fn reopen_rejects_other_codec() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("codec");
        dir_store(&path, 1024).append(b"r0").unwrap();

        let dir = FreezerDir::open(&path, false, false).unwrap();
        let err = SegmentStore::open(
            Arc::new(dir),
            Arc::new(Compression::None),
            1024,
            true,
            Arc::new(FreezerStats::new()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn gap_in_segment_ids_is_corruption() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("gap");
        {
            let store = dir_store(&path, 32);
            for _ in 0..3 {
                store.append(&[1u8; 30]).unwrap();
            }
            assert_eq!(store.segment_count(), 3);
        }
        std::fs::remove_file(path.join("segments").join("seg-000001.dat")).unwrap();

        let dir = FreezerDir::open(&path, false, false).unwrap();
        let err = SegmentStore::open(
            Arc::new(dir),
            Arc::new(Compression::Lz4),
            32,
            true,
            Arc::new(FreezerStats::new()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corruption);
    }

    #[test]
    fn rollback_removes_last_frame() {
        let store = memory_store(1024);
        store.append(b"r0").unwrap();
        let loc = store.append(b"r1").unwrap();

        store.rollback(&loc).unwrap();
        assert_eq!(store.segment_size(SegmentId::new(0)).unwrap(), loc.offset);
        assert_eq!(store.segment_info().unwrap()[0].record_count, 1);
    }
}
