//! Index validation and reconstruction on open.

use crate::error::{FreezerError, FreezerResult};
use crate::index::Index;
use crate::layout::Layout;
use crate::segment::{SegmentInfo, SegmentStore, SEGMENT_HEADER_SIZE};
use crate::stats::FreezerStats;
use crate::types::IndexEntry;
use freezerdb_storage::{InMemoryBackend, StorageBackend};
use tracing::{info, warn};

/// Opens the index, rebuilding it from the segments if it cannot be trusted.
///
/// The stored index is used as-is only when it is entry-aligned, contiguous
/// from sequence 0 and covers every segment byte for byte. Otherwise the
/// entries are reconstructed by [`rebuild_entries`] and the file is
/// replaced atomically. A read-only freezer keeps the rebuilt index in
/// memory and leaves the directory untouched.
///
/// # Errors
///
/// `Corruption` with the last good sequence number if a segment frame is
/// damaged anywhere other than the tail of the current segment.
pub fn open_index(
    layout: &dyn Layout,
    segments: &SegmentStore,
    sync_on_append: bool,
    stats: &FreezerStats,
) -> FreezerResult<Index> {
    if let Some(backend) = layout.open_index()? {
        match decode_entries(backend.as_ref()).and_then(|entries| {
            validate_entries(&entries, segments)?;
            Ok(entries)
        }) {
            Ok(entries) => {
                update_record_count(segments, &entries);
                info!("Opened index with {} entries", entries.len());
                return Ok(Index::new(backend, entries, sync_on_append));
            }
            Err(err) => warn!("Index is inconsistent with segments, rebuilding: {}", err),
        }
    } else if segments.segment_count() == 0 {
        let backend: Box<dyn StorageBackend> = if layout.is_read_only() {
            Box::new(InMemoryBackend::new())
        } else {
            layout.replace_index(&[])?
        };
        return Ok(Index::new(backend, Vec::new(), sync_on_append));
    } else {
        warn!("Index file missing, rebuilding from segments");
    }

    let (backend, entries) = rebuild(layout, segments, stats)?;
    Ok(Index::new(backend, entries, sync_on_append))
}

/// Reconstructs the index from segment frames and persists it.
pub(crate) fn rebuild(
    layout: &dyn Layout,
    segments: &SegmentStore,
    stats: &FreezerStats,
) -> FreezerResult<(Box<dyn StorageBackend>, Vec<IndexEntry>)> {
    let entries = rebuild_entries(segments, !layout.is_read_only())?;

    let mut contents = Vec::with_capacity(entries.len() * IndexEntry::ENCODED_SIZE);
    for entry in &entries {
        contents.extend_from_slice(&entry.encode());
    }

    let backend: Box<dyn StorageBackend> = if layout.is_read_only() {
        Box::new(InMemoryBackend::with_data(contents))
    } else {
        layout.replace_index(&contents)?
    };

    update_record_count(segments, &entries);
    stats.record_index_rebuild();
    info!(
        "Rebuilt index with {} entries from {} segments",
        entries.len(),
        segments.segment_count()
    );

    Ok((backend, entries))
}

/// Walks every segment in order and assigns sequence numbers to its frames.
///
/// With `repair` set, a torn tail in the current segment is truncated;
/// otherwise it is only skipped.
///
/// # Errors
///
/// `Corruption` carrying the last good sequence number if a frame is
/// damaged, a sealed segment's record count disagrees with its frames, or a
/// segment other than the last one is empty.
pub fn rebuild_entries(segments: &SegmentStore, repair: bool) -> FreezerResult<Vec<IndexEntry>> {
    let ids = segments.segment_ids();
    let mut entries: Vec<IndexEntry> = Vec::new();

    for (position, &id) in ids.iter().enumerate() {
        let scan = segments.scan(id)?;

        for location in &scan.frames {
            entries.push(IndexEntry {
                sequence: entries.len() as u64,
                location: *location,
            });
        }
        let last_good = last_sequence(&entries);

        scan.check().map_err(|err| err.with_last_good(last_good))?;

        if scan.frames.is_empty() && position + 1 != ids.len() {
            return Err(FreezerError::corruption(
                format!("{id} holds no records but is followed by another segment"),
                last_good,
            ));
        }

        if scan.has_torn_tail() {
            let torn = scan.size - scan.valid_len;
            if repair {
                warn!("Truncating {} torn bytes at the end of {}", torn, id);
                segments.truncate_tail(id, scan.valid_len)?;
            } else {
                warn!("Ignoring {} torn bytes at the end of {}", torn, id);
            }
        }
    }

    Ok(entries)
}

/// Checks that `entries` describe exactly the frames in `segments`.
///
/// Only positions and sizes are compared; frame checksums are verified when
/// records are read.
pub fn validate_entries(entries: &[IndexEntry], segments: &SegmentStore) -> FreezerResult<()> {
    let infos = segments.segment_info()?;
    let inconsistent = |message: String, checked: usize| {
        FreezerError::corruption(message, checked.checked_sub(1).map(|n| n as u64))
    };

    let mut position = 0usize;
    let mut offset = SEGMENT_HEADER_SIZE;
    let mut count = 0u32;

    for (i, entry) in entries.iter().enumerate() {
        if entry.sequence != i as u64 {
            return Err(inconsistent(
                format!("entry {i} holds sequence {}", entry.sequence),
                i,
            ));
        }

        while infos.get(position).map(|s| s.id) != Some(entry.location.segment) {
            let Some(info) = infos.get(position) else {
                return Err(inconsistent(
                    format!(
                        "sequence {i} points into unknown {}",
                        entry.location.segment
                    ),
                    i,
                ));
            };
            check_segment_end(info, offset, count, position + 1 == infos.len())
                .map_err(|message| inconsistent(message, i))?;
            position += 1;
            offset = SEGMENT_HEADER_SIZE;
            count = 0;
        }

        if entry.location.offset != offset {
            return Err(inconsistent(
                format!(
                    "sequence {i} at offset {} in {}, expected {offset}",
                    entry.location.offset, entry.location.segment
                ),
                i,
            ));
        }
        offset = entry.location.end();
        count += 1;
    }

    while let Some(info) = infos.get(position) {
        check_segment_end(info, offset, count, position + 1 == infos.len())
            .map_err(|message| inconsistent(message, entries.len()))?;
        position += 1;
        offset = SEGMENT_HEADER_SIZE;
        count = 0;
    }

    Ok(())
}

fn check_segment_end(
    info: &SegmentInfo,
    indexed_end: u64,
    indexed_count: u32,
    is_last: bool,
) -> Result<(), String> {
    if info.size != indexed_end {
        return Err(format!(
            "{} is {} bytes, index covers {indexed_end}",
            info.id, info.size
        ));
    }
    if info.sealed && info.record_count != indexed_count {
        return Err(format!(
            "{} is sealed with {} records, index holds {indexed_count}",
            info.id, info.record_count
        ));
    }
    if indexed_count == 0 && !is_last {
        return Err(format!("{} is empty but not the last segment", info.id));
    }
    Ok(())
}

fn decode_entries(backend: &dyn StorageBackend) -> FreezerResult<Vec<IndexEntry>> {
    let size = backend.size()?;
    if size % IndexEntry::ENCODED_SIZE as u64 != 0 {
        return Err(FreezerError::corruption(
            format!(
                "index is {size} bytes, not a multiple of {}",
                IndexEntry::ENCODED_SIZE
            ),
            None,
        ));
    }

    let bytes = backend.read_at(0, size as usize)?;
    bytes
        .chunks_exact(IndexEntry::ENCODED_SIZE)
        .map(IndexEntry::decode)
        .collect()
}

fn update_record_count(segments: &SegmentStore, entries: &[IndexEntry]) {
    let Some(last) = entries.last() else {
        if let Some(&id) = segments.segment_ids().last() {
            segments.set_record_count(id, 0);
        }
        return;
    };
    let id = last.location.segment;
    let count = entries
        .iter()
        .rev()
        .take_while(|e| e.location.segment == id)
        .count();
    segments.set_record_count(id, u32::try_from(count).unwrap_or(u32::MAX));
}

fn last_sequence(entries: &[IndexEntry]) -> Option<u64> {
    entries.last().map(|e| e.sequence)
}
