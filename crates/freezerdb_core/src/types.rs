//! Core type definitions for freezerdb.

use crate::error::{FreezerError, FreezerResult};
use crate::segment::FRAME_HEADER_SIZE;
use bytes::{Buf, BufMut};
use std::fmt;

/// Identifier of a segment file.
///
/// Segment IDs start at 0 and are contiguous: segment `n + 1` exists only
/// after segment `n` has been sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SegmentId(pub u32);

impl SegmentId {
    /// Creates a new segment ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the ID of the segment that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seg:{}", self.0)
    }
}

/// Physical position of one record frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Segment holding the frame.
    pub segment: SegmentId,
    /// Offset of the frame header within the segment file.
    pub offset: u64,
    /// Length of the compressed payload.
    pub compressed_len: u32,
    /// Length of the record once decompressed.
    pub uncompressed_len: u32,
}

impl Location {
    /// Total length of the frame on disk, header included.
    #[must_use]
    pub const fn frame_len(&self) -> u64 {
        FRAME_HEADER_SIZE + self.compressed_len as u64
    }

    /// Offset one past the last byte of the frame.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.frame_len()
    }
}

/// One committed record in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Sequence number of the record.
    pub sequence: u64,
    /// Where the record's frame lives.
    pub location: Location,
}

impl IndexEntry {
    /// Encoded size: sequence (8) + segment (4) + offset (8) + compressed_len (4) + uncompressed_len (4).
    pub const ENCODED_SIZE: usize = 28;

    /// Encodes the entry in its fixed-width little-endian form.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::ENCODED_SIZE] {
        let mut buf = [0u8; Self::ENCODED_SIZE];
        let mut out = &mut buf[..];
        out.put_u64_le(self.sequence);
        out.put_u32_le(self.location.segment.as_u32());
        out.put_u64_le(self.location.offset);
        out.put_u32_le(self.location.compressed_len);
        out.put_u32_le(self.location.uncompressed_len);
        buf
    }

    /// Decodes an entry from exactly [`Self::ENCODED_SIZE`] bytes.
    pub fn decode(mut data: &[u8]) -> FreezerResult<Self> {
        if data.len() != Self::ENCODED_SIZE {
            return Err(FreezerError::invalid_format(format!(
                "index entry must be {} bytes, got {}",
                Self::ENCODED_SIZE,
                data.len()
            )));
        }

        let sequence = data.get_u64_le();
        let segment = SegmentId::new(data.get_u32_le());
        let offset = data.get_u64_le();
        let compressed_len = data.get_u32_le();
        let uncompressed_len = data.get_u32_le();

        Ok(Self {
            sequence,
            location: Location {
                segment,
                offset,
                compressed_len,
                uncompressed_len,
            },
        })
    }
}
