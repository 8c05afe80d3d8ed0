//! Segment header and record frame encoding.

use crate::error::{FreezerError, FreezerResult};
use bytes::{Buf, BufMut};

/// Size of the segment file header.
pub const SEGMENT_HEADER_SIZE: u64 = 8;
/// Size of the header in front of every record payload.
pub const FRAME_HEADER_SIZE: u64 = 16;
/// Current segment format version.
pub const SEGMENT_FORMAT_VERSION: u8 = 1;

/// `record_count` value of a segment that is still being appended to.
const OPEN_MARKER: u32 = u32::MAX;

/// Header at the start of every segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Final record count, or `None` while the segment is open.
    pub record_count: Option<u32>,
    /// Tag of the codec the payloads were compressed with.
    pub codec_tag: u8,
    /// Format version.
    pub version: u8,
}

impl SegmentHeader {
    /// Header of a freshly created segment.
    #[must_use]
    pub const fn open(codec_tag: u8) -> Self {
        Self {
            record_count: None,
            codec_tag,
            version: SEGMENT_FORMAT_VERSION,
        }
    }

    /// Returns this header with the segment marked sealed.
    #[must_use]
    pub const fn sealed(self, record_count: u32) -> Self {
        Self {
            record_count: Some(record_count),
            ..self
        }
    }

    /// Returns whether the segment has been sealed.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.record_count.is_some()
    }

    /// Encodes the header.
    #[must_use]
    pub fn encode(&self) -> [u8; SEGMENT_HEADER_SIZE as usize] {
        let mut buf = [0u8; SEGMENT_HEADER_SIZE as usize];
        let mut out = &mut buf[..];
        out.put_u32_le(self.record_count.unwrap_or(OPEN_MARKER));
        out.put_u8(self.codec_tag);
        out.put_u8(self.version);
        out.put_u16_le(0);
        buf
    }

    /// Decodes a header.
    pub fn decode(mut data: &[u8]) -> FreezerResult<Self> {
        if data.len() < SEGMENT_HEADER_SIZE as usize {
            return Err(FreezerError::corruption("segment header too short", None));
        }

        let count = data.get_u32_le();
        let codec_tag = data.get_u8();
        let version = data.get_u8();

        if version == 0 || version > SEGMENT_FORMAT_VERSION {
            return Err(FreezerError::invalid_format(format!(
                "unsupported segment version {version}"
            )));
        }

        Ok(Self {
            record_count: (count != OPEN_MARKER).then_some(count),
            codec_tag,
            version,
        })
    }
}

/// Header in front of one compressed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the compressed payload that follows.
    pub compressed_len: u32,
    /// Length of the record once decompressed.
    pub uncompressed_len: u32,
    /// CRC32 of the compressed payload.
    pub crc: u32,
}

/// Header bytes covered by the trailing header checksum.
const FRAME_HEADER_BODY: usize = 12;

impl FrameHeader {
    /// Builds the header for a compressed payload.
    pub fn for_payload(payload: &[u8], uncompressed_len: usize) -> FreezerResult<Self> {
        let compressed_len = u32::try_from(payload.len()).map_err(|_| {
            FreezerError::invalid_operation(format!(
                "compressed record of {} bytes exceeds frame limit",
                payload.len()
            ))
        })?;
        let uncompressed_len = u32::try_from(uncompressed_len).map_err(|_| {
            FreezerError::invalid_operation(format!(
                "record of {uncompressed_len} bytes exceeds frame limit"
            ))
        })?;

        Ok(Self {
            compressed_len,
            uncompressed_len,
            crc: crc32fast::hash(payload),
        })
    }

    /// Encodes the header, followed by a CRC32 of the three fields.
    #[must_use]
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE as usize] {
        let mut buf = [0u8; FRAME_HEADER_SIZE as usize];
        let mut out = &mut buf[..];
        out.put_u32_le(self.compressed_len);
        out.put_u32_le(self.uncompressed_len);
        out.put_u32_le(self.crc);
        let check = crc32fast::hash(&buf[..FRAME_HEADER_BODY]);
        buf[FRAME_HEADER_BODY..].copy_from_slice(&check.to_le_bytes());
        buf
    }

    /// Decodes a header from at least [`FRAME_HEADER_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// `Corruption` if the data is too short or the header checksum does
    /// not match, so a damaged length is never trusted.
    pub fn decode(data: &[u8]) -> FreezerResult<Self> {
        if data.len() < FRAME_HEADER_SIZE as usize {
            return Err(FreezerError::corruption("frame header too short", None));
        }

        let (body, mut check) = data[..FRAME_HEADER_SIZE as usize].split_at(FRAME_HEADER_BODY);
        let expected = check.get_u32_le();
        let actual = crc32fast::hash(body);
        if actual != expected {
            return Err(FreezerError::corruption(
                format!(
                    "frame header checksum mismatch: expected {expected:08x}, got {actual:08x}"
                ),
                None,
            ));
        }

        let mut body = body;
        Ok(Self {
            compressed_len: body.get_u32_le(),
            uncompressed_len: body.get_u32_le(),
            crc: body.get_u32_le(),
        })
    }

    /// Checks a payload against the stored length and checksum.
    pub fn verify(&self, payload: &[u8]) -> FreezerResult<()> {
        if payload.len() != self.compressed_len as usize {
            return Err(FreezerError::corruption(
                format!(
                    "frame payload is {} bytes, header declares {}",
                    payload.len(),
                    self.compressed_len
                ),
                None,
            ));
        }

        let actual = crc32fast::hash(payload);
        if actual != self.crc {
            return Err(FreezerError::corruption(
                format!(
                    "frame checksum mismatch: expected {:08x}, got {actual:08x}",
                    self.crc
                ),
                None,
            ));
        }

        Ok(())
    }

    /// Encodes a complete frame: header followed by payload.
    pub fn frame(payload: &[u8], uncompressed_len: usize) -> FreezerResult<Vec<u8>> {
        let header = Self::for_payload(payload, uncompressed_len)?;
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE as usize + payload.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(payload);
        Ok(buf)
    }
}
