//! Segment storage for frozen records.
//!
//! Segments are append-only files that store compressed records back to
//! back. Once sealed, segments are never modified.
//!
//! ## Segment Layout
//!
//! ```text
//! | record_count (4) | codec (1) | version (1) | reserved (2) |   header
//! | compressed_len (4) | uncompressed_len (4) | crc32 (4) | header_crc (4) | payload (N) |   frame 0
//! | compressed_len (4) | uncompressed_len (4) | crc32 (4) | header_crc (4) | payload (N) |   frame 1
//! ...
//! ```
//!
//! `record_count` holds `0xFFFF_FFFF` while the segment is current and the
//! final frame count once it is sealed. `crc32` covers the payload and
//! `header_crc` the twelve bytes before it.

mod frame;
mod store;

pub use frame::{
    FrameHeader, SegmentHeader, FRAME_HEADER_SIZE, SEGMENT_FORMAT_VERSION, SEGMENT_HEADER_SIZE,
};
pub use store::{SegmentInfo, SegmentScan, SegmentStore};
