//! Record compression codecs.
//!
//! Every record is compressed on its own so any single record can be
//! decompressed without touching its neighbours. The codec tag is stored
//! in each segment header, and a freezer refuses to open segments written
//! with a different codec.

use crate::error::{FreezerError, FreezerResult};
use std::fmt;
use std::str::FromStr;

/// A record compression codec.
///
/// Implementations must be deterministic in `decompress`: the same input
/// always yields the same output or the same failure.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Tag stored in segment headers to identify the codec.
    fn tag(&self) -> u8;

    /// Human-readable codec name.
    fn name(&self) -> &'static str;

    /// Compresses one record.
    fn compress(&self, data: &[u8]) -> Vec<u8>;

    /// Decompresses one record.
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the input does not decode to exactly
    /// `uncompressed_len` bytes.
    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> FreezerResult<Vec<u8>>;
}

/// Built-in codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Compression {
    /// Records are stored as-is.
    None = 0,
    /// LZ4 block compression.
    #[default]
    Lz4 = 1,
}

impl Compression {
    /// Looks up a built-in codec by its segment header tag.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Lz4),
            _ => None,
        }
    }
}

impl Codec for Compression {
    fn tag(&self) -> u8 {
        *self as u8
    }

    fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
        }
    }

    fn compress(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 if data.is_empty() => Vec::new(),
            Self::Lz4 => lz4_flex::block::compress(data),
        }
    }

    fn decompress(&self, data: &[u8], uncompressed_len: usize) -> FreezerResult<Vec<u8>> {
        let decoded = match self {
            Self::None => data.to_vec(),
            Self::Lz4 if data.is_empty() => Vec::new(),
            Self::Lz4 => lz4_flex::block::decompress(data, uncompressed_len)
                .map_err(|e| FreezerError::corruption(format!("lz4 decode failed: {e}"), None))?,
        };

        if decoded.len() != uncompressed_len {
            return Err(FreezerError::corruption(
                format!(
                    "{} decoded {} bytes, frame declares {uncompressed_len}",
                    self.name(),
                    decoded.len()
                ),
                None,
            ));
        }

        Ok(decoded)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = FreezerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lz4" => Ok(Self::Lz4),
            other => Err(FreezerError::invalid_operation(format!(
                "unknown compression '{other}', expected 'none' or 'lz4'"
            ))),
        }
    }
}
