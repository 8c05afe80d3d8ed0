//! Type definitions for FFI.

use freezerdb_core::{Compression, Config};

/// An opaque freezer handle.
///
/// This is a pointer to the internal freezer structure.
/// Never dereference or modify directly.
#[repr(C)]
pub struct FreezerHandle {
    _private: [u8; 0],
}

/// Configuration for opening a freezer.
#[repr(C)]
#[derive(Debug, Clone)]
pub struct FreezerConfig {
    /// Path to freezer directory (null-terminated UTF-8), or null for an
    /// in-memory freezer.
    pub path: *const std::ffi::c_char,
    /// Segment size threshold in bytes. Zero keeps the default.
    pub max_segment_size: u64,
    /// Whether to fsync every append.
    pub sync_on_append: bool,
    /// Whether to create the directory if it does not exist.
    pub create_if_missing: bool,
    /// Whether to open without write access.
    pub read_only: bool,
    /// Compression codec tag: 0 = none, 1 = LZ4.
    pub compression: u8,
}

impl Default for FreezerConfig {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            path: std::ptr::null(),
            max_segment_size: defaults.max_segment_size,
            sync_on_append: defaults.sync_on_append,
            create_if_missing: defaults.create_if_missing,
            read_only: false,
            compression: defaults.compression as u8,
        }
    }
}

impl FreezerConfig {
    /// Converts to a core configuration.
    ///
    /// Returns `None` if the compression tag is unknown.
    pub fn to_config(&self) -> Option<Config> {
        let compression = Compression::from_tag(self.compression)?;
        let mut config = Config::default()
            .sync_on_append(self.sync_on_append)
            .create_if_missing(self.create_if_missing)
            .compression(compression)
            .read_only(self.read_only);
        if self.max_segment_size > 0 {
            config = config.max_segment_size(self.max_segment_size);
        }
        Some(config)
    }
}
