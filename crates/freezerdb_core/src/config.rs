//! Freezer configuration.

use crate::compression::Compression;

/// Configuration for opening a freezer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the freezer directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the freezer already holds data.
    pub error_if_exists: bool,

    /// Maximum size of a single segment file before sealing.
    pub max_segment_size: u64,

    /// Whether to fsync every append (safer but slower).
    ///
    /// When false, appends are flushed to the OS but not synced.
    pub sync_on_append: bool,

    /// Codec used for new records.
    pub compression: Compression,

    /// Open without write access; appends fail.
    pub read_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            max_segment_size: 256 * 1024 * 1024, // 256 MB
            sync_on_append: true,
            compression: Compression::Lz4,
            read_only: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the freezer if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the freezer exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets maximum segment file size.
    #[must_use]
    pub const fn max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }

    /// Sets whether to fsync every append.
    #[must_use]
    pub const fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }

    /// Sets the codec for new records.
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Opens in read-only mode. Implies `create_if_missing(false)`.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        if value {
            self.create_if_missing = false;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.error_if_exists);
        assert!(config.sync_on_append);
        assert!(!config.read_only);
        assert_eq!(config.compression, Compression::Lz4);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .max_segment_size(4096)
            .sync_on_append(false)
            .compression(Compression::None);

        assert_eq!(config.max_segment_size, 4096);
        assert!(!config.sync_on_append);
        assert_eq!(config.compression, Compression::None);
    }

    #[test]
    fn read_only_disables_creation() {
        let config = Config::new().read_only(true);
        assert!(config.read_only);
        assert!(!config.create_if_missing);
    }
}
