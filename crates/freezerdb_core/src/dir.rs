//! Freezer directory management.
//!
//! This module handles the file system layout of a freezer:
//!
//! ```text
//! <freezer_path>/
//! ├─ LOCK                # Advisory lock: exclusive for writers, shared for readers
//! ├─ receipts.idx        # Fixed-width index entries
//! └─ segments/
//!    ├─ seg-000000.dat   # Sealed segment
//!    └─ seg-000001.dat   # Current segment
//! ```
//!
//! The LOCK file ensures only one process can append at a time, while any
//! number of read-only openers may share the directory.

use crate::error::{FreezerError, FreezerResult};
use crate::layout::Layout;
use crate::types::SegmentId;
use freezerdb_storage::{FileBackend, StorageBackend};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File names within the freezer directory.
const LOCK_FILE: &str = "LOCK";
const INDEX_FILE: &str = "receipts.idx";
/// Temporary file for atomic index rewrites.
const INDEX_TEMP: &str = "receipts.idx.tmp";
const SEGMENTS_DIR: &str = "segments";
const SEGMENT_PREFIX: &str = "seg-";
const SEGMENT_SUFFIX: &str = ".dat";

/// Manages the freezer directory structure and file locking.
///
/// # Thread Safety
///
/// A writable `FreezerDir` holds an exclusive lock on the directory; a
/// read-only one holds a shared lock. The lock lives as long as the value.
#[derive(Debug)]
pub struct FreezerDir {
    /// Root directory path.
    path: PathBuf,
    /// Whether the directory was opened without write access.
    read_only: bool,
    /// Lock file handle (held for the lifetime of the directory).
    _lock_file: File,
}

impl FreezerDir {
    /// Opens or creates a freezer directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the freezer directory
    /// * `create_if_missing` - If true, creates the directory if it doesn't exist
    /// * `read_only` - If true, takes a shared lock and hands out read-only backends
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds a conflicting lock (returns `Locked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool, read_only: bool) -> FreezerResult<Self> {
        if !path.exists() {
            if create_if_missing && !read_only {
                fs::create_dir_all(path)?;
            } else {
                return Err(FreezerError::invalid_format(format!(
                    "freezer directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(FreezerError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        if !read_only {
            fs::create_dir_all(path.join(SEGMENTS_DIR))?;
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        let locked = if read_only {
            FileExt::try_lock_shared(&lock_file)
        } else {
            FileExt::try_lock_exclusive(&lock_file)
        };
        if locked.is_err() {
            return Err(FreezerError::Locked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            read_only,
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the freezer directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.path.join(INDEX_FILE)
    }

    /// Returns the path to the segments directory.
    #[must_use]
    pub fn segments_dir(&self) -> PathBuf {
        self.path.join(SEGMENTS_DIR)
    }

    /// Returns the path to a specific segment file.
    #[must_use]
    pub fn segment_file_path(&self, id: SegmentId) -> PathBuf {
        self.segments_dir().join(format!(
            "{SEGMENT_PREFIX}{:06}{SEGMENT_SUFFIX}",
            id.as_u32()
        ))
    }

    /// Checks whether the directory holds no freezer data yet.
    pub fn is_empty(&self) -> FreezerResult<bool> {
        Ok(!self.index_path().exists() && self.segment_ids()?.is_empty())
    }

    fn ensure_writable(&self) -> FreezerResult<()> {
        if self.read_only {
            return Err(FreezerError::invalid_operation(
                "freezer directory opened read-only",
            ));
        }
        Ok(())
    }

    /// Syncs a directory so that created, renamed or removed entries are durable.
    ///
    /// Windows NTFS journals metadata updates, so there is nothing to do there.
    #[cfg(unix)]
    fn sync_dir(path: &Path) -> FreezerResult<()> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_dir(_path: &Path) -> FreezerResult<()> {
        Ok(())
    }
}

fn parse_segment_name(name: &str) -> Option<SegmentId> {
    let digits = name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(SegmentId::new)
}

impl Layout for FreezerDir {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn segment_ids(&self) -> FreezerResult<Vec<SegmentId>> {
        let dir = self.segments_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(parse_segment_name) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn open_segment(&self, id: SegmentId) -> FreezerResult<Box<dyn StorageBackend>> {
        let path = self.segment_file_path(id);
        let backend = if self.read_only {
            FileBackend::open_read_only(&path)?
        } else {
            FileBackend::open(&path)?
        };
        Ok(Box::new(backend))
    }

    fn create_segment(&self, id: SegmentId) -> FreezerResult<Box<dyn StorageBackend>> {
        self.ensure_writable()?;

        let backend = FileBackend::open_with_create_dirs(&self.segment_file_path(id))?;
        Self::sync_dir(&self.segments_dir())?;
        Ok(Box::new(backend))
    }

    fn open_index(&self) -> FreezerResult<Option<Box<dyn StorageBackend>>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(None);
        }

        let backend = if self.read_only {
            FileBackend::open_read_only(&path)?
        } else {
            FileBackend::open(&path)?
        };
        Ok(Some(Box::new(backend)))
    }

    /// Uses write-then-rename for crash safety:
    /// 1. Write to temporary file
    /// 2. Sync temporary file to disk
    /// 3. Rename temporary file over the index
    /// 4. Fsync the directory so the rename is durable
    fn replace_index(&self, contents: &[u8]) -> FreezerResult<Box<dyn StorageBackend>> {
        self.ensure_writable()?;

        let temp_path = self.path.join(INDEX_TEMP);
        let mut file = File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.index_path())?;
        Self::sync_dir(&self.path)?;

        Ok(Box::new(FileBackend::open(&self.index_path())?))
    }
}
