//! Migrate command implementation.

use freezerdb_core::{Compression, Config, Freezer};
use std::path::Path;
use tracing::{debug, info};

/// Receipts copied per batch.
const BATCH_SIZE: u64 = 1024;

/// Copies every receipt from `datadir` into a new freezer at `output`.
///
/// Returns the number of receipts copied.
pub fn migrate(
    datadir: &Path,
    output: &Path,
    compression: Compression,
    max_segment_size: Option<u64>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let source = Freezer::open_read_only(datadir)?;

    let mut config = Config::default()
        .compression(compression)
        .error_if_exists(true)
        .sync_on_append(false);
    if let Some(size) = max_segment_size {
        config = config.max_segment_size(size);
    }
    let target = Freezer::open_with_config(output, config)?;

    let head = source.head();
    info!("Migrating {} receipts from {:?} to {:?}", head, datadir, output);

    let mut next = 0;
    while next < head {
        let end = (next + BATCH_SIZE).min(head);
        let batch = source.fetch_receipts(next, end)?;
        target.append_receipts(&batch)?;
        debug!("Copied receipts {}..{}", next, end);
        next = end;
    }

    target.close()?;
    if target.head() != head {
        return Err(format!("copied {} receipts, expected {}", target.head(), head).into());
    }

    Ok(head)
}

/// Runs the migrate command.
pub fn run(
    datadir: &Path,
    output: &Path,
    compression: Compression,
    max_segment_size: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let copied = migrate(datadir, output, compression, max_segment_size)?;
    println!(
        "✓ Migrated {} receipts to {:?} ({})",
        copied, output, compression
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn migrate_recompresses_every_receipt() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("old");
        let target = temp.path().join("new");
        let records: Vec<Vec<u8>> = (0..50u8).map(|i| vec![i; 100]).collect();
        {
            let config = Config::default().compression(Compression::None);
            let freezer = Freezer::open_with_config(&source, config).unwrap();
            freezer.append_receipts(&records).unwrap();
        }

        assert_eq!(migrate(&source, &target, Compression::Lz4, Some(512)).unwrap(), 50);

        let migrated = Freezer::open_read_only(&target).unwrap();
        assert_eq!(migrated.config().compression, Compression::Lz4);
        assert!(migrated.segment_count() > 1);
        assert_eq!(migrated.fetch_receipts(0, 50).unwrap(), records);
        assert!(migrated.verify().unwrap().is_ok());
    }

    #[test]
    fn migrate_refuses_existing_output() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("old");
        let target = temp.path().join("new");
        for path in [&source, &target] {
            let freezer = Freezer::open(path).unwrap();
            freezer.append_receipt(b"r0").unwrap();
        }

        assert!(migrate(&source, &target, Compression::Lz4, None).is_err());
        let untouched = Freezer::open_read_only(&target).unwrap();
        assert_eq!(untouched.head(), 1);
    }
}
