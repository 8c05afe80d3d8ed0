//! Rebuild-index command implementation.

use freezerdb_core::{Config, Freezer};
use std::path::Path;
use tracing::info;

/// Runs the rebuild-index command.
///
/// The freezer is reopened with whatever codec its segments use.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let freezer = Freezer::open_detected(path, Config::default().create_if_missing(false))?;
    let before = freezer.head();
    let head = freezer.rebuild_index()?;
    freezer.close()?;

    info!("Index rebuilt from {} segments", freezer.segment_count());
    println!("✓ Rebuilt index for {} receipts", head);
    if head != before {
        println!("  (index previously held {} receipts)", before);
    }
    Ok(())
}
