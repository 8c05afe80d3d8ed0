//! Verify command implementation.

use freezerdb_core::{Freezer, VerifyReport};
use std::path::Path;
use tracing::info;

/// Runs the verify command.
///
/// The freezer is opened read-only so a torn tail is reported rather
/// than repaired.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying freezer at {:?}", path);
    println!();

    let freezer = Freezer::open_read_only(path)?;
    let report = freezer.verify()?;
    info!("Verified {} receipts in {} segments", report.records, report.segments);

    print_report(freezer.head(), &report);

    println!();
    if report.is_ok() {
        println!("✓ Freezer verification passed");
        Ok(())
    } else {
        println!("✗ Freezer verification failed");
        Err("Verification failed".into())
    }
}

fn print_report(head: u64, report: &VerifyReport) {
    println!("Segments:");
    println!("  Checked: {}", report.segments);
    println!("  Bytes:   {}", report.bytes);
    println!();
    println!("Receipts:");
    println!("  Indexed:  {}", head);
    println!("  Verified: {}", report.records);
    println!();
    println!(
        "Index: {}",
        if report.index_matches {
            "matches segments"
        } else {
            "differs from segments"
        }
    );
    if report.torn_tail {
        println!("Current segment ends in an interrupted append");
    }

    if !report.issues.is_empty() {
        println!();
        println!("Issues:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn healthy_freezer_passes() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ancient");
        {
            let freezer = Freezer::open(&path).unwrap();
            freezer.append_receipts(&[b"r0", b"r1"]).unwrap();
        }

        assert!(run(&path).is_ok());
    }

    #[test]
    fn torn_tail_fails_verification() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ancient");
        {
            let freezer = Freezer::open(&path).unwrap();
            freezer.append_receipts(&[b"r0", b"r1"]).unwrap();
        }

        let segment = path.join("segments").join("seg-000000.dat");
        let mut file = OpenOptions::new().append(true).open(segment).unwrap();
        file.write_all(&[1, 2, 3]).unwrap();
        drop(file);

        assert!(run(&path).is_err());
    }
}
