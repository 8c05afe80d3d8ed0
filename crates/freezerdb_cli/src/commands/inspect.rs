//! Inspect command implementation.

use freezerdb_core::{Codec, Freezer, SegmentInfo, StatsSnapshot};
use serde::Serialize;
use std::path::Path;

/// Freezer inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Freezer path.
    pub path: String,
    /// Codec new records are written with.
    pub codec: String,
    /// Number of committed receipts.
    pub head: u64,
    /// Number of segment files.
    pub segment_count: usize,
    /// Total segment bytes.
    pub total_size: u64,
    /// Uncompressed bytes of all receipts.
    pub uncompressed_size: u64,
    /// Whether the index had to be rebuilt while opening.
    pub index_rebuilt: bool,
    /// Segment details (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<SegmentStats>>,
}

/// Details of a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentStats {
    /// Segment id.
    pub id: u32,
    /// File size in bytes.
    pub size: u64,
    /// Whether the segment is sealed.
    pub sealed: bool,
    /// Number of receipts in the segment.
    pub record_count: u32,
}

impl From<SegmentInfo> for SegmentStats {
    fn from(info: SegmentInfo) -> Self {
        Self {
            id: info.id.as_u32(),
            size: info.size,
            sealed: info.sealed,
            record_count: info.record_count,
        }
    }
}

/// Opens the freezer read-only and gathers its statistics.
pub fn inspect(path: &Path, show_segments: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let freezer = Freezer::open_read_only(path)?;
    let stats: StatsSnapshot = freezer.stats();

    let uncompressed_size = freezer
        .index_entries()
        .iter()
        .map(|e| u64::from(e.location.uncompressed_len))
        .sum();

    let segments = if show_segments {
        Some(
            freezer
                .segment_info()?
                .into_iter()
                .map(SegmentStats::from)
                .collect(),
        )
    } else {
        None
    };

    Ok(InspectResult {
        path: path.display().to_string(),
        codec: freezer.codec().name().to_string(),
        head: freezer.head(),
        segment_count: freezer.segment_count(),
        total_size: freezer.total_size()?,
        uncompressed_size,
        index_rebuilt: stats.index_rebuilds > 0,
        segments,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, show_segments: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, show_segments)?;

    // Output
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("freezerdb Inspection");
    println!("====================");
    println!();
    println!("Path:  {}", result.path);
    println!("Codec: {}", result.codec);
    println!();
    println!("Receipts:");
    println!("  Head:              {}", result.head);
    println!(
        "  Uncompressed size: {}",
        format_size(result.uncompressed_size)
    );
    println!();
    println!("Storage:");
    println!("  Segments:   {}", result.segment_count);
    println!("  Total size: {}", format_size(result.total_size));
    if result.uncompressed_size > 0 {
        println!(
            "  Ratio:      {:.2}",
            result.total_size as f64 / result.uncompressed_size as f64
        );
    }
    if result.index_rebuilt {
        println!();
        println!("Index was missing or stale and has been rebuilt in memory.");
    }

    if let Some(segments) = &result.segments {
        println!();
        println!("Segments:");
        for seg in segments {
            println!(
                "  [{:06}] {} receipts, {}{}",
                seg.id,
                seg.record_count,
                format_size(seg.size),
                if seg.sealed { ", sealed" } else { "" }
            );
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
