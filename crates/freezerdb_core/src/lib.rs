//! # FreezerDB Core
//!
//! Ancient store for transaction receipts.
//!
//! This crate provides:
//! - Segment store: bounded, append-only files of compressed, checksummed frames
//! - Index: sequence number to frame location, rebuilt from segments when needed
//! - [`Freezer`]: the facade for appending and fetching receipts
//!
//! ```rust,ignore
//! use freezerdb_core::Freezer;
//!
//! let freezer = Freezer::open(Path::new("ancient"))?;
//! freezer.append_receipts(&[b"r0", b"r1", b"r2"])?;
//!
//! for receipt in freezer.fetch_range(0, 3) {
//!     println!("{:?}", receipt?);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compression;
mod config;
mod dir;
mod error;
mod freezer;
pub mod index;
mod layout;
mod range;
pub mod segment;
mod stats;
mod types;

pub use compression::{Codec, Compression};
pub use config::Config;
pub use dir::FreezerDir;
pub use error::{ErrorKind, FreezerError, FreezerResult};
pub use freezer::{Freezer, VerifyReport};
pub use layout::{Layout, MemoryLayout};
pub use range::RangeIter;
pub use segment::SegmentInfo;
pub use stats::{FreezerStats, StatsSnapshot};
pub use types::{IndexEntry, Location, SegmentId};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
