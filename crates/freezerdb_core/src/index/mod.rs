//! Sequence number to location index.
//!
//! The index file is a flat array of fixed-width [`IndexEntry`] records,
//! one per committed receipt, in sequence order. Entry `i` always describes
//! sequence number `i`, so the file length alone gives the head.
//!
//! The index is derived data: it can be rebuilt at any time by walking the
//! segment frames in order. On open it is checked against the segments and
//! rebuilt when missing, truncated or inconsistent.
//!
//! [`IndexEntry`]: crate::types::IndexEntry

mod recovery;
mod store;

pub(crate) use recovery::rebuild;
pub use recovery::{open_index, rebuild_entries, validate_entries};
pub use store::Index;
