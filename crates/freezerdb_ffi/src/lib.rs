//! # freezerdb FFI
//!
//! Stable C ABI over the freezerdb receipt store.
//!
//! This crate provides:
//! - C-compatible function exports
//! - Memory ownership conventions
//! - Error code mapping
//!
//! ## Ownership
//!
//! Handles returned by `freezerdb_open` belong to the caller until passed
//! to `freezerdb_close`. Buffers and buffer lists returned by fetch calls
//! belong to the caller and are released with `freezerdb_free_buffer` and
//! `freezerdb_free_buffer_list` respectively.
//!
//! ## Errors
//!
//! Every fallible function returns a [`FreezerResultCode`]. The message of
//! the last failure on the calling thread is available through
//! `freezerdb_get_last_error`, and for corruption the last known-good
//! sequence number through `freezerdb_last_good_sequence`.

#![warn(missing_docs)]

mod buffer;
mod error;
mod freezer;
mod types;

pub use buffer::{freezerdb_free_buffer, freezerdb_free_buffer_list, FreezerBuffer, FreezerBufferList};
pub use error::{
    freezerdb_clear_error, freezerdb_get_last_error, freezerdb_last_good_sequence, ErrorCode,
    FreezerResultCode,
};
pub use freezer::{
    freezerdb_append_receipts, freezerdb_close, freezerdb_fetch_receipt, freezerdb_fetch_receipts,
    freezerdb_head, freezerdb_open, freezerdb_version,
};
pub use types::{FreezerConfig, FreezerHandle};
