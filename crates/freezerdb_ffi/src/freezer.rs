//! Freezer FFI functions.

use crate::buffer::{FreezerBuffer, FreezerBufferList};
use crate::error::{clear_last_error, report_error, set_last_error, FreezerResultCode};
use crate::types::{FreezerConfig, FreezerHandle};
use freezerdb_core::{Freezer, FreezerResult, MemoryLayout};
use std::ffi::CStr;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn open_freezer(config: &FreezerConfig, path: Option<&Path>) -> Result<Freezer, FreezerResultCode> {
    let Some(core_config) = config.to_config() else {
        set_last_error(format!("unknown compression tag {}", config.compression));
        return Err(FreezerResultCode::InvalidArgument);
    };

    let opened: FreezerResult<Freezer> = match path {
        Some(path) if core_config.read_only => Freezer::open_read_only(path),
        Some(path) => Freezer::open_with_config(path, core_config),
        None => {
            let codec = Arc::new(core_config.compression);
            Freezer::open_with_layout(Arc::new(MemoryLayout::new()), core_config, codec)
        }
    };
    opened.map_err(|e| report_error(&e))
}

/// Opens a freezer.
///
/// # Arguments
///
/// * `config` - Configuration for the freezer; a null `path` opens an
///   in-memory freezer
/// * `out_handle` - Output pointer for the freezer handle
///
/// # Returns
///
/// `FreezerResultCode::Ok` on success, error code otherwise.
///
/// # Safety
///
/// - `config` must be a valid pointer
/// - `config.path` must be a valid null-terminated UTF-8 string or null
/// - `out_handle` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn freezerdb_open(
    config: *const FreezerConfig,
    out_handle: *mut *mut FreezerHandle,
) -> FreezerResultCode {
    clear_last_error();

    if config.is_null() || out_handle.is_null() {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }

    let config = &*config;

    let path = if config.path.is_null() {
        None
    } else {
        match CStr::from_ptr(config.path).to_str() {
            Ok(s) => Some(Path::new(s)),
            Err(_) => {
                set_last_error("invalid UTF-8 in path");
                return FreezerResultCode::InvalidArgument;
            }
        }
    };

    match open_freezer(config, path) {
        Ok(freezer) => {
            debug!("FFI opened freezer at head {}", freezer.head());
            *out_handle = Box::into_raw(Box::new(freezer)).cast::<FreezerHandle>();
            FreezerResultCode::Ok
        }
        Err(code) => code,
    }
}

/// Closes a freezer.
///
/// # Safety
///
/// The handle must have been returned by `freezerdb_open`.
/// The handle must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn freezerdb_close(handle: *mut FreezerHandle) -> FreezerResultCode {
    clear_last_error();

    if handle.is_null() {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }

    // Take ownership and drop
    let freezer = Box::from_raw(handle.cast::<Freezer>());
    match freezer.close() {
        Ok(()) => FreezerResultCode::Ok,
        Err(e) => report_error(&e),
    }
}

/// Gets the number of committed receipts.
///
/// # Safety
///
/// - `handle` must be a valid freezer handle
/// - `out_head` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn freezerdb_head(
    handle: *mut FreezerHandle,
    out_head: *mut u64,
) -> FreezerResultCode {
    clear_last_error();

    if handle.is_null() || out_head.is_null() {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }

    let freezer = &*(handle as *mut Freezer);
    *out_head = freezer.head();
    FreezerResultCode::Ok
}

/// Appends a batch of receipts.
///
/// Record `i` is `lens[i]` bytes starting at `records[i]`. On return
/// `out_head` holds the number of committed receipts, including when the
/// batch fails part-way; the committed prefix stays readable and the rest
/// can be appended again.
///
/// # Safety
///
/// - `handle` must be a valid freezer handle
/// - `records` and `lens` must point to `count` elements (may be null when
///   `count` is zero)
/// - each `records[i]` must be valid for `lens[i]` bytes
/// - `out_head` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn freezerdb_append_receipts(
    handle: *mut FreezerHandle,
    records: *const *const u8,
    lens: *const usize,
    count: usize,
    out_head: *mut u64,
) -> FreezerResultCode {
    clear_last_error();

    if handle.is_null() || out_head.is_null() {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }
    if count > 0 && (records.is_null() || lens.is_null()) {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }

    let freezer = &*(handle as *mut Freezer);

    let batch: Vec<&[u8]> = if count == 0 {
        Vec::new()
    } else {
        let pointers = std::slice::from_raw_parts(records, count);
        let lens = std::slice::from_raw_parts(lens, count);
        let mut batch = Vec::with_capacity(count);
        for (i, (&ptr, &len)) in pointers.iter().zip(lens).enumerate() {
            if ptr.is_null() {
                if len > 0 {
                    set_last_error(format!("record {i} is null"));
                    return FreezerResultCode::NullPointer;
                }
                batch.push(&[][..]);
            } else {
                batch.push(std::slice::from_raw_parts(ptr, len));
            }
        }
        batch
    };

    let result = freezer.append_receipts(&batch);
    *out_head = freezer.head();
    match result {
        Ok(_) => FreezerResultCode::Ok,
        Err(e) => report_error(&e),
    }
}

/// Fetches a receipt by sequence number.
///
/// # Safety
///
/// - `handle` must be a valid freezer handle
/// - `out_buffer` must be a valid pointer
/// - The returned buffer must be freed with `freezerdb_free_buffer`
#[no_mangle]
pub unsafe extern "C" fn freezerdb_fetch_receipt(
    handle: *mut FreezerHandle,
    sequence: u64,
    out_buffer: *mut FreezerBuffer,
) -> FreezerResultCode {
    clear_last_error();

    if handle.is_null() || out_buffer.is_null() {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }

    let freezer = &*(handle as *mut Freezer);

    match freezer.fetch_receipt(sequence) {
        Ok(record) => {
            *out_buffer = FreezerBuffer::from_vec(record);
            FreezerResultCode::Ok
        }
        Err(e) => {
            *out_buffer = FreezerBuffer::empty();
            report_error(&e)
        }
    }
}

/// Fetches receipts `[start, end)` in sequence order.
///
/// An empty or inverted range yields an empty list.
///
/// # Safety
///
/// - `handle` must be a valid freezer handle
/// - `out_list` must be a valid pointer
/// - The returned list must be freed with `freezerdb_free_buffer_list`
#[no_mangle]
pub unsafe extern "C" fn freezerdb_fetch_receipts(
    handle: *mut FreezerHandle,
    start: u64,
    end: u64,
    out_list: *mut FreezerBufferList,
) -> FreezerResultCode {
    clear_last_error();

    if handle.is_null() || out_list.is_null() {
        set_last_error("null pointer argument");
        return FreezerResultCode::NullPointer;
    }

    let freezer = &*(handle as *mut Freezer);

    match freezer.fetch_receipts(start, end) {
        Ok(records) => {
            *out_list = FreezerBufferList::from_vecs(records);
            FreezerResultCode::Ok
        }
        Err(e) => {
            *out_list = FreezerBufferList::empty();
            report_error(&e)
        }
    }
}

/// Gets the library version string.
///
/// The returned pointer is static and must not be freed.
#[no_mangle]
pub extern "C" fn freezerdb_version() -> *const std::ffi::c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr().cast::<std::ffi::c_char>()
}
