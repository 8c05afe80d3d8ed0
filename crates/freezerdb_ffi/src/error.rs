//! Error codes and result types.

use freezerdb_core::{ErrorKind, FreezerError};
use std::cell::{Cell, RefCell};
use std::ffi::CString;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezerResultCode {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Sequence number not committed yet.
    NotFound = 3,
    /// Physical location outside the segment store.
    OutOfRange = 4,
    /// Append out of sequence.
    OutOfOrder = 5,
    /// I/O error. Nothing was committed by the failing call.
    IoError = 6,
    /// Corruption detected. See `freezerdb_last_good_sequence`.
    Corruption = 7,
    /// Freezer is locked by another process.
    Locked = 8,
    /// Invalid on-disk format.
    InvalidFormat = 9,
    /// Operation not permitted, e.g. append on a read-only freezer.
    InvalidOperation = 10,
    /// Freezer is closed.
    Closed = 11,
    /// Null pointer.
    NullPointer = 12,
}

impl FreezerResultCode {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == FreezerResultCode::Ok
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        self != FreezerResultCode::Ok
    }
}

impl From<ErrorKind> for FreezerResultCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => Self::NotFound,
            ErrorKind::OutOfRange => Self::OutOfRange,
            ErrorKind::OutOfOrder => Self::OutOfOrder,
            ErrorKind::IoFailure => Self::IoError,
            ErrorKind::Corruption => Self::Corruption,
            ErrorKind::Locked => Self::Locked,
            ErrorKind::InvalidFormat => Self::InvalidFormat,
            ErrorKind::InvalidOperation => Self::InvalidOperation,
            ErrorKind::Closed => Self::Closed,
        }
    }
}

/// Error code type for C compatibility.
pub type ErrorCode = i32;

impl From<FreezerResultCode> for ErrorCode {
    fn from(result: FreezerResultCode) -> Self {
        result as ErrorCode
    }
}

// Thread-local storage for the last error
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static LAST_GOOD: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Records a freezer error for this thread and returns its code.
pub fn report_error(error: &FreezerError) -> FreezerResultCode {
    set_last_error(error.to_string());
    LAST_GOOD.with(|g| g.set(error.last_good()));
    error.kind().into()
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
    LAST_GOOD.with(|g| g.set(None));
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn freezerdb_get_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn freezerdb_clear_error() {
    clear_last_error();
}

/// Gets the last known-good sequence number reported by the last error.
///
/// Returns `NotFound` if the last error carried none.
///
/// # Safety
///
/// `out_sequence` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn freezerdb_last_good_sequence(out_sequence: *mut u64) -> FreezerResultCode {
    if out_sequence.is_null() {
        return FreezerResultCode::NullPointer;
    }

    match LAST_GOOD.with(Cell::get) {
        Some(sequence) => {
            *out_sequence = sequence;
            FreezerResultCode::Ok
        }
        None => FreezerResultCode::NotFound,
    }
}
