//! Buffer types for FFI.
//!
//! Every buffer handed to the caller is owned by the caller from then on
//! and must be released exactly once with the matching free function.

/// A byte buffer for FFI.
///
/// Memory is owned by Rust. Call `freezerdb_free_buffer` to release.
#[repr(C)]
#[derive(Debug)]
pub struct FreezerBuffer {
    /// Pointer to data.
    pub data: *mut u8,
    /// Length in bytes.
    pub len: usize,
    /// Capacity (for internal use).
    pub capacity: usize,
}

impl FreezerBuffer {
    /// Creates a new buffer from a Vec.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        let mut vec = vec.into_boxed_slice();
        let data = vec.as_mut_ptr();
        let len = vec.len();
        std::mem::forget(vec);

        Self {
            data,
            len,
            capacity: len,
        }
    }

    /// Creates an empty buffer.
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
        }
    }

    /// Returns true if the buffer is null.
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Converts back to a Vec, consuming the buffer.
    ///
    /// # Safety
    ///
    /// The buffer must have been created by [`FreezerBuffer::from_vec`].
    pub unsafe fn into_vec(self) -> Vec<u8> {
        if self.data.is_null() {
            return Vec::new();
        }
        Vec::from_raw_parts(self.data, self.len, self.capacity)
    }
}

/// An array of byte buffers for FFI.
///
/// Memory is owned by Rust. Call `freezerdb_free_buffer_list` to release
/// the list together with every buffer in it.
#[repr(C)]
#[derive(Debug)]
pub struct FreezerBufferList {
    /// Pointer to the first buffer.
    pub items: *mut FreezerBuffer,
    /// Number of buffers.
    pub len: usize,
    /// Capacity (for internal use).
    pub capacity: usize,
}

impl FreezerBufferList {
    /// Creates a list from owned records.
    pub fn from_vecs(records: Vec<Vec<u8>>) -> Self {
        let buffers: Vec<FreezerBuffer> = records.into_iter().map(FreezerBuffer::from_vec).collect();
        let mut buffers = buffers.into_boxed_slice();
        let items = buffers.as_mut_ptr();
        let len = buffers.len();
        std::mem::forget(buffers);

        Self {
            items,
            len,
            capacity: len,
        }
    }

    /// Creates an empty list.
    pub fn empty() -> Self {
        Self {
            items: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
        }
    }

    /// Converts back to owned records, consuming the list.
    ///
    /// # Safety
    ///
    /// The list must have been created by [`FreezerBufferList::from_vecs`].
    pub unsafe fn into_vecs(self) -> Vec<Vec<u8>> {
        if self.items.is_null() {
            return Vec::new();
        }
        Vec::from_raw_parts(self.items, self.len, self.capacity)
            .into_iter()
            .map(|buffer| buffer.into_vec())
            .collect()
    }
}

/// Frees a buffer allocated by freezerdb.
///
/// # Safety
///
/// The buffer must have been returned by a freezerdb FFI function and not
/// freed before.
#[no_mangle]
pub unsafe extern "C" fn freezerdb_free_buffer(buffer: FreezerBuffer) {
    if !buffer.data.is_null() {
        drop(Vec::from_raw_parts(buffer.data, buffer.len, buffer.capacity));
    }
}

/// Frees a buffer list and every buffer in it.
///
/// # Safety
///
/// The list must have been returned by a freezerdb FFI function and not
/// freed before. Buffers inside it must not be freed individually.
#[no_mangle]
pub unsafe extern "C" fn freezerdb_free_buffer_list(list: FreezerBufferList) {
    drop(list.into_vecs());
}
