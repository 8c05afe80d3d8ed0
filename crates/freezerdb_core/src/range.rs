//! Lazy iteration over a range of receipts.

use crate::error::FreezerResult;
use crate::freezer::Freezer;
use std::iter::FusedIterator;

/// Iterator over the receipts in `[start, end)`.
///
/// Each call to `next` performs one independent fetch and holds no locks
/// afterwards, so the caller may stop between any two elements. Appends
/// made while iterating become visible to later elements.
///
/// On the first failure, typically `NotFound` for a sequence number at or
/// past the head, the error is yielded once and the iterator ends.
///
/// ```rust,ignore
/// for receipt in freezer.fetch_range(0, 3) {
///     let bytes = receipt?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RangeIter<'a> {
    freezer: &'a Freezer,
    start: u64,
    next: u64,
    end: u64,
    done: bool,
}

impl<'a> RangeIter<'a> {
    /// Creates an iterator over `[start, end)`. An inverted range is empty.
    pub(crate) fn new(freezer: &'a Freezer, start: u64, end: u64) -> Self {
        Self {
            freezer,
            start,
            next: start,
            end: end.max(start),
            done: false,
        }
    }

    /// Rewinds to the start of the range.
    pub fn restart(&mut self) {
        self.next = self.start;
        self.done = false;
    }

    /// Returns the sequence number the next element will be fetched from.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.next
    }

    /// Returns how many sequence numbers are left in the range.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        if self.done {
            0
        } else {
            self.end - self.next
        }
    }
}

impl Iterator for RangeIter<'_> {
    type Item = FreezerResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next >= self.end {
            return None;
        }

        match self.freezer.fetch_receipt(self.next) {
            Ok(receipt) => {
                self.next += 1;
                Some(Ok(receipt))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).ok();
        (remaining.map_or(0, |n| n.min(1)), remaining)
    }
}

impl FusedIterator for RangeIter<'_> {}
