//! Index and slice resolution with negative-index semantics
//!
//! Rows and columns of a view are addressed relative to the view itself.
//! A negative index counts from the end (`-1` is the last element), and
//! slice bounds are clamped into `0..=len` instead of failing.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::error::{Axis, Error, Result};

/// Resolve a possibly-negative index against `len`.
///
/// Returns `None` when the resolved index falls outside `0..len`.
pub fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        (len as isize).checked_add(index)?
    } else {
        index
    };
    if resolved >= 0 && (resolved as usize) < len {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Like [`resolve_index`], reporting a failure for the given axis
pub fn checked_index(axis: Axis, index: isize, len: usize) -> Result<usize> {
    resolve_index(index, len).ok_or_else(|| Error::out_of_range(axis, index, len))
}

/// A contiguous slice, as in `start:stop:step`.
///
/// Only a step of 1 is supported; anything else fails when the slice is
/// resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl Slice {
    pub fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Self {
            start,
            stop,
            step: None,
        }
    }

    /// The whole sequence (`[:]`)
    pub fn full() -> Self {
        Self::default()
    }

    /// `[start:stop]`
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop))
    }

    /// `[start:]`
    pub fn from_start(start: isize) -> Self {
        Self::new(Some(start), None)
    }

    /// `[:stop]`
    pub fn until(stop: isize) -> Self {
        Self::new(None, Some(stop))
    }

    pub fn with_step(mut self, step: isize) -> Self {
        self.step = Some(step);
        self
    }

    /// Resolve against a sequence of length `len`.
    ///
    /// Bounds are clamped into `0..=len`, and a stop before its start yields
    /// an empty range at `start`.
    pub fn indices(&self, len: usize) -> Result<Range<usize>> {
        let step = self.step.unwrap_or(1);
        if step != 1 {
            return Err(Error::SteppedSlice(step));
        }
        let start = clamp_bound(self.start, len, 0);
        let stop = clamp_bound(self.stop, len, len).max(start);
        Ok(start..stop)
    }

    /// Number of elements the slice selects from a sequence of length `len`
    pub fn len_for(&self, len: usize) -> Result<usize> {
        self.indices(len).map(|r| r.len())
    }
}

fn clamp_bound(bound: Option<isize>, len: usize, default: usize) -> usize {
    match bound {
        None => default,
        Some(b) if b < 0 => {
            let shifted = len as isize + b;
            if shifted < 0 {
                0
            } else {
                shifted as usize
            }
        }
        Some(b) => (b as usize).min(len),
    }
}

impl From<Range<isize>> for Slice {
    fn from(r: Range<isize>) -> Self {
        Self::range(r.start, r.end)
    }
}

impl From<RangeFrom<isize>> for Slice {
    fn from(r: RangeFrom<isize>) -> Self {
        Self::from_start(r.start)
    }
}

impl From<RangeTo<isize>> for Slice {
    fn from(r: RangeTo<isize>) -> Self {
        Self::until(r.end)
    }
}

impl From<RangeFull> for Slice {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}
