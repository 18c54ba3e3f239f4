//! Slice ranges for submatrix views.

use crate::error::{NeurustError, Result};
use std::ops::Range;

/// A half-open `[start, end)` range along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceRange {
    start: usize,
    end: usize,
}

impl SliceRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The range `[offset, offset + len)`.
    pub fn at(offset: usize, len: usize) -> Self {
        Self::new(offset, offset + len)
    }

    /// Selects every index of an axis of length `len`.
    pub fn all(len: usize) -> Self {
        Self::new(0, len)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the range against an axis of length `dim` and returns it as a std range.
    pub fn resolve(&self, dim: usize) -> Result<Range<usize>> {
        if self.start > self.end || self.end > dim {
            return Err(NeurustError::InvalidSlice(*self, dim));
        }
        Ok(self.start..self.end)
    }
}

impl From<Range<usize>> for SliceRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}
