//! Row-major element gathering.
//!
//! Turns any descriptor, however permuted, broadcast or offset, into the
//! sequence of its logical elements.

use smallvec::SmallVec;

use crate::array::NDArray;

// ============================================================================
// Iterator
// ============================================================================

/// Iterator over the logical elements of an [`NDArray`] in row-major order.
///
/// Keeps a running buffer position and an index carry, so each step is
/// O(1) amortized regardless of rank.
pub struct ElementIter<'a> {
    data: &'a [f32],
    shape: &'a [usize],
    strides: &'a [isize],
    pos: isize,
    indices: SmallVec<[usize; 8]>,
    remaining: usize,
}

impl<'a> ElementIter<'a> {
    pub(crate) fn new(array: &'a NDArray) -> Self {
        let shape = array.shape();
        Self {
            data: array.data(),
            shape,
            strides: array.strides(),
            pos: array.base_offset() as isize,
            indices: SmallVec::from_elem(0, shape.len()),
            remaining: array.volume(),
        }
    }
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = f32;

    #[inline]
    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.data[self.pos as usize];
        self.remaining -= 1;
        if self.remaining == 0 {
            return Some(value);
        }

        // Advance indices (row-major order: last index changes fastest)
        for d in (0..self.shape.len()).rev() {
            self.indices[d] += 1;
            self.pos += self.strides[d];
            if self.indices[d] < self.shape[d] {
                break;
            }
            self.pos -= self.strides[d] * self.shape[d] as isize;
            self.indices[d] = 0;
        }
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ElementIter<'_> {}

// ============================================================================
// Gather
// ============================================================================

/// Copy the logical elements of `array` into a fresh row-major `Vec`.
///
/// Dense views are copied as one slice; everything else walks the index
/// space. A zero-volume array yields an empty `Vec`.
pub fn gather_elements(array: &NDArray) -> Vec<f32> {
    let len = array.volume();
    if len == 0 {
        return Vec::new();
    }
    if array.is_dense() {
        let start = array.base_offset();
        return array.data()[start..start + len].to_vec();
    }
    let mut out = Vec::with_capacity(len);
    out.extend(array.iter());
    out
}
