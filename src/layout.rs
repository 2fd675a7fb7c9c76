//! Stride and offset utilities.
//!
//! Pure functions over `(shape, strides)` pairs. Everything here is
//! row-major: the last index varies fastest and has stride 1 in the
//! canonical layout.

use smallvec::SmallVec;

/// Compute row-major strides (C default: last index varies fastest).
pub fn contiguous_strides(shape: &[usize]) -> Vec<isize> {
    let rank = shape.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1isize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1] as isize;
    }
    strides
}

/// Returns true if the view is layout-equivalent to one flat buffer of
/// `volume` elements walked in canonical order.
///
/// Size-1 dimensions never move the address, so their stride is ignored.
/// Permuted views and broadcast (0-stride, size > 1) dimensions are not dense.
pub fn is_dense(shape: &[usize], strides: &[isize]) -> bool {
    debug_assert_eq!(shape.len(), strides.len());
    strided_dims(shape, strides) == shape.len()
}

/// Length of the longest trailing run of dimensions laid out contiguously.
///
/// Walks from the innermost dimension outwards while each stride equals the
/// canonical row-major stride of the suffix seen so far. The returned suffix
/// (the "minor" block) can be processed as a single stride-1 run.
pub fn strided_dims(shape: &[usize], strides: &[isize]) -> usize {
    debug_assert_eq!(shape.len(), strides.len());
    let mut expected = 1isize;
    let mut depth = 0usize;
    for (&dim, &stride) in shape.iter().zip(strides.iter()).rev() {
        if dim != 1 && stride != expected {
            break;
        }
        expected *= dim as isize;
        depth += 1;
    }
    depth
}

/// Flat offsets of every index combination over `shape`, row-major.
///
/// A rank-0 shape yields the single offset `0`; any zero-size dimension
/// yields no offsets at all.
pub fn get_offsets(shape: &[usize], strides: &[isize]) -> Vec<isize> {
    debug_assert_eq!(shape.len(), strides.len());
    let total: usize = shape.iter().product();
    let mut offsets = Vec::with_capacity(total);
    if total == 0 {
        return offsets;
    }

    let rank = shape.len();
    let mut index: SmallVec<[usize; 8]> = SmallVec::from_elem(0, rank);
    let mut offset = 0isize;
    for _ in 0..total {
        offsets.push(offset);
        // Advance indices (row-major order: last index changes fastest)
        for d in (0..rank).rev() {
            index[d] += 1;
            offset += strides[d];
            if index[d] < shape[d] {
                break;
            }
            offset -= strides[d] * shape[d] as isize;
            index[d] = 0;
        }
    }
    offsets
}

/// Smallest and largest relative offsets a non-empty view can touch.
///
/// `None` if either bound does not fit in an `isize`.
pub(crate) fn offset_extent(shape: &[usize], strides: &[isize]) -> Option<(isize, isize)> {
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (&dim, &stride) in shape.iter().zip(strides.iter()) {
        if dim > 1 {
            let end = stride.checked_mul(isize::try_from(dim - 1).ok()?)?;
            if end >= 0 {
                hi = hi.checked_add(end)?;
            } else {
                lo = lo.checked_add(end)?;
            }
        }
    }
    Some((lo, hi))
}

/// Product of `shape`, or `None` if it overflows `usize`.
pub(crate) fn checked_volume(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}
