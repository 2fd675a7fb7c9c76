//! NumPy-style broadcasting by stride-0 promotion.
//!
//! Shapes are aligned at their trailing dimension. A dimension of size 1, or
//! a missing leading dimension, is stretched by giving it stride 0; nothing is
//! copied.

use crate::array::NDArray;
use crate::{NdError, Result};

/// The common shape of `a` and `b` under broadcasting.
///
/// # Errors
/// [`NdError::ShapeBroadcast`] if a pair of aligned dimensions differ and
/// neither is 1.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut shape = vec![0usize; rank];
    for k in 0..rank {
        // k counts from the trailing dimension
        let da = if k < a.len() { a[a.len() - 1 - k] } else { 1 };
        let db = if k < b.len() { b[b.len() - 1 - k] } else { 1 };
        shape[rank - 1 - k] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(NdError::ShapeBroadcast(a.to_vec(), b.to_vec()));
        };
    }
    Ok(shape)
}

/// Promote two arrays to their common broadcast shape.
///
/// Both results alias their inputs' buffers. Arrays that already share a
/// shape come back unchanged.
pub fn broadcast(a: &NDArray, b: &NDArray) -> Result<(NDArray, NDArray)> {
    if a.shape() == b.shape() {
        return Ok((a.clone(), b.clone()));
    }
    let target = broadcast_shape(a.shape(), b.shape())?;
    match (promote(a, &target), promote(b, &target)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(NdError::ShapeBroadcast(a.shape().to_vec(), b.shape().to_vec())),
    }
}

impl NDArray {
    /// View this array with `shape`, stretching size-1 and missing leading
    /// dimensions.
    ///
    /// # Errors
    /// [`NdError::ShapeBroadcast`] if this array cannot be stretched to `shape`.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<NDArray> {
        promote(self, shape)
            .ok_or_else(|| NdError::ShapeBroadcast(self.shape().to_vec(), shape.to_vec()))
    }
}

/// Set stride 0 on every dimension of `array` that `target` stretches.
///
/// Returns `None` when a dimension is incompatible or `target` has lower rank.
fn promote(array: &NDArray, target: &[usize]) -> Option<NDArray> {
    let rank = target.len();
    let lead = rank.checked_sub(array.ndim())?;
    let mut strides = vec![0isize; rank];
    for (d, (&size, &stride)) in array.shape().iter().zip(array.strides()).enumerate() {
        if size == target[lead + d] {
            strides[lead + d] = stride;
        } else if size == 1 {
            // Size-1 dimension: broadcast with stride 0
            strides[lead + d] = 0;
        } else {
            return None;
        }
    }
    Some(NDArray::from_raw(
        array.data_arc().clone(),
        target,
        &strides,
        array.base_offset(),
    ))
}
