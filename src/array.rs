//! The array descriptor.
//!
//! [`NDArray`] is a shape/stride/offset triple over a shared, immutable
//! `f32` buffer. Views created by reshape/transpose/slice clone the `Arc`
//! and rewrite the metadata only; no descriptor ever writes to its buffer.

use std::sync::Arc;

use crate::gather::{gather_elements, ElementIter};
use crate::layout::{self, checked_volume, contiguous_strides, offset_extent};
use crate::{NdError, Result};

/// An n-dimensional `f32` array view over a shared buffer.
#[derive(Clone)]
pub struct NDArray {
    data: Arc<[f32]>,
    shape: Arc<[usize]>,
    strides: Arc<[isize]>,
    base_offset: usize,
}

impl std::fmt::Debug for NDArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NDArray")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("base_offset", &self.base_offset)
            .field("elements", &self.elements())
            .finish()
    }
}

impl NDArray {
    /// Create a descriptor over an existing buffer.
    ///
    /// # Errors
    /// - [`NdError::StrideLengthMismatch`] if `shape` and `strides` differ in length
    /// - [`NdError::OffsetOutOfBounds`] if any index would fall outside `data`
    pub fn from_parts(
        data: Arc<[f32]>,
        shape: &[usize],
        strides: &[isize],
        base_offset: usize,
    ) -> Result<Self> {
        validate_bounds(data.len(), shape, strides, base_offset)?;
        Ok(Self::from_raw(data, shape, strides, base_offset))
    }

    /// Create a descriptor without validating bounds.
    ///
    /// Callers inside the crate derive `shape`/`strides`/`base_offset` from an
    /// already valid descriptor.
    pub(crate) fn from_raw(
        data: Arc<[f32]>,
        shape: &[usize],
        strides: &[isize],
        base_offset: usize,
    ) -> Self {
        debug_assert!(validate_bounds(data.len(), shape, strides, base_offset).is_ok());
        Self {
            data,
            shape: Arc::from(shape),
            strides: Arc::from(strides),
            base_offset,
        }
    }

    /// Wrap a freshly materialized buffer with canonical strides.
    pub(crate) fn from_dense(shape: &[usize], data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        let strides = contiguous_strides(shape);
        Self {
            data: Arc::from(data),
            shape: Arc::from(shape),
            strides: Arc::from(strides),
            base_offset: 0,
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Position of the first element in the backing buffer.
    #[inline]
    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of logical elements, independent of the buffer length.
    #[inline]
    pub fn volume(&self) -> usize {
        self.shape.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    /// The whole backing buffer, including slots this view does not address.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub(crate) fn data_arc(&self) -> &Arc<[f32]> {
        &self.data
    }

    /// True if both descriptors alias the same buffer.
    pub fn shares_buffer(&self, other: &NDArray) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Check if the view is layout-equivalent to a flat contiguous buffer.
    pub fn is_dense(&self) -> bool {
        layout::is_dense(&self.shape, &self.strides)
    }

    /// Read a single element.
    ///
    /// Negative indices count from the end of their axis.
    pub fn element(&self, index: &[isize]) -> Result<f32> {
        if index.len() != self.ndim() {
            return Err(NdError::IndexRankMismatch {
                expected: self.ndim(),
                actual: index.len(),
            });
        }
        let mut pos = self.base_offset as isize;
        for (axis, ((&i, &size), &stride)) in index
            .iter()
            .zip(self.shape.iter())
            .zip(self.strides.iter())
            .enumerate()
        {
            let normalized = normalize_index(i, size).ok_or(NdError::IndexOutOfBounds {
                axis,
                index: i,
                size,
            })?;
            pos += normalized as isize * stride;
        }
        Ok(self.data[pos as usize])
    }

    /// All logical elements in row-major order.
    pub fn elements(&self) -> Vec<f32> {
        gather_elements(self)
    }

    /// Iterate over logical elements in row-major order.
    pub fn iter(&self) -> ElementIter<'_> {
        ElementIter::new(self)
    }

    /// The single element of a rank-0 or one-element array.
    pub fn as_scalar(&self) -> Result<f32> {
        if self.volume() != 1 {
            return Err(NdError::ElementCountMismatch {
                expected: 1,
                actual: self.volume(),
            });
        }
        // volume == 1 means every index is 0
        Ok(self.data[self.base_offset])
    }
}

/// Arrays are equal when shapes match exactly and every logical element has
/// the same bit pattern. No broadcasting is applied.
impl PartialEq for NDArray {
    fn eq(&self, other: &Self) -> bool {
        if self.shape != other.shape {
            return false;
        }
        self.iter()
            .zip(other.iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl<'a> IntoIterator for &'a NDArray {
    type Item = f32;
    type IntoIter = ElementIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Map `index` into `[0, size)`, counting negative values from the end.
pub(crate) fn normalize_index(index: isize, size: usize) -> Option<usize> {
    let size = size as isize;
    let normalized = if index < 0 { index + size } else { index };
    if (0..size).contains(&normalized) {
        Some(normalized as usize)
    } else {
        None
    }
}

/// Validate that all accessed offsets stay within `[0, len)`.
fn validate_bounds(len: usize, shape: &[usize], strides: &[isize], base_offset: usize) -> Result<()> {
    if shape.len() != strides.len() {
        return Err(NdError::StrideLengthMismatch);
    }
    // Empty array - no access needed
    if shape.iter().any(|&d| d == 0) {
        if base_offset > len {
            return Err(NdError::OffsetOutOfBounds);
        }
        return Ok(());
    }
    if checked_volume(shape).is_none() {
        return Err(NdError::OffsetOutOfBounds);
    }
    let (lo, hi) = offset_extent(shape, strides).ok_or(NdError::OffsetOutOfBounds)?;
    let base = isize::try_from(base_offset).map_err(|_| NdError::OffsetOutOfBounds)?;
    let first = base.checked_add(lo).ok_or(NdError::OffsetOutOfBounds)?;
    let last = base.checked_add(hi).ok_or(NdError::OffsetOutOfBounds)?;
    if first < 0 || last as usize >= len {
        return Err(NdError::OffsetOutOfBounds);
    }
    Ok(())
}
