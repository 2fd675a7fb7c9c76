//! Zero-copy view transforms.
//!
//! Reshape (of dense arrays), transpose, permute and basic indexing keep the
//! same buffer and only recompute shape, strides and base offset.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::array::{normalize_index, NDArray};
use crate::layout::contiguous_strides;
use crate::{NdError, Result};

// ============================================================================
// Axis indices
// ============================================================================

/// One entry of a basic index expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisIndex {
    /// Keep the whole axis.
    All,
    /// Fix the axis at one position and drop it. Negative values count from
    /// the end.
    At(isize),
    /// Keep the positions `start, start + step, ...` before `end`.
    ///
    /// Missing bounds and negative values follow Python slice rules, so a
    /// negative `step` walks the axis backwards.
    Slice {
        start: Option<isize>,
        end: Option<isize>,
        step: isize,
    },
}

impl AxisIndex {
    pub fn slice(start: Option<isize>, end: Option<isize>, step: isize) -> Self {
        AxisIndex::Slice { start, end, step }
    }

    /// Every position, back to front.
    pub fn reversed() -> Self {
        AxisIndex::Slice {
            start: None,
            end: None,
            step: -1,
        }
    }
}

impl From<isize> for AxisIndex {
    fn from(index: isize) -> Self {
        AxisIndex::At(index)
    }
}

impl From<Range<isize>> for AxisIndex {
    fn from(r: Range<isize>) -> Self {
        AxisIndex::slice(Some(r.start), Some(r.end), 1)
    }
}

impl From<RangeFrom<isize>> for AxisIndex {
    fn from(r: RangeFrom<isize>) -> Self {
        AxisIndex::slice(Some(r.start), None, 1)
    }
}

impl From<RangeTo<isize>> for AxisIndex {
    fn from(r: RangeTo<isize>) -> Self {
        AxisIndex::slice(None, Some(r.end), 1)
    }
}

impl From<RangeFull> for AxisIndex {
    fn from(_: RangeFull) -> Self {
        AxisIndex::All
    }
}

/// Resolve a slice against an axis of `size`, returning `(first, len)`.
fn resolve_slice(
    start: Option<isize>,
    end: Option<isize>,
    step: isize,
    size: usize,
) -> Result<(isize, usize)> {
    if step == 0 {
        return Err(NdError::ZeroSliceStep);
    }
    let size = size as isize;
    let clamp = |v: isize, lo: isize, hi: isize| {
        let v = if v < 0 { v + size } else { v };
        v.clamp(lo, hi)
    };
    if step > 0 {
        let first = start.map_or(0, |s| clamp(s, 0, size));
        let stop = end.map_or(size, |e| clamp(e, 0, size));
        let len = if stop > first {
            (stop - first + step - 1) / step
        } else {
            0
        };
        Ok((first, len as usize))
    } else {
        let first = start.map_or(size - 1, |s| clamp(s, -1, size - 1));
        let stop = end.map_or(-1, |e| clamp(e, -1, size - 1));
        let len = if first > stop {
            (first - stop - 1) / (-step) + 1
        } else {
            0
        };
        Ok((first, len as usize))
    }
}

// ============================================================================
// Transforms
// ============================================================================

impl NDArray {
    /// View with a new shape. At most one entry may be `-1`, which is inferred.
    ///
    /// Dense arrays share their buffer with the result. Other layouts are
    /// gathered first, so the result is always dense.
    ///
    /// # Errors
    /// - [`NdError::InvalidShape`] for negative entries other than one `-1`
    /// - [`NdError::ElementCountMismatch`] if the element count changes
    pub fn reshaped(&self, shape: &[isize]) -> Result<NDArray> {
        let volume = self.volume();
        let shape = infer_shape(shape, volume)?;
        let strides = contiguous_strides(&shape);
        if self.is_dense() {
            return Ok(NDArray::from_raw(
                self.data_arc().clone(),
                &shape,
                &strides,
                self.base_offset(),
            ));
        }
        Ok(NDArray::from_dense(&shape, self.elements()))
    }

    /// Flatten into one dimension.
    pub fn flattened(&self) -> NDArray {
        let volume = self.volume();
        if self.is_dense() {
            return NDArray::from_raw(self.data_arc().clone(), &[volume], &[1], self.base_offset());
        }
        NDArray::from_dense(&[volume], self.elements())
    }

    /// Reverse the order of all axes.
    pub fn transposed(&self) -> NDArray {
        let shape: Vec<usize> = self.shape().iter().rev().copied().collect();
        let strides: Vec<isize> = self.strides().iter().rev().copied().collect();
        NDArray::from_raw(self.data_arc().clone(), &shape, &strides, self.base_offset())
    }

    /// Reorder axes: axis `i` of the result is axis `perm[i]` of `self`.
    ///
    /// # Errors
    /// - [`NdError::IndexRankMismatch`] if `perm.len() != ndim`
    /// - [`NdError::InvalidAxis`] if `perm` is not a permutation
    pub fn permuted(&self, perm: &[usize]) -> Result<NDArray> {
        let rank = self.ndim();
        if perm.len() != rank {
            return Err(NdError::IndexRankMismatch {
                expected: rank,
                actual: perm.len(),
            });
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(NdError::InvalidAxis {
                    axis: p as isize,
                    rank,
                });
            }
            seen[p] = true;
        }
        let shape: Vec<usize> = perm.iter().map(|&p| self.shape()[p]).collect();
        let strides: Vec<isize> = perm.iter().map(|&p| self.strides()[p]).collect();
        Ok(NDArray::from_raw(
            self.data_arc().clone(),
            &shape,
            &strides,
            self.base_offset(),
        ))
    }

    /// Exchange two axes. Negative axes count from the end.
    pub fn swap_axes(&self, a: isize, b: isize) -> Result<NDArray> {
        let a = normalize_axis(a, self.ndim())?;
        let b = normalize_axis(b, self.ndim())?;
        let mut perm: Vec<usize> = (0..self.ndim()).collect();
        perm.swap(a, b);
        self.permuted(&perm)
    }

    /// Basic indexing, one entry per leading axis.
    ///
    /// Axes not covered by `index` are kept whole.
    ///
    /// # Errors
    /// - [`NdError::IndexRankMismatch`] if `index` has more entries than axes
    /// - [`NdError::IndexOutOfBounds`] for an out-of-range [`AxisIndex::At`]
    /// - [`NdError::ZeroSliceStep`] for a zero step
    pub fn subscript(&self, index: &[AxisIndex]) -> Result<NDArray> {
        let rank = self.ndim();
        if index.len() > rank {
            return Err(NdError::IndexRankMismatch {
                expected: rank,
                actual: index.len(),
            });
        }

        let mut offset = self.base_offset() as isize;
        let mut shape = Vec::with_capacity(rank);
        let mut strides = Vec::with_capacity(rank);
        let mut empty = false;
        for (axis, (&size, &stride)) in self.shape().iter().zip(self.strides()).enumerate() {
            match index.get(axis).copied().unwrap_or(AxisIndex::All) {
                AxisIndex::All => {
                    shape.push(size);
                    strides.push(stride);
                }
                AxisIndex::At(i) => {
                    let i = normalize_index(i, size).ok_or(NdError::IndexOutOfBounds {
                        axis,
                        index: i,
                        size,
                    })?;
                    offset += i as isize * stride;
                }
                AxisIndex::Slice { start, end, step } => {
                    let (first, len) = resolve_slice(start, end, step, size)?;
                    if len > 0 {
                        offset += first * stride;
                    } else {
                        empty = true;
                    }
                    shape.push(len);
                    strides.push(stride * step);
                }
            }
        }
        // An empty result addresses nothing; keep the source offset.
        let offset = if empty {
            self.base_offset()
        } else {
            offset as usize
        };
        Ok(NDArray::from_raw(
            self.data_arc().clone(),
            &shape,
            &strides,
            offset,
        ))
    }

    /// Fix `axis` at `index` and drop it.
    pub fn select(&self, axis: isize, index: isize) -> Result<NDArray> {
        let axis = normalize_axis(axis, self.ndim())?;
        let mut entries = vec![AxisIndex::All; axis + 1];
        entries[axis] = AxisIndex::At(index);
        self.subscript(&entries)
    }

    /// Insert a size-1 axis at `axis` (`0..=ndim`, negative counts from the end).
    pub fn expand_dims(&self, axis: isize) -> Result<NDArray> {
        let axis = normalize_axis(axis, self.ndim() + 1)?;
        let mut shape = self.shape().to_vec();
        let mut strides = self.strides().to_vec();
        shape.insert(axis, 1);
        strides.insert(axis, 0);
        Ok(NDArray::from_raw(
            self.data_arc().clone(),
            &shape,
            &strides,
            self.base_offset(),
        ))
    }

    /// Copy the logical elements into a fresh dense array.
    pub fn to_contiguous(&self) -> NDArray {
        NDArray::from_dense(self.shape(), self.elements())
    }
}

/// Map `axis` into `[0, rank)`, counting negative values from the end.
pub(crate) fn normalize_axis(axis: isize, rank: usize) -> Result<usize> {
    normalize_index(axis, rank).ok_or(NdError::InvalidAxis { axis, rank })
}

/// Turn a reshape target into a concrete shape of `volume` elements.
fn infer_shape(target: &[isize], volume: usize) -> Result<Vec<usize>> {
    let mut inferred = None;
    let mut known = 1usize;
    for (i, &d) in target.iter().enumerate() {
        match d {
            -1 if inferred.is_none() => inferred = Some(i),
            d if d < 0 => return Err(NdError::InvalidShape(target.to_vec())),
            d => known *= d as usize,
        }
    }

    let mut shape: Vec<usize> = target.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = inferred {
        if known == 0 {
            return Err(NdError::InvalidShape(target.to_vec()));
        }
        if volume % known != 0 {
            return Err(NdError::ElementCountMismatch {
                expected: known,
                actual: volume,
            });
        }
        shape[i] = volume / known;
    } else if known != volume {
        return Err(NdError::ElementCountMismatch {
            expected: known,
            actual: volume,
        });
    }
    Ok(shape)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn range(shape: &[usize]) -> NDArray {
        let n: usize = shape.iter().product();
        let data: Vec<f32> = (0..n).map(|i| i as f32).collect();
        NDArray::from_parts(Arc::from(data), shape, &contiguous_strides(shape), 0).unwrap()
    }

    #[test]
    fn test_resolve_slice_forward() {
        assert_eq!(resolve_slice(None, None, 1, 5).unwrap(), (0, 5));
        assert_eq!(resolve_slice(Some(1), Some(4), 2, 5).unwrap(), (1, 2));
        assert_eq!(resolve_slice(Some(-2), None, 1, 5).unwrap(), (3, 2));
        assert_eq!(resolve_slice(Some(4), Some(2), 1, 5).unwrap(), (4, 0));
        assert_eq!(resolve_slice(Some(-10), Some(10), 1, 5).unwrap(), (0, 5));
    }

    #[test]
    fn test_resolve_slice_backward() {
        assert_eq!(resolve_slice(None, None, -1, 5).unwrap(), (4, 5));
        assert_eq!(resolve_slice(None, None, -2, 5).unwrap(), (4, 3));
        assert_eq!(resolve_slice(Some(3), Some(0), -1, 5).unwrap(), (3, 3));
        assert_eq!(resolve_slice(Some(-1), Some(-3), -1, 5).unwrap(), (4, 2));
        assert_eq!(resolve_slice(None, None, -1, 0).unwrap().1, 0);
    }

    #[test]
    fn test_resolve_slice_zero_step() {
        assert_eq!(
            resolve_slice(None, None, 0, 3).unwrap_err(),
            NdError::ZeroSliceStep
        );
    }

    #[test]
    fn test_infer_shape() {
        assert_eq!(infer_shape(&[2, -1], 6).unwrap(), vec![2, 3]);
        assert_eq!(infer_shape(&[-1], 0).unwrap(), vec![0]);
        assert_eq!(infer_shape(&[], 1).unwrap(), Vec::<usize>::new());
        assert!(matches!(
            infer_shape(&[-1, -1], 4),
            Err(NdError::InvalidShape(_))
        ));
        assert!(matches!(
            infer_shape(&[-2, 2], 4),
            Err(NdError::InvalidShape(_))
        ));
        assert_eq!(
            infer_shape(&[4, -1], 6).unwrap_err(),
            NdError::ElementCountMismatch {
                expected: 4,
                actual: 6
            }
        );
    }

    #[test]
    fn test_reshaped_shares_dense_buffer() {
        let a = range(&[2, 3, 4]);
        let b = a.reshaped(&[6, -1]).unwrap();
        assert_eq!(b.shape(), &[6, 4]);
        assert!(b.shares_buffer(&a));
        assert_eq!(b.elements(), a.elements());
    }

    #[test]
    fn test_reshaped_gathers_strided() {
        let a = range(&[2, 3]).transposed();
        let b = a.reshaped(&[6]).unwrap();
        assert!(!b.shares_buffer(&a));
        assert_eq!(b.elements(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_transposed() {
        let a = range(&[2, 3]);
        let t = a.transposed();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.strides(), &[1, 3]);
        assert!(t.shares_buffer(&a));
    }

    #[test]
    fn test_permuted() {
        let a = range(&[2, 3, 4]);
        let p = a.permuted(&[1, 2, 0]).unwrap();
        assert_eq!(p.shape(), &[3, 4, 2]);
        assert_eq!(p.strides(), &[4, 1, 12]);
        assert_eq!(p.element(&[2, 3, 1]).unwrap(), a.element(&[1, 2, 3]).unwrap());
        assert!(matches!(
            a.permuted(&[0, 0, 1]),
            Err(NdError::InvalidAxis { .. })
        ));
        assert!(a.permuted(&[0, 1]).is_err());
    }

    #[test]
    fn test_subscript_at_and_all() {
        let a = range(&[2, 2, 2]);
        let row = a.subscript(&[AxisIndex::At(1)]).unwrap();
        assert_eq!(row.shape(), &[2, 2]);
        assert_eq!(row.base_offset(), 4);
        assert_eq!(row.elements(), vec![4.0, 5.0, 6.0, 7.0]);

        let col = a.subscript(&[AxisIndex::All, 1.into()]).unwrap();
        assert_eq!(col.shape(), &[2, 2]);
        assert_eq!(col.strides(), &[4, 1]);
        assert_eq!(col.elements(), vec![2.0, 3.0, 6.0, 7.0]);

        let last = a.subscript(&[(..).into(), (..).into(), 1.into()]).unwrap();
        assert_eq!(last.elements(), vec![1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_subscript_negative_step() {
        let a = range(&[5]);
        let r = a.subscript(&[AxisIndex::reversed()]).unwrap();
        assert_eq!(r.strides(), &[-1]);
        assert_eq!(r.base_offset(), 4);
        assert_eq!(r.elements(), vec![4.0, 3.0, 2.0, 1.0, 0.0]);

        let every_other = a.subscript(&[AxisIndex::slice(None, None, -2)]).unwrap();
        assert_eq!(every_other.elements(), vec![4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_subscript_ranges() {
        let a = range(&[3, 4]);
        let s = a.subscript(&[(1..).into(), (..-1).into()]).unwrap();
        assert_eq!(s.shape(), &[2, 3]);
        assert_eq!(s.elements(), vec![4.0, 5.0, 6.0, 8.0, 9.0, 10.0]);
    }

    #[test]
    fn test_subscript_empty_slice() {
        let a = range(&[3, 4]);
        let s = a.subscript(&[(2..1).into()]).unwrap();
        assert_eq!(s.shape(), &[0, 4]);
        assert!(s.elements().is_empty());
    }

    #[test]
    fn test_subscript_errors() {
        let a = range(&[2, 2]);
        assert!(matches!(
            a.subscript(&[0.into(), 0.into(), 0.into()]),
            Err(NdError::IndexRankMismatch { .. })
        ));
        assert_eq!(
            a.subscript(&[2.into()]).unwrap_err(),
            NdError::IndexOutOfBounds {
                axis: 0,
                index: 2,
                size: 2
            }
        );
    }

    #[test]
    fn test_select() {
        let a = range(&[2, 3]);
        assert_eq!(a.select(1, -1).unwrap().elements(), vec![2.0, 5.0]);
        assert_eq!(a.select(0, 1).unwrap().elements(), vec![3.0, 4.0, 5.0]);
        assert!(matches!(a.select(2, 0), Err(NdError::InvalidAxis { .. })));
    }

    #[test]
    fn test_swap_axes_and_expand_dims() {
        let a = range(&[2, 3]);
        assert_eq!(a.swap_axes(0, -1).unwrap(), a.transposed());
        let e = a.expand_dims(0).unwrap();
        assert_eq!(e.shape(), &[1, 2, 3]);
        let e = a.expand_dims(-1).unwrap();
        assert_eq!(e.shape(), &[2, 3, 1]);
        assert!(e.is_dense());
    }

    #[test]
    fn test_flattened_and_to_contiguous() {
        let t = range(&[2, 3]).transposed();
        let c = t.to_contiguous();
        assert!(c.is_dense());
        assert_eq!(c, t);
        assert_eq!(t.flattened().elements(), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }
}
