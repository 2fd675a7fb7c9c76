//! Full and per-axis reductions.
//!
//! A per-axis reduction drops the reduced axis. Each output element reads one
//! strided run along that axis, and output elements are split across the
//! executor's workers the same way the elementwise engine splits its major
//! offsets.

use crate::array::NDArray;
use crate::backend::StridedSpan;
use crate::layout::get_offsets;
use crate::simd;
use crate::threading::Executor;
use crate::view::normalize_axis;
use crate::{NdError, Result};

/// Reductions available along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    Sum,
    /// NaN for an empty axis.
    Mean,
    Max,
    Min,
    /// Position of the first maximum, as `f32`.
    ArgMax,
    /// Position of the first minimum, as `f32`.
    ArgMin,
}

impl Reduction {
    /// Whether the reduction is undefined over zero elements.
    fn needs_elements(self) -> bool {
        !matches!(self, Reduction::Sum | Reduction::Mean)
    }

    fn reduce_run(self, run: StridedSpan<'_>, len: usize) -> f32 {
        match self {
            Reduction::Sum => sum_run(run, len),
            Reduction::Mean => sum_run(run, len) / len as f32,
            Reduction::Max => fold_run(run, len, f32::max),
            Reduction::Min => fold_run(run, len, f32::min),
            Reduction::ArgMax => arg_run(run, len, |v, best| v > best) as f32,
            Reduction::ArgMin => arg_run(run, len, |v, best| v < best) as f32,
        }
    }
}

fn sum_run(run: StridedSpan<'_>, len: usize) -> f32 {
    match run.contiguous(len) {
        Some(slice) => simd::sum_f32(slice),
        None => (0..len).map(|i| run.get(i)).sum(),
    }
}

fn fold_run(run: StridedSpan<'_>, len: usize, f: impl Fn(f32, f32) -> f32) -> f32 {
    (1..len).fold(run.get(0), |acc, i| f(acc, run.get(i)))
}

fn arg_run(run: StridedSpan<'_>, len: usize, better: impl Fn(f32, f32) -> bool) -> usize {
    let mut best = run.get(0);
    let mut best_i = 0;
    for i in 1..len {
        let v = run.get(i);
        if better(v, best) {
            best = v;
            best_i = i;
        }
    }
    best_i
}

/// Reduce `x` along `axis` (negative counts from the end).
///
/// # Errors
/// - [`NdError::InvalidAxis`] if `axis` is out of range
/// - [`NdError::EmptyReduction`] for max/min/argmax/argmin over an empty
///   axis when the output is not empty
pub fn reduce_along_with(
    exec: &Executor,
    x: &NDArray,
    axis: isize,
    reduction: Reduction,
) -> Result<NDArray> {
    let axis = normalize_axis(axis, x.ndim())?;
    let axis_len = x.shape()[axis];
    let axis_stride = x.strides()[axis];

    let mut out_shape = x.shape().to_vec();
    out_shape.remove(axis);
    let mut out_strides = x.strides().to_vec();
    out_strides.remove(axis);

    let total: usize = out_shape.iter().product();
    if total == 0 {
        return Ok(NDArray::from_dense(&out_shape, Vec::new()));
    }
    if axis_len == 0 && reduction.needs_elements() {
        return Err(NdError::EmptyReduction);
    }

    let offsets = get_offsets(&out_shape, &out_strides);
    let block = total.div_ceil(exec.workers());
    tracing::trace!(?reduction, axis, axis_len, outputs = total, "reduce");

    let base = x.base_offset() as isize;
    let data = x.data();
    let mut dst = vec![0.0f32; total];
    exec.for_each_partition(&mut dst, block, |i, out| {
        for (k, o) in out.iter_mut().enumerate() {
            let start = (base + offsets[i * block + k]) as usize;
            *o = reduction.reduce_run(StridedSpan::new(data, start, axis_stride), axis_len);
        }
    });
    Ok(NDArray::from_dense(&out_shape, dst))
}

impl NDArray {
    /// Sum of all elements; `0.0` when empty.
    pub fn sum(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        if self.is_dense() {
            let start = self.base_offset();
            return simd::sum_f32(&self.data()[start..start + self.volume()]);
        }
        simd::sum_f32(&self.elements())
    }

    /// Mean of all elements; NaN when empty.
    pub fn mean(&self) -> f32 {
        self.sum() / self.volume() as f32
    }

    pub fn max(&self) -> Result<f32> {
        self.iter().reduce(f32::max).ok_or(NdError::EmptyReduction)
    }

    pub fn min(&self) -> Result<f32> {
        self.iter().reduce(f32::min).ok_or(NdError::EmptyReduction)
    }

    pub fn sum_along(&self, axis: isize) -> Result<NDArray> {
        reduce_along_with(Executor::global(), self, axis, Reduction::Sum)
    }

    pub fn mean_along(&self, axis: isize) -> Result<NDArray> {
        reduce_along_with(Executor::global(), self, axis, Reduction::Mean)
    }

    pub fn max_along(&self, axis: isize) -> Result<NDArray> {
        reduce_along_with(Executor::global(), self, axis, Reduction::Max)
    }

    pub fn min_along(&self, axis: isize) -> Result<NDArray> {
        reduce_along_with(Executor::global(), self, axis, Reduction::Min)
    }

    /// Index of the first maximum along `axis`.
    pub fn argmax_along(&self, axis: isize) -> Result<NDArray> {
        reduce_along_with(Executor::global(), self, axis, Reduction::ArgMax)
    }

    /// Index of the first minimum along `axis`.
    pub fn argmin_along(&self, axis: isize) -> Result<NDArray> {
        reduce_along_with(Executor::global(), self, axis, Reduction::ArgMin)
    }
}
