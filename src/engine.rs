//! Elementwise apply engine.
//!
//! Every elementwise operation ends here. Inputs (already broadcast to one
//! shape) are split into a "major" prefix of dimensions walked through an
//! offset table and a contiguous "minor" block handed to one backend
//! primitive call per major offset.
//!
//! Work is split into `W` contiguous ranges, `W` being the executor's worker
//! budget. Range `i` writes the destination starting at a position computed
//! from `i` alone, so ranges never overlap and the output is identical for
//! every `W`.

use smallvec::SmallVec;

use crate::array::NDArray;
use crate::backend::{BinaryOp, StridedSpan, UnaryOp};
use crate::broadcast::broadcast;
use crate::layout::{get_offsets, strided_dims};
use crate::threading::Executor;
use crate::Result;

type Spans<'a> = SmallVec<[StridedSpan<'a>; 2]>;

// ============================================================================
// Public entry points
// ============================================================================

/// `op(x)` for every element of `x`.
pub fn apply_unary(exec: &Executor, op: UnaryOp, x: &NDArray) -> NDArray {
    let backend = exec.backend();
    run(exec, x.shape(), &[x], |spans, dst| backend.unary(op, spans[0], dst))
}

/// `op(x, scalar)` for every element of `x`.
///
/// The scalar is passed to each primitive call; no broadcast buffer is built.
pub fn apply_vs(exec: &Executor, op: BinaryOp, x: &NDArray, scalar: f32) -> NDArray {
    let backend = exec.backend();
    run(exec, x.shape(), &[x], |spans, dst| {
        backend.binary_vs(op, spans[0], scalar, dst)
    })
}

/// `op(scalar, x)` for every element of `x`, keeping the scalar on the left.
pub fn apply_sv(exec: &Executor, op: BinaryOp, scalar: f32, x: &NDArray) -> NDArray {
    let backend = exec.backend();
    run(exec, x.shape(), &[x], |spans, dst| {
        backend.binary_sv(op, scalar, spans[0], dst)
    })
}

/// `op(a, b)` elementwise after broadcasting `a` and `b` together.
///
/// # Errors
/// [`NdError::ShapeBroadcast`](crate::NdError::ShapeBroadcast) if the shapes
/// are incompatible. Nothing is computed in that case.
pub fn apply_vv(exec: &Executor, op: BinaryOp, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    let (a, b) = broadcast(a, b)?;
    let backend = exec.backend();
    Ok(run(exec, a.shape(), &[&a, &b], |spans, dst| {
        backend.binary_vv(op, spans[0], spans[1], dst)
    }))
}

// ============================================================================
// Plan
// ============================================================================

/// Major/minor split shared by every input of one call.
struct ApplyPlan {
    /// Number of elements per primitive call.
    count: usize,
    /// Per-input stride inside the minor block.
    minor_strides: SmallVec<[isize; 2]>,
    /// Per-input offsets (relative to the base offset) of each major index.
    major_offsets: SmallVec<[Vec<isize>; 2]>,
}

impl ApplyPlan {
    /// Split at the shortest contiguous suffix across `inputs`.
    ///
    /// When no input has a contiguous suffix the last dimension is used as
    /// the minor block with each input's own stride.
    fn new(shape: &[usize], inputs: &[&NDArray]) -> Self {
        let rank = shape.len();
        let depth = inputs
            .iter()
            .map(|x| strided_dims(x.shape(), x.strides()))
            .min()
            .unwrap_or(rank);
        let fixed_stride = depth == 0;
        let split = rank - depth.max(1).min(rank);

        let count = shape[split..].iter().product();
        let minor_strides = inputs
            .iter()
            .map(|x| {
                if fixed_stride {
                    x.strides().last().copied().unwrap_or(1)
                } else {
                    1
                }
            })
            .collect();
        let major_offsets = inputs
            .iter()
            .map(|x| get_offsets(&shape[..split], &x.strides()[..split]))
            .collect();
        Self {
            count,
            minor_strides,
            major_offsets,
        }
    }

    fn total(&self) -> usize {
        self.major_offsets.first().map_or(0, |o| o.len())
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Evaluate `kernel` over `inputs` into a fresh dense array of `shape`.
///
/// Every input must already have `shape`. `kernel` receives one span per
/// input and a destination run of the same length.
fn run<K>(exec: &Executor, shape: &[usize], inputs: &[&NDArray], kernel: K) -> NDArray
where
    K: Fn(&[StridedSpan<'_>], &mut [f32]) + Send + Sync,
{
    debug_assert!(inputs.iter().all(|x| x.shape() == shape));
    let volume: usize = shape.iter().product();
    if volume == 0 {
        tracing::trace!(path = "empty", ?shape, "apply");
        return NDArray::from_dense(shape, Vec::new());
    }

    let workers = exec.workers();
    let mut dst = vec![0.0f32; volume];

    if inputs.iter().all(|x| x.is_dense()) {
        // Dense fast path: one linear extent per worker
        let block = volume.div_ceil(workers);
        tracing::trace!(path = "dense", volume, workers, block, "apply");
        exec.for_each_partition(&mut dst, block, |i, out| {
            let start = i * block;
            let spans: Spans<'_> = inputs
                .iter()
                .map(|x| StridedSpan::new(x.data(), x.base_offset() + start, 1))
                .collect();
            kernel(&spans[..], out);
        });
        return NDArray::from_dense(shape, dst);
    }

    let plan = ApplyPlan::new(shape, inputs);
    let count = plan.count;
    let total = plan.total();
    let block = total.div_ceil(workers);
    tracing::trace!(
        path = "strided",
        volume,
        workers,
        count,
        major = total,
        "apply"
    );
    exec.for_each_partition(&mut dst, block * count, |i, out| {
        for (k, segment) in out.chunks_mut(count).enumerate() {
            let j = i * block + k;
            let spans: Spans<'_> = inputs
                .iter()
                .enumerate()
                .map(|(n, x)| {
                    let offset = x.base_offset() as isize + plan.major_offsets[n][j];
                    StridedSpan::new(x.data(), offset as usize, plan.minor_strides[n])
                })
                .collect();
            kernel(&spans[..], segment);
        }
    });
    NDArray::from_dense(shape, dst)
}
