//! NumPy-style `f32` n-dimensional arrays built on strided views.
//!
//! An [`NDArray`] is a shape/stride/offset descriptor over a shared,
//! reference-counted buffer. Reshape, transpose and slicing only rewrite the
//! descriptor; arithmetic always produces a fresh dense array.
//!
//! # Core Types
//!
//! - [`NDArray`]: the array descriptor (shape, strides, base offset, shared data)
//! - [`Executor`]: the worker budget used by the elementwise engine
//! - [`VectorBackend`]: the primitive vector operations the engine is built on
//!
//! # Layout Utilities
//!
//! - [`contiguous_strides`], [`is_dense`], [`strided_dims`], [`get_offsets`]
//!
//! # Broadcasting
//!
//! - [`broadcast`]: align two arrays to a common iteration shape (0-strides, no copies)
//! - [`broadcast_shape`]: the resulting shape only
//!
//! # Elementwise Engine
//!
//! - [`apply_unary`], [`apply_vs`], [`apply_sv`], [`apply_vv`]
//!
//! # Example
//!
//! ```rust
//! use strided_ndarray::{Executor, NDArray};
//!
//! let a = NDArray::range(8).reshaped(&[2, 2, 2]).unwrap();
//! let b = NDArray::range(4).reshaped(&[2, 2]).unwrap();
//!
//! let c = a.add(&b).unwrap();
//! assert_eq!(c.elements(), vec![0.0, 2.0, 4.0, 6.0, 4.0, 6.0, 8.0, 10.0]);
//!
//! // Same result with an explicit single worker.
//! let serial = Executor::new(1).unwrap();
//! let d = strided_ndarray::ops::add_with(&serial, &a, &b).unwrap();
//! assert_eq!(c, d);
//! ```
//!
//! # Parallelism
//!
//! The strided path splits the list of outer ("major") offsets into `W`
//! contiguous ranges. Range `i` writes the destination starting at
//! `i * block_size * count`, so workers never overlap and the result does not
//! depend on `W`.

mod array;
pub mod backend;
pub mod broadcast;
mod construct;
pub mod engine;
mod gather;
pub mod layout;
pub mod ops;
pub mod reduce;
mod simd;
mod threading;
pub mod view;

// ============================================================================
// Descriptor and views
// ============================================================================
pub use array::NDArray;
pub use gather::{gather_elements, ElementIter};
pub use view::AxisIndex;

// ============================================================================
// Layout utilities
// ============================================================================
pub use layout::{contiguous_strides, get_offsets, is_dense, strided_dims};

// ============================================================================
// Broadcasting
// ============================================================================
pub use broadcast::{broadcast, broadcast_shape};

// ============================================================================
// Engine
// ============================================================================
pub use backend::{BinaryOp, PortableBackend, StridedSpan, UnaryOp, VectorBackend};
pub use engine::{apply_sv, apply_unary, apply_vs, apply_vv};
pub use reduce::Reduction;
pub use threading::Executor;

// ============================================================================
// Constants
// ============================================================================

/// Minimum number of output elements before work is handed to the pool.
///
/// Smaller calls run their partitions in order on the calling thread.
pub const MIN_PARALLEL_LEN: usize = 1 << 15;

/// Environment variable read by [`Executor::from_env`].
pub const WORKERS_ENV: &str = "STRIDED_NDARRAY_WORKERS";

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur while building or operating on arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NdError {
    /// A target shape contains an invalid negative dimension.
    #[error("invalid shape {0:?}")]
    InvalidShape(Vec<isize>),

    /// The number of elements does not match the product of the shape.
    #[error("element count mismatch: shape needs {expected}, got {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// An index has a different length than the array rank.
    #[error("index rank mismatch: expected {expected}, got {actual}")]
    IndexRankMismatch { expected: usize, actual: usize },

    /// An index is outside its dimension.
    #[error("index {index} out of bounds for axis {axis} with size {size}")]
    IndexOutOfBounds {
        axis: usize,
        index: isize,
        size: usize,
    },

    /// Two shapes cannot be broadcast together.
    #[error("shapes {0:?} and {1:?} cannot be broadcast together")]
    ShapeBroadcast(Vec<usize>, Vec<usize>),

    /// A nested literal has rows of unequal length.
    #[error("jagged literal at depth {depth}: expected length {expected}, got {actual}")]
    JaggedLiteral {
        depth: usize,
        expected: usize,
        actual: usize,
    },

    /// A slice was given a step of zero.
    #[error("slice step cannot be zero")]
    ZeroSliceStep,

    /// Invalid axis index for the given array rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: isize, rank: usize },

    /// Stride array length doesn't match dims.
    #[error("stride and shape length mismatch")]
    StrideLengthMismatch,

    /// A descriptor would address memory outside its buffer.
    #[error("descriptor addresses outside its buffer")]
    OffsetOutOfBounds,

    /// Arrays that must share a shape do not.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// max/min/argmax/argmin over zero elements.
    #[error("reduction over an empty run has no identity")]
    EmptyReduction,

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Result type for array operations.
pub type Result<T> = std::result::Result<T, NdError>;
