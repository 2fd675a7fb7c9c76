//! Vector primitives the elementwise engine is built on.
//!
//! A primitive reads `count` elements from one or two [`StridedSpan`]s (and
//! optionally a scalar) and writes `count` results into a destination slice.
//! Any implementation of [`VectorBackend`] can be plugged into an
//! [`Executor`](crate::Executor) without touching the engine.

use crate::simd;

// ============================================================================
// Operations
// ============================================================================

/// Binary elementwise operations.
///
/// `apply(x, y)` keeps operand order: `Sub` is `x - y` and `Div` is `x / y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Max,
    Min,
}

impl BinaryOp {
    #[inline(always)]
    pub fn apply(self, x: f32, y: f32) -> f32 {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
            BinaryOp::Max => x.max(y),
            BinaryOp::Min => x.min(y),
        }
    }
}

/// Unary elementwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Sqrt,
    Exp,
    Log,
    Abs,
    Floor,
    Ceil,
    /// Round half away from zero.
    Round,
}

impl UnaryOp {
    #[inline(always)]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            UnaryOp::Sqrt => x.sqrt(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Log => x.ln(),
            UnaryOp::Abs => x.abs(),
            UnaryOp::Floor => x.floor(),
            UnaryOp::Ceil => x.ceil(),
            UnaryOp::Round => x.round(),
        }
    }
}

// ============================================================================
// Spans
// ============================================================================

/// A run of elements `data[offset + i * stride]` for `i` in `0..count`.
///
/// The count is carried by the destination slice the span is paired with.
#[derive(Debug, Clone, Copy)]
pub struct StridedSpan<'a> {
    pub data: &'a [f32],
    pub offset: usize,
    pub stride: isize,
}

impl<'a> StridedSpan<'a> {
    pub fn new(data: &'a [f32], offset: usize, stride: isize) -> Self {
        Self {
            data,
            offset,
            stride,
        }
    }

    /// The `i`-th element of the run.
    #[inline(always)]
    pub fn get(&self, i: usize) -> f32 {
        self.data[(self.offset as isize + i as isize * self.stride) as usize]
    }

    /// The run as a plain slice when it has unit stride.
    #[inline]
    pub fn contiguous(&self, count: usize) -> Option<&'a [f32]> {
        if self.stride == 1 || count <= 1 {
            self.data.get(self.offset..self.offset + count)
        } else {
            None
        }
    }
}

// ============================================================================
// Backend trait
// ============================================================================

/// The primitive operations required by the engine.
///
/// Every method writes exactly `dst.len()` results. Scalar-first forms exist
/// so that `s - x` and `s / x` keep their operand order; implementations must
/// not rewrite `s / x` through a reciprocal.
pub trait VectorBackend: Send + Sync {
    /// `dst[i] = op(src[i])`
    fn unary(&self, op: UnaryOp, src: StridedSpan<'_>, dst: &mut [f32]);

    /// `dst[i] = op(src[i], scalar)`
    fn binary_vs(&self, op: BinaryOp, src: StridedSpan<'_>, scalar: f32, dst: &mut [f32]);

    /// `dst[i] = op(scalar, src[i])`
    fn binary_sv(&self, op: BinaryOp, scalar: f32, src: StridedSpan<'_>, dst: &mut [f32]);

    /// `dst[i] = op(lhs[i], rhs[i])`
    fn binary_vv(&self, op: BinaryOp, lhs: StridedSpan<'_>, rhs: StridedSpan<'_>, dst: &mut [f32]);
}

/// Scalar loops with a unit-stride fast path.
///
/// Contiguous runs go through runtime SIMD dispatch when the `simd` feature is
/// enabled so the compiler can vectorize them for the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableBackend;

#[inline(always)]
fn map1(src: StridedSpan<'_>, dst: &mut [f32], f: impl Fn(f32) -> f32) {
    let len = dst.len();
    if let Some(src) = src.contiguous(len) {
        simd::vectorized(len, || {
            for (d, &s) in dst.iter_mut().zip(src) {
                *d = f(s);
            }
        });
    } else {
        let mut pos = src.offset as isize;
        for d in dst.iter_mut() {
            *d = f(src.data[pos as usize]);
            pos += src.stride;
        }
    }
}

#[inline(always)]
fn map2(a: StridedSpan<'_>, b: StridedSpan<'_>, dst: &mut [f32], f: impl Fn(f32, f32) -> f32) {
    let len = dst.len();
    if let (Some(a), Some(b)) = (a.contiguous(len), b.contiguous(len)) {
        simd::vectorized(len, || {
            for ((d, &x), &y) in dst.iter_mut().zip(a).zip(b) {
                *d = f(x, y);
            }
        });
    } else {
        let mut pa = a.offset as isize;
        let mut pb = b.offset as isize;
        for d in dst.iter_mut() {
            *d = f(a.data[pa as usize], b.data[pb as usize]);
            pa += a.stride;
            pb += b.stride;
        }
    }
}

impl VectorBackend for PortableBackend {
    fn unary(&self, op: UnaryOp, src: StridedSpan<'_>, dst: &mut [f32]) {
        map1(src, dst, |x| op.apply(x));
    }

    fn binary_vs(&self, op: BinaryOp, src: StridedSpan<'_>, scalar: f32, dst: &mut [f32]) {
        map1(src, dst, |x| op.apply(x, scalar));
    }

    fn binary_sv(&self, op: BinaryOp, scalar: f32, src: StridedSpan<'_>, dst: &mut [f32]) {
        map1(src, dst, |x| op.apply(scalar, x));
    }

    fn binary_vv(&self, op: BinaryOp, lhs: StridedSpan<'_>, rhs: StridedSpan<'_>, dst: &mut [f32]) {
        map2(lhs, rhs, dst, |x, y| op.apply(x, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_order() {
        assert_eq!(BinaryOp::Sub.apply(1.0, 3.0), -2.0);
        assert_eq!(BinaryOp::Div.apply(1.0, 4.0), 0.25);
        assert_eq!(BinaryOp::Max.apply(1.0, 4.0), 4.0);
        assert_eq!(BinaryOp::Min.apply(1.0, 4.0), 1.0);
    }

    #[test]
    fn test_unary_round_half_away_from_zero() {
        assert_eq!(UnaryOp::Round.apply(2.5), 3.0);
        assert_eq!(UnaryOp::Round.apply(-2.5), -3.0);
        assert_eq!(UnaryOp::Floor.apply(-0.5), -1.0);
        assert_eq!(UnaryOp::Ceil.apply(-0.5), -0.0);
    }

    #[test]
    fn test_span_contiguous() {
        let data = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(
            StridedSpan::new(&data, 1, 1).contiguous(3),
            Some(&data[1..4])
        );
        assert_eq!(StridedSpan::new(&data, 0, 2).contiguous(2), None);
        // a single element is contiguous whatever its stride
        assert_eq!(
            StridedSpan::new(&data, 3, 0).contiguous(1),
            Some(&data[3..4])
        );
    }

    #[test]
    fn test_binary_vs_strided() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut dst = [0.0; 3];
        PortableBackend.binary_vs(BinaryOp::Add, StridedSpan::new(&data, 0, 2), 10.0, &mut dst);
        assert_eq!(dst, [11.0, 13.0, 15.0]);
    }

    #[test]
    fn test_binary_sv_keeps_operand_order() {
        let data = [1.0, 2.0, 4.0];
        let mut dst = [0.0; 3];
        PortableBackend.binary_sv(BinaryOp::Div, 1.0, StridedSpan::new(&data, 0, 1), &mut dst);
        assert_eq!(dst, [1.0, 0.5, 0.25]);
        PortableBackend.binary_sv(BinaryOp::Sub, 1.0, StridedSpan::new(&data, 0, 1), &mut dst);
        assert_eq!(dst, [0.0, -1.0, -3.0]);
    }

    #[test]
    fn test_binary_vv_negative_and_zero_stride() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0];
        let mut dst = [0.0; 3];
        PortableBackend.binary_vv(
            BinaryOp::Mul,
            StridedSpan::new(&a, 2, -1),
            StridedSpan::new(&b, 0, 0),
            &mut dst,
        );
        assert_eq!(dst, [30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_unary_contiguous() {
        let data: Vec<f32> = (0..100).map(|i| (i * i) as f32).collect();
        let mut dst = vec![0.0; 100];
        PortableBackend.unary(UnaryOp::Sqrt, StridedSpan::new(&data, 0, 1), &mut dst);
        for (i, &v) in dst.iter().enumerate() {
            assert_eq!(v, i as f32);
        }
    }
}
