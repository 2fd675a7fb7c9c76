//! Arithmetic, clip and elementwise math.
//!
//! Every operation comes in two forms: a free `*_with` function taking an
//! explicit [`Executor`], and an [`NDArray`] method that runs on
//! [`Executor::global`]. Both always return a fresh dense array.
//!
//! Operand order is part of each operation's identity: `sub_scalar` is
//! `x - s`, `scalar_sub` is `s - x`, and likewise for division.

use crate::array::NDArray;
use crate::backend::{BinaryOp, UnaryOp};
use crate::engine::{apply_sv, apply_unary, apply_vs, apply_vv};
use crate::threading::Executor;
use crate::Result;

// ============================================================================
// Negation
// ============================================================================

/// `-x`, computed as a scale by `-1`.
///
/// Non-dense inputs are gathered first so the scale always runs as a single
/// contiguous pass.
pub fn neg_with(exec: &Executor, x: &NDArray) -> NDArray {
    if x.is_dense() {
        apply_vs(exec, BinaryOp::Mul, x, -1.0)
    } else {
        let gathered = NDArray::from_dense(x.shape(), x.elements());
        apply_vs(exec, BinaryOp::Mul, &gathered, -1.0)
    }
}

// ============================================================================
// Array-array
// ============================================================================

/// `a + b` with broadcasting.
pub fn add_with(exec: &Executor, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    apply_vv(exec, BinaryOp::Add, a, b)
}

/// `a - b` with broadcasting.
pub fn sub_with(exec: &Executor, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    apply_vv(exec, BinaryOp::Sub, a, b)
}

/// `a * b` with broadcasting.
pub fn mul_with(exec: &Executor, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    apply_vv(exec, BinaryOp::Mul, a, b)
}

/// `a / b` with broadcasting.
pub fn div_with(exec: &Executor, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    apply_vv(exec, BinaryOp::Div, a, b)
}

/// Elementwise maximum with broadcasting.
pub fn maximum_with(exec: &Executor, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    apply_vv(exec, BinaryOp::Max, a, b)
}

/// Elementwise minimum with broadcasting.
pub fn minimum_with(exec: &Executor, a: &NDArray, b: &NDArray) -> Result<NDArray> {
    apply_vv(exec, BinaryOp::Min, a, b)
}

// ============================================================================
// Array-scalar and scalar-array
// ============================================================================

pub fn add_scalar_with(exec: &Executor, x: &NDArray, s: f32) -> NDArray {
    apply_vs(exec, BinaryOp::Add, x, s)
}

pub fn sub_scalar_with(exec: &Executor, x: &NDArray, s: f32) -> NDArray {
    apply_vs(exec, BinaryOp::Sub, x, s)
}

pub fn mul_scalar_with(exec: &Executor, x: &NDArray, s: f32) -> NDArray {
    apply_vs(exec, BinaryOp::Mul, x, s)
}

/// `x / s`, dividing every element (no reciprocal is formed).
pub fn div_scalar_with(exec: &Executor, x: &NDArray, s: f32) -> NDArray {
    apply_vs(exec, BinaryOp::Div, x, s)
}

pub fn scalar_add_with(exec: &Executor, s: f32, x: &NDArray) -> NDArray {
    apply_sv(exec, BinaryOp::Add, s, x)
}

/// `s - x`, computed as `-x + s`.
pub fn scalar_sub_with(exec: &Executor, s: f32, x: &NDArray) -> NDArray {
    let negated = neg_with(exec, x);
    apply_vs(exec, BinaryOp::Add, &negated, s)
}

pub fn scalar_mul_with(exec: &Executor, s: f32, x: &NDArray) -> NDArray {
    apply_sv(exec, BinaryOp::Mul, s, x)
}

/// `s / x` through the scalar-first divide primitive.
pub fn scalar_div_with(exec: &Executor, s: f32, x: &NDArray) -> NDArray {
    apply_sv(exec, BinaryOp::Div, s, x)
}

// ============================================================================
// Clip
// ============================================================================

/// `max(x, low)` elementwise.
pub fn clip_low_with(exec: &Executor, x: &NDArray, low: f32) -> NDArray {
    apply_vs(exec, BinaryOp::Max, x, low)
}

/// `min(x, high)` elementwise.
pub fn clip_high_with(exec: &Executor, x: &NDArray, high: f32) -> NDArray {
    apply_vs(exec, BinaryOp::Min, x, high)
}

/// Clamp into `[low, high]` as two passes, lower bound first.
///
/// With `low > high` every element becomes `high`.
pub fn clip_with(exec: &Executor, x: &NDArray, low: f32, high: f32) -> NDArray {
    let lower = clip_low_with(exec, x, low);
    clip_high_with(exec, &lower, high)
}

// ============================================================================
// Method forms
// ============================================================================

macro_rules! unary_methods {
    ($($(#[$doc:meta])* $name:ident => $op:expr;)*) => {
        impl NDArray {
            $(
                $(#[$doc])*
                pub fn $name(&self) -> NDArray {
                    apply_unary(Executor::global(), $op, self)
                }
            )*
        }
    };
}

unary_methods! {
    /// Elementwise square root.
    sqrt => UnaryOp::Sqrt;
    /// Elementwise `e^x`.
    exp => UnaryOp::Exp;
    /// Elementwise natural logarithm.
    log => UnaryOp::Log;
    /// Elementwise absolute value.
    abs => UnaryOp::Abs;
    floor => UnaryOp::Floor;
    ceil => UnaryOp::Ceil;
    /// Round half away from zero.
    round => UnaryOp::Round;
}

#[allow(clippy::should_implement_trait)]
impl NDArray {
    pub fn neg(&self) -> NDArray {
        neg_with(Executor::global(), self)
    }

    pub fn add(&self, other: &NDArray) -> Result<NDArray> {
        add_with(Executor::global(), self, other)
    }

    pub fn sub(&self, other: &NDArray) -> Result<NDArray> {
        sub_with(Executor::global(), self, other)
    }

    pub fn mul(&self, other: &NDArray) -> Result<NDArray> {
        mul_with(Executor::global(), self, other)
    }

    pub fn div(&self, other: &NDArray) -> Result<NDArray> {
        div_with(Executor::global(), self, other)
    }

    pub fn maximum(&self, other: &NDArray) -> Result<NDArray> {
        maximum_with(Executor::global(), self, other)
    }

    pub fn minimum(&self, other: &NDArray) -> Result<NDArray> {
        minimum_with(Executor::global(), self, other)
    }

    /// `self + s`
    pub fn add_scalar(&self, s: f32) -> NDArray {
        add_scalar_with(Executor::global(), self, s)
    }

    /// `self - s`
    pub fn sub_scalar(&self, s: f32) -> NDArray {
        sub_scalar_with(Executor::global(), self, s)
    }

    /// `self * s`
    pub fn mul_scalar(&self, s: f32) -> NDArray {
        mul_scalar_with(Executor::global(), self, s)
    }

    /// `self / s`
    pub fn div_scalar(&self, s: f32) -> NDArray {
        div_scalar_with(Executor::global(), self, s)
    }

    /// `s + self`
    pub fn scalar_add(&self, s: f32) -> NDArray {
        scalar_add_with(Executor::global(), s, self)
    }

    /// `s - self`
    pub fn scalar_sub(&self, s: f32) -> NDArray {
        scalar_sub_with(Executor::global(), s, self)
    }

    /// `s * self`
    pub fn scalar_mul(&self, s: f32) -> NDArray {
        scalar_mul_with(Executor::global(), s, self)
    }

    /// `s / self`
    pub fn scalar_div(&self, s: f32) -> NDArray {
        scalar_div_with(Executor::global(), s, self)
    }

    pub fn clip_low(&self, low: f32) -> NDArray {
        clip_low_with(Executor::global(), self, low)
    }

    pub fn clip_high(&self, high: f32) -> NDArray {
        clip_high_with(Executor::global(), self, high)
    }

    pub fn clip(&self, low: f32, high: f32) -> NDArray {
        clip_with(Executor::global(), self, low, high)
    }
}
