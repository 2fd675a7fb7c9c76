//! Runtime SIMD dispatch for contiguous runs.
//!
//! With the `simd` feature, loops over unit-stride runs execute inside
//! [`pulp::Arch::dispatch`] so the compiler can target the host's vector
//! extensions. Without it they run unchanged.

/// Runs shorter than this skip runtime dispatch.
#[cfg(feature = "simd")]
const DISPATCH_MIN_LEN: usize = 64;

/// Run `body` under runtime dispatch when the run has `len >= 64` elements.
#[inline(always)]
pub(crate) fn vectorized<R>(len: usize, body: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        if len >= DISPATCH_MIN_LEN {
            return pulp::Arch::new().dispatch(body);
        }
    }
    #[cfg(not(feature = "simd"))]
    let _ = len;
    body()
}

/// Sum of a contiguous run.
#[cfg(not(feature = "simd"))]
pub(crate) fn sum_f32(run: &[f32]) -> f32 {
    run.iter().sum()
}

/// Sum of a contiguous run, accumulated in four vector lanes.
///
/// The accumulation order depends only on the run, so equal runs always
/// produce equal sums.
#[cfg(feature = "simd")]
pub(crate) fn sum_f32(run: &[f32]) -> f32 {
    use pulp::{Simd, WithSimd};

    struct Total<'a>(&'a [f32]);

    impl WithSimd for Total<'_> {
        type Output = f32;

        #[inline(always)]
        fn with_simd<S: Simd>(self, simd: S) -> f32 {
            let (vectors, rest) = S::as_simd_f32s(self.0);
            let mut lanes = [simd.splat_f32s(0.0); 4];
            let mut blocks = vectors.chunks_exact(4);
            for block in &mut blocks {
                for (lane, &v) in lanes.iter_mut().zip(block) {
                    *lane = simd.add_f32s(*lane, v);
                }
            }
            for &v in blocks.remainder() {
                lanes[0] = simd.add_f32s(lanes[0], v);
            }
            let folded = simd.add_f32s(
                simd.add_f32s(lanes[0], lanes[1]),
                simd.add_f32s(lanes[2], lanes[3]),
            );
            simd.reduce_sum_f32s(folded) + rest.iter().sum::<f32>()
        }
    }

    if run.len() < DISPATCH_MIN_LEN {
        return run.iter().sum();
    }
    pulp::Arch::new().dispatch(Total(run))
}
