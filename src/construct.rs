//! Constructors.

use crate::array::NDArray;
use crate::layout::checked_volume;
use crate::{NdError, Result};

impl NDArray {
    /// Wrap `elements` (row-major) in an array of `shape`.
    ///
    /// # Errors
    /// [`NdError::ElementCountMismatch`] if `elements.len()` differs from the
    /// product of `shape`. A product that overflows is reported with
    /// `expected: usize::MAX`.
    pub fn new(shape: &[usize], elements: Vec<f32>) -> Result<NDArray> {
        let expected = checked_volume(shape).unwrap_or(usize::MAX);
        if expected != elements.len() {
            return Err(NdError::ElementCountMismatch {
                expected,
                actual: elements.len(),
            });
        }
        Ok(NDArray::from_dense(shape, elements))
    }

    /// A one-dimensional array.
    pub fn from_vec(elements: Vec<f32>) -> NDArray {
        let len = elements.len();
        NDArray::from_dense(&[len], elements)
    }

    /// A rank-0 array holding `value`.
    pub fn scalar(value: f32) -> NDArray {
        NDArray::from_dense(&[], vec![value])
    }

    pub fn zeros(shape: &[usize]) -> NDArray {
        Self::filled(shape, 0.0)
    }

    pub fn ones(shape: &[usize]) -> NDArray {
        Self::filled(shape, 1.0)
    }

    /// An array of `shape` with every element set to `value`.
    pub fn filled(shape: &[usize], value: f32) -> NDArray {
        let len = shape.iter().product();
        NDArray::from_dense(shape, vec![value; len])
    }

    /// `[0, 1, ..., n - 1]`
    pub fn range(n: usize) -> NDArray {
        (0..n).map(|i| i as f32).collect()
    }

    /// `start, start + step, ...` up to but excluding `end`.
    ///
    /// A zero step, or a step pointing away from `end`, gives an empty array.
    pub fn arange(start: f32, end: f32, step: f32) -> NDArray {
        let span = (end as f64 - start as f64) / step as f64;
        let len = if span.is_finite() && span > 0.0 {
            span.ceil() as usize
        } else {
            0
        };
        (0..len)
            .map(|i| (start as f64 + i as f64 * step as f64) as f32)
            .collect()
    }

    /// A matrix from equal-length rows.
    ///
    /// # Errors
    /// [`NdError::JaggedLiteral`] if the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<NDArray> {
        let cols = rows.first().map_or(0, |r| r.len());
        check_lengths(rows.iter().map(|r| r.len()), cols, 1)?;
        let shape = [rows.len(), cols];
        Ok(NDArray::from_dense(&shape, rows.concat()))
    }

    /// A rank-3 array from equal-shaped matrices.
    ///
    /// # Errors
    /// [`NdError::JaggedLiteral`] if the matrices or their rows differ in length.
    pub fn from_matrices(matrices: Vec<Vec<Vec<f32>>>) -> Result<NDArray> {
        let rows = matrices.first().map_or(0, |m| m.len());
        check_lengths(matrices.iter().map(|m| m.len()), rows, 1)?;
        let cols = matrices
            .first()
            .and_then(|m| m.first())
            .map_or(0, |r| r.len());
        check_lengths(matrices.iter().flatten().map(|r| r.len()), cols, 2)?;

        let shape = [matrices.len(), rows, cols];
        let elements: Vec<f32> = matrices.into_iter().flatten().flatten().collect();
        Ok(NDArray::from_dense(&shape, elements))
    }

    /// Join equal-shaped arrays along a new leading axis.
    ///
    /// # Errors
    /// - [`NdError::ShapeMismatch`] if the shapes differ
    /// - [`NdError::ElementCountMismatch`] if `arrays` is empty
    pub fn stack(arrays: &[NDArray]) -> Result<NDArray> {
        let first = arrays.first().ok_or(NdError::ElementCountMismatch {
            expected: 1,
            actual: 0,
        })?;
        let mut elements = Vec::with_capacity(first.volume() * arrays.len());
        for a in arrays {
            if a.shape() != first.shape() {
                return Err(NdError::ShapeMismatch(
                    first.shape().to_vec(),
                    a.shape().to_vec(),
                ));
            }
            elements.extend(a.iter());
        }
        let mut shape = Vec::with_capacity(first.ndim() + 1);
        shape.push(arrays.len());
        shape.extend_from_slice(first.shape());
        Ok(NDArray::from_dense(&shape, elements))
    }
}

fn check_lengths(lengths: impl Iterator<Item = usize>, expected: usize, depth: usize) -> Result<()> {
    for actual in lengths {
        if actual != expected {
            return Err(NdError::JaggedLiteral {
                depth,
                expected,
                actual,
            });
        }
    }
    Ok(())
}

impl From<Vec<f32>> for NDArray {
    fn from(elements: Vec<f32>) -> Self {
        NDArray::from_vec(elements)
    }
}

impl FromIterator<f32> for NDArray {
    fn from_iter<I: IntoIterator<Item = f32>>(iter: I) -> Self {
        NDArray::from_vec(iter.into_iter().collect())
    }
}
