// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors.

use std::fmt;

/// Declared dimensionality of one model layer.
///
/// Manifests may carry a leading `-1` to mark a free batch dimension;
/// [`Shape::from_declared`] folds it to `1` so that [`Shape::num_elements`]
/// is always the element count of a single sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_codec::Shape;
    /// let s = Shape::new(vec![224, 224, 3]);
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 150_528);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Builds a shape from manifest dimensions.
    ///
    /// `-1` is accepted as a batch placeholder and counts as `1`. Any other
    /// non-positive dimension is rejected, as is a shape whose `f32` buffer
    /// would not fit in `usize`. [`Shape::num_elements`] and
    /// [`Shape::size_bytes`] cannot overflow on the result.
    ///
    /// ```
    /// use tensor_codec::{DeclaredShapeError, Shape};
    /// let s = Shape::from_declared(&[-1, 1001]).unwrap();
    /// assert_eq!(s.num_elements(), 1001);
    /// assert_eq!(Shape::from_declared(&[0, 3]), Err(DeclaredShapeError::BadDimension(0)));
    /// ```
    pub fn from_declared(dims: &[i64]) -> Result<Self, DeclaredShapeError> {
        let mut out = Vec::with_capacity(dims.len());
        for &d in dims {
            match d {
                -1 => out.push(1),
                d if d > 0 => {
                    out.push(usize::try_from(d).map_err(|_| DeclaredShapeError::Overflow)?)
                }
                bad => return Err(DeclaredShapeError::BadDimension(bad)),
            }
        }
        let shape = Self { dims: out };
        shape
            .checked_num_elements()
            .and_then(|n| n.checked_mul(crate::DType::F32.size_bytes()))
            .ok_or(DeclaredShapeError::Overflow)?;
        Ok(shape)
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For an empty shape, returns 1.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the total number of elements, or `None` on overflow.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Drops leading unit dimensions (`[1, 224, 224, 3]` → `[224, 224, 3]`).
    pub fn squeezed_leading(&self) -> Shape {
        let first = self
            .dims
            .iter()
            .position(|&d| d != 1)
            .unwrap_or(self.dims.len().saturating_sub(1));
        Shape::new(self.dims[first..].to_vec())
    }

    /// Computes the buffer footprint in bytes for a given [`crate::DType`].
    pub fn size_bytes(&self, dtype: crate::DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Why a declared manifest shape was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredShapeError {
    /// A dimension other than the `-1` batch marker is not positive.
    BadDimension(i64),
    /// The element count or byte size does not fit in `usize`.
    Overflow,
}

impl fmt::Display for DeclaredShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredShapeError::BadDimension(d) => write!(f, "invalid dimension {d}"),
            DeclaredShapeError::Overflow => write!(f, "shape volume overflows"),
        }
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}
