//! Array layout: shapes, element ordering, and stride arithmetic.

use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Dimensions of an array.
///
/// Uses `SmallVec<[usize; 4]>` to avoid heap allocation for arrays of up
/// to 4 dimensions. Higher ranks spill to the heap transparently.
pub type Shape = SmallVec<[usize; 4]>;

/// Physical element ordering of a dense array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ArrayOrder {
    /// Last dimension varies fastest (`'c'`).
    #[default]
    RowMajor,
    /// First dimension varies fastest (`'f'`).
    ColumnMajor,
}

impl ArrayOrder {
    /// The conventional single-character tag.
    pub fn as_char(self) -> char {
        match self {
            Self::RowMajor => 'c',
            Self::ColumnMajor => 'f',
        }
    }
}

impl TryFrom<char> for ArrayOrder {
    type Error = char;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'c' | 'C' => Ok(Self::RowMajor),
            'f' | 'F' => Ok(Self::ColumnMajor),
            other => Err(other),
        }
    }
}

impl fmt::Display for ArrayOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Number of elements in an array of the given shape.
///
/// An empty shape is a scalar (one element). Returns `None` on overflow.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Element strides for `shape` laid out in `order`.
pub fn strides(shape: &[usize], order: ArrayOrder) -> SmallVec<[usize; 4]> {
    let mut out: SmallVec<[usize; 4]> = smallvec![0; shape.len()];
    let mut acc = 1usize;
    match order {
        ArrayOrder::RowMajor => {
            for axis in (0..shape.len()).rev() {
                out[axis] = acc;
                acc = acc.saturating_mul(shape[axis]);
            }
        }
        ArrayOrder::ColumnMajor => {
            for axis in 0..shape.len() {
                out[axis] = acc;
                acc = acc.saturating_mul(shape[axis]);
            }
        }
    }
    out
}

/// Copy `src` (laid out in `from`) into `dst` (laid out in `to`),
/// preserving logical content.
///
/// # Panics
///
/// Panics if `src` and `dst` differ in length, or if their length does not
/// match `shape`.
pub fn reorder(src: &[f32], shape: &[usize], from: ArrayOrder, to: ArrayOrder, dst: &mut [f32]) {
    assert_eq!(src.len(), dst.len(), "reorder length mismatch");
    assert_eq!(
        element_count(shape),
        Some(src.len()),
        "reorder buffer does not match shape"
    );
    if from == to || shape.iter().filter(|&&d| d > 1).count() < 2 {
        dst.copy_from_slice(src);
        return;
    }

    let src_strides = strides(shape, from);
    let dst_strides = strides(shape, to);
    let mut index: SmallVec<[usize; 4]> = smallvec![0; shape.len()];
    for _ in 0..src.len() {
        let s: usize = index.iter().zip(&src_strides).map(|(i, st)| i * st).sum();
        let d: usize = index.iter().zip(&dst_strides).map(|(i, st)| i * st).sum();
        dst[d] = src[s];
        // Advance the logical index, last axis fastest.
        for axis in (0..shape.len()).rev() {
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}
