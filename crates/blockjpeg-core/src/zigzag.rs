//! Zigzag scan order for 8×8 coefficient blocks.
//!
//! The forward scan walks the 15 anti-diagonals from the top-left corner to
//! the bottom-right one, alternating direction on every diagonal:
//!
//! ```text
//!  0  1  5  6 14 15 27 28
//!  2  4  7 13 16 26 29 42
//!  3  8 12 17 25 30 41 43
//!  ...
//! ```
//!
//! Low frequencies come first, so the quantized high frequencies (mostly
//! zero) collapse into one long trailing run for the entropy coder.

use crate::error::{CodecError, Result};
use crate::grid::{Block, Grid, BLOCK_LEN, PATCH_SIZE};

/// Maps a natural row-major index (`row * 8 + col`) to its zigzag position.
///
/// This is the inverse of the anti-diagonal walk in [`zigzag`].
pub const ZIGZAG_INDEX: [usize; BLOCK_LEN] = [
     0,  1,  5,  6, 14, 15, 27, 28,
     2,  4,  7, 13, 16, 26, 29, 42,
     3,  8, 12, 17, 25, 30, 41, 43,
     9, 11, 18, 24, 31, 40, 44, 53,
    10, 19, 23, 32, 39, 45, 52, 54,
    20, 22, 33, 38, 46, 51, 55, 60,
    21, 34, 37, 47, 50, 56, 59, 61,
    35, 36, 48, 49, 57, 58, 62, 63,
];

/// Reorder a block into zigzag order.
pub fn zigzag<T: Copy>(block: &Block<T>) -> [T; BLOCK_LEN] {
    let mut out = [block[0][0]; BLOCK_LEN];
    let mut i = 0;
    for diagonal in 0..(2 * PATCH_SIZE - 1) {
        let first = diagonal.saturating_sub(PATCH_SIZE - 1);
        let last = diagonal.min(PATCH_SIZE - 1);
        // Odd diagonals run down-left, even ones up-right
        if diagonal % 2 == 1 {
            for row in first..=last {
                out[i] = block[row][diagonal - row];
                i += 1;
            }
        } else {
            for row in (first..=last).rev() {
                out[i] = block[row][diagonal - row];
                i += 1;
            }
        }
    }
    out
}

/// Reorder an 8×8 grid into zigzag order.
///
/// Returns a shape error unless the grid is exactly 8×8.
pub fn zigzag_grid<T: Copy + Default>(grid: &Grid<T>) -> Result<[T; BLOCK_LEN]> {
    Ok(zigzag(&grid.to_block()?))
}

/// Restore the 8×8 layout of a zigzag-ordered vector.
///
/// Returns a length error unless `vector` has exactly 64 elements.
pub fn inverse_zigzag<T: Copy>(vector: &[T]) -> Result<Block<T>> {
    if vector.len() != BLOCK_LEN {
        return Err(CodecError::Length {
            expected: BLOCK_LEN,
            actual: vector.len(),
        });
    }
    Ok(std::array::from_fn(|row| {
        std::array::from_fn(|col| vector[ZIGZAG_INDEX[row * PATCH_SIZE + col]])
    }))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: The inverse scan undoes the forward scan.
        #[test]
        fn prop_inverse_zigzag_law(values in prop::collection::vec(any::<i32>(), 64)) {
            let block: Block<i32> = std::array::from_fn(|row| {
                std::array::from_fn(|col| values[row * 8 + col])
            });
            prop_assert_eq!(inverse_zigzag(&zigzag(&block)).unwrap(), block);
        }
    }
}
