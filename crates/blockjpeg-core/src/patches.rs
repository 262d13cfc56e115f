//! Splitting grids into square patches and putting them back together.
//!
//! Patches are enumerated in row-major block order: every patch of the first
//! block row from left to right, then the second block row, and so on. The
//! bitstream stores blocks in exactly this order without indices, so
//! [`generate_patches`] and [`assemble_patches`] must agree on it.

use crate::error::{CodecError, Result};
use crate::grid::Grid;

/// Lazy iterator over the patches of a grid.
///
/// Created by [`generate_patches`]. The grid is only borrowed, so calling
/// `generate_patches` again restarts the enumeration.
#[derive(Debug, Clone)]
pub struct Patches<'a, T> {
    grid: &'a Grid<T>,
    patch_size: usize,
    y: usize,
    x: usize,
}

/// Enumerate the non-overlapping `patch_size`×`patch_size` patches of `grid`.
///
/// Dimensions are not required to be multiples of `patch_size`: patches on
/// the bottom and right edges are truncated to whatever remains. Callers that
/// need full patches validate the grid first. A zero `patch_size` is a shape
/// error.
pub fn generate_patches<T: Clone>(grid: &Grid<T>, patch_size: usize) -> Result<Patches<'_, T>> {
    if patch_size == 0 {
        return Err(CodecError::shape(
            "patch size must be positive",
            grid.height(),
            grid.width(),
        ));
    }
    Ok(Patches {
        grid,
        patch_size,
        y: 0,
        x: 0,
    })
}

impl<T: Clone> Iterator for Patches<'_, T> {
    type Item = Grid<T>;

    fn next(&mut self) -> Option<Grid<T>> {
        if self.y >= self.grid.height() || self.grid.width() == 0 {
            return None;
        }
        let patch = self
            .grid
            .region(self.y, self.x, self.patch_size, self.patch_size);

        self.x += self.patch_size;
        if self.x >= self.grid.width() {
            self.x = 0;
            self.y += self.patch_size;
        }
        Some(patch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.y >= self.grid.height() || self.grid.width() == 0 {
            0
        } else {
            let per_row = self.grid.width().div_ceil(self.patch_size);
            let rows_left = (self.grid.height() - self.y).div_ceil(self.patch_size);
            rows_left * per_row - self.x / self.patch_size
        };
        (remaining, Some(remaining))
    }
}

impl<T: Clone> ExactSizeIterator for Patches<'_, T> {}

/// Reassemble full-size patches, given in row-major block order, into a
/// `height`×`width` raster.
///
/// Returns a shape error when the dimensions are not multiples of
/// `patch_size`, when the number of patches does not tile the raster, or when
/// a patch has the wrong size.
pub fn assemble_patches<T: Clone + Default>(
    patches: &[Grid<T>],
    height: usize,
    width: usize,
    patch_size: usize,
) -> Result<Grid<T>> {
    if patch_size == 0 || height % patch_size != 0 || width % patch_size != 0 {
        return Err(CodecError::shape(
            format!("raster must tile into {patch_size}x{patch_size} patches"),
            height,
            width,
        ));
    }
    let per_row = width / patch_size;
    let expected = (height / patch_size) * per_row;
    if patches.len() != expected {
        return Err(CodecError::shape(
            format!("{} patches cannot fill a raster of {expected}", patches.len()),
            height,
            width,
        ));
    }

    let mut data = vec![T::default(); height * width];
    for (index, patch) in patches.iter().enumerate() {
        if patch.dimensions() != (patch_size, patch_size) {
            return Err(CodecError::shape(
                format!("patch {index} is not {patch_size}x{patch_size}"),
                patch.height(),
                patch.width(),
            ));
        }
        let top = (index / per_row) * patch_size;
        let left = (index % per_row) * patch_size;
        for (dy, row) in patch.rows().enumerate() {
            let start = (top + dy) * width + left;
            data[start..start + patch_size].clone_from_slice(row);
        }
    }
    Grid::from_vec(height, width, data)
}

/// Map `f` over per-patch work items, keeping the results in input order.
///
/// With the `parallel` feature the items are processed on the rayon pool.
pub(crate) fn map_in_order<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(height: usize, width: usize) -> Grid<i32> {
        Grid::from_fn(height, width, |y, x| (y * width + x) as i32)
    }

    #[test]
    fn test_row_major_order() {
        let grid = numbered(16, 24);
        let patches: Vec<_> = generate_patches(&grid, 8).unwrap().collect();
        assert_eq!(patches.len(), 6);

        // Top-left corner of each patch identifies its position
        let corners: Vec<i32> = patches.iter().map(|p| p[(0, 0)]).collect();
        assert_eq!(corners, vec![0, 8, 16, 192, 200, 208]);
        assert!(patches.iter().all(|p| p.dimensions() == (8, 8)));
    }

    #[test]
    fn test_restartable() {
        let grid = numbered(8, 16);
        let first: Vec<_> = generate_patches(&grid, 8).unwrap().collect();
        let second: Vec<_> = generate_patches(&grid, 8).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_patches_are_truncated() {
        let grid = numbered(10, 12);
        let patches: Vec<_> = generate_patches(&grid, 8).unwrap().collect();
        let dims: Vec<_> = patches.iter().map(Grid::dimensions).collect();
        assert_eq!(dims, vec![(8, 8), (8, 4), (2, 8), (2, 4)]);
    }

    #[test]
    fn test_size_hint_is_exact() {
        let grid = numbered(10, 12);
        let mut iter = generate_patches(&grid, 8).unwrap();
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 1);
        iter.next();
        assert_eq!(iter.len(), 0);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_zero_patch_size_is_shape_error() {
        let grid = numbered(8, 8);
        assert!(matches!(generate_patches(&grid, 0), Err(CodecError::Shape { .. })));
    }

    #[test]
    fn test_assemble_inverts_generate() {
        let grid = numbered(24, 16);
        let patches: Vec<_> = generate_patches(&grid, 8).unwrap().collect();
        let back = assemble_patches(&patches, 24, 16, 8).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_assemble_wrong_count() {
        let grid = numbered(16, 16);
        let patches: Vec<_> = generate_patches(&grid, 8).unwrap().take(3).collect();
        let result = assemble_patches(&patches, 16, 16, 8);
        assert!(matches!(result, Err(CodecError::Shape { .. })));
    }

    #[test]
    fn test_assemble_unaligned_dimensions() {
        let result = assemble_patches::<i32>(&[], 12, 8, 8);
        assert!(matches!(result, Err(CodecError::Shape { .. })));
    }
}
