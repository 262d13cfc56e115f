//! Row-major 2D grids and fixed-size blocks.
//!
//! A [`Grid`] is the owned, rectangular buffer every pipeline stage reads and
//! writes: integer pixels before compression, real-valued coefficients in the
//! transform stage, and integer pixels again after decompression. A [`Block`]
//! is the fixed 8×8 array the per-patch stages work on once the size is known.

use std::ops::Index;

use image::{GrayImage, Luma};

use crate::error::{CodecError, Result};

/// Edge length of a square patch.
pub const PATCH_SIZE: usize = 8;

/// Number of coefficients in one patch.
pub const BLOCK_LEN: usize = PATCH_SIZE * PATCH_SIZE;

/// An 8×8 patch, indexed `[row][col]`.
pub type Block<T> = [[T; PATCH_SIZE]; PATCH_SIZE];

/// A grid of integer pixel intensities (0-255 conceptually, not clamped).
pub type PixelGrid = Grid<i32>;

/// A rectangular grid stored in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    height: usize,
    width: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Create a grid from a row-major buffer.
    ///
    /// Returns a shape error if `data.len() != height * width`.
    pub fn from_vec(height: usize, width: usize, data: Vec<T>) -> Result<Self> {
        let expected = height.checked_mul(width).ok_or_else(|| {
            CodecError::shape("grid dimensions overflow", height, width)
        })?;
        if data.len() != expected {
            return Err(CodecError::shape(
                format!("buffer holds {} values, expected {}", data.len(), expected),
                height,
                width,
            ));
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Build a grid by evaluating `f(y, x)` for every cell.
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for y in 0..height {
            for x in 0..width {
                data.push(f(y, x));
            }
        }
        Self {
            height,
            width,
            data,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`, in the order the bitstream header stores them.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a cell, or `None` when out of bounds.
    pub fn get(&self, y: usize, x: usize) -> Option<&T> {
        if y < self.height && x < self.width {
            self.data.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Iterate over the rows of the grid, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.width.max(1))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Apply `f` to every cell, producing a grid of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            height: self.height,
            width: self.width,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// True when both dimensions are positive multiples of [`PATCH_SIZE`].
    pub fn is_patch_aligned(&self) -> bool {
        self.height > 0
            && self.width > 0
            && self.height % PATCH_SIZE == 0
            && self.width % PATCH_SIZE == 0
    }

    /// Return a shape error unless the grid tiles exactly into 8×8 patches.
    pub fn ensure_patch_aligned(&self) -> Result<()> {
        if self.is_patch_aligned() {
            Ok(())
        } else {
            Err(CodecError::shape(
                format!("dimensions must be positive multiples of {PATCH_SIZE}"),
                self.height,
                self.width,
            ))
        }
    }
}

impl<T: Clone> Grid<T> {
    /// Create a grid from nested rows.
    ///
    /// The rows must be non-empty and all of the same length; anything else
    /// is not a 2D grid and is reported as a shape error.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(CodecError::shape("grid must have at least one cell", height, width));
        }
        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(CodecError::shape(
                format!("row {bad} has {} values, expected {width}", rows[bad].len()),
                height,
                width,
            ));
        }
        let data = rows.into_iter().flatten().collect();
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(height: usize, width: usize, value: T) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
    }

    /// Copy out the region starting at `(y, x)`, truncated at the grid edges.
    pub fn region(&self, y: usize, x: usize, height: usize, width: usize) -> Grid<T> {
        let y_end = (y + height).min(self.height);
        let x_end = (x + width).min(self.width);
        let out_h = y_end.saturating_sub(y);
        let out_w = x_end.saturating_sub(x);

        let mut data = Vec::with_capacity(out_h * out_w);
        for row in y..y_end {
            let start = row * self.width;
            data.extend_from_slice(&self.data[start + x..start + x_end]);
        }
        Grid {
            height: out_h,
            width: out_w,
            data,
        }
    }
}

impl<T: Copy + Default> Grid<T> {
    /// Copy an 8×8 grid into a fixed block.
    pub fn to_block(&self) -> Result<Block<T>> {
        if self.height != PATCH_SIZE || self.width != PATCH_SIZE {
            return Err(CodecError::shape(
                format!("patch must be {PATCH_SIZE}x{PATCH_SIZE}"),
                self.height,
                self.width,
            ));
        }
        let mut block = [[T::default(); PATCH_SIZE]; PATCH_SIZE];
        for (dst, src) in block.iter_mut().zip(self.data.chunks_exact(PATCH_SIZE)) {
            dst.copy_from_slice(src);
        }
        Ok(block)
    }

    /// Create an 8×8 grid from a fixed block.
    pub fn from_block(block: &Block<T>) -> Self {
        Self {
            height: PATCH_SIZE,
            width: PATCH_SIZE,
            data: block.iter().flatten().copied().collect(),
        }
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    /// Index by `(row, col)`. Panics when out of bounds, like slice indexing.
    fn index(&self, (y, x): (usize, usize)) -> &T {
        assert!(
            y < self.height && x < self.width,
            "grid index ({y}, {x}) out of bounds for {}x{}",
            self.height,
            self.width
        );
        &self.data[y * self.width + x]
    }
}

impl PixelGrid {
    /// Convert an 8-bit grayscale image from the `image` crate.
    pub fn from_luma(img: &GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            height: height as usize,
            width: width as usize,
            data: img.as_raw().iter().map(|&p| i32::from(p)).collect(),
        }
    }

    /// Convert to an 8-bit grayscale image, clamping to 0-255.
    pub fn to_luma(&self) -> Result<GrayImage> {
        let width = u32::try_from(self.width)
            .map_err(|_| CodecError::Domain(format!("width {} exceeds u32", self.width)))?;
        let height = u32::try_from(self.height)
            .map_err(|_| CodecError::Domain(format!("height {} exceeds u32", self.height)))?;
        Ok(GrayImage::from_fn(width, height, |x, y| {
            let v = self.data[y as usize * self.width + x as usize];
            Luma([v.clamp(0, 255) as u8])
        }))
    }

    /// Real-valued copy of the pixels.
    pub fn to_f64(&self) -> Grid<f64> {
        self.map(|&p| f64::from(p))
    }
}
