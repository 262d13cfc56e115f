//! Block discrete cosine transform.
//!
//! The forward transform projects an 8×8 patch onto 64 cosine basis filters,
//! one per frequency pair `(v, u)`:
//!
//! ```text
//! filter[v][u][y][x] = 0.25 * α(v) * α(u) * cos((2y+1)vπ/16) * cos((2x+1)uπ/16)
//! α(0) = 1/√2, α(k) = 1 otherwise
//! ```
//!
//! This is the orthonormal 2D DCT-II. The inverse uses the same expression
//! with the roles of pixel and frequency swapped, so each inverse filter is
//! indexed by an output pixel `(y, x)` and ranges over `(v, u)`.
//!
//! Both filter banks are built once per process and shared read-only.
//! Values stay `f64` throughout; nothing is clamped or rounded here.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::sync::OnceLock;

use crate::error::Result;
use crate::grid::{Block, Grid, PixelGrid, BLOCK_LEN, PATCH_SIZE};
use crate::patches::{assemble_patches, generate_patches, map_in_order};

/// Offset subtracted from pixels before the forward transform so that the
/// input is centred on zero like the cosine basis.
pub const LEVEL_SHIFT: i32 = 128;

/// `COSINE[k][i] = cos((2i+1)kπ/16)`.
static COSINE: OnceLock<Block<f64>> = OnceLock::new();

static FORWARD: OnceLock<FilterBank> = OnceLock::new();
static INVERSE: OnceLock<FilterBank> = OnceLock::new();

fn cosine_table() -> &'static Block<f64> {
    COSINE.get_or_init(|| {
        let mut table = [[0.0; PATCH_SIZE]; PATCH_SIZE];
        for (k, row) in table.iter_mut().enumerate() {
            for (i, value) in row.iter_mut().enumerate() {
                *value = ((2 * i + 1) as f64 * k as f64 * PI / 16.0).cos();
            }
        }
        table
    })
}

#[inline]
fn alpha(k: usize) -> f64 {
    if k == 0 {
        FRAC_1_SQRT_2
    } else {
        1.0
    }
}

/// Which way a [`FilterBank`] maps a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Pixels to frequency coefficients.
    Forward,
    /// Frequency coefficients to pixels.
    Inverse,
}

/// A precomputed 8×8 weight matrix. Applying it to a patch yields one
/// output value: the sum of the elementwise product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisFilter {
    weights: Block<f64>,
}

impl BasisFilter {
    /// The forward basis filter for vertical frequency `v` and horizontal
    /// frequency `u`.
    pub fn cosine(v: usize, u: usize) -> Self {
        let cos = cosine_table();
        let scale = 0.25 * alpha(v) * alpha(u);
        let mut weights = [[0.0; PATCH_SIZE]; PATCH_SIZE];
        for y in 0..PATCH_SIZE {
            for x in 0..PATCH_SIZE {
                weights[y][x] = scale * cos[v][y] * cos[u][x];
            }
        }
        Self { weights }
    }

    pub fn weights(&self) -> &Block<f64> {
        &self.weights
    }

    /// Projection of `patch` onto this filter.
    #[inline]
    pub fn project(&self, patch: &Block<f64>) -> f64 {
        self.weights
            .iter()
            .flatten()
            .zip(patch.iter().flatten())
            .map(|(w, p)| w * p)
            .sum()
    }
}

/// The 64 filters of one transform direction, in row-major output order.
#[derive(Debug, Clone)]
pub struct FilterBank {
    direction: Direction,
    filters: Vec<BasisFilter>,
}

impl FilterBank {
    /// Shared forward bank, indexed by `(v, u)`.
    pub fn forward() -> &'static FilterBank {
        FORWARD.get_or_init(|| FilterBank::build(Direction::Forward))
    }

    /// Shared inverse bank, indexed by output pixel `(y, x)`.
    pub fn inverse() -> &'static FilterBank {
        INVERSE.get_or_init(|| FilterBank::build(Direction::Inverse))
    }

    pub fn for_direction(direction: Direction) -> &'static FilterBank {
        match direction {
            Direction::Forward => Self::forward(),
            Direction::Inverse => Self::inverse(),
        }
    }

    fn build(direction: Direction) -> Self {
        let forward: Vec<BasisFilter> = (0..BLOCK_LEN)
            .map(|i| BasisFilter::cosine(i / PATCH_SIZE, i % PATCH_SIZE))
            .collect();

        let filters = match direction {
            Direction::Forward => forward,
            Direction::Inverse => (0..BLOCK_LEN)
                .map(|i| {
                    let (y, x) = (i / PATCH_SIZE, i % PATCH_SIZE);
                    let mut weights = [[0.0; PATCH_SIZE]; PATCH_SIZE];
                    for v in 0..PATCH_SIZE {
                        for u in 0..PATCH_SIZE {
                            weights[v][u] = forward[v * PATCH_SIZE + u].weights[y][x];
                        }
                    }
                    BasisFilter { weights }
                })
                .collect(),
        };
        log::trace!("built {direction:?} DCT filter bank");

        Self { direction, filters }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn filters(&self) -> &[BasisFilter] {
        &self.filters
    }

    /// Apply every filter to `patch`, arranging the 64 results row-major.
    pub fn apply(&self, patch: &Block<f64>) -> Block<f64> {
        let mut out = [[0.0; PATCH_SIZE]; PATCH_SIZE];
        for (i, filter) in self.filters.iter().enumerate() {
            out[i / PATCH_SIZE][i % PATCH_SIZE] = filter.project(patch);
        }
        out
    }
}

/// Forward DCT of one 8×8 patch. `result[v][u]` is the coefficient for
/// vertical frequency `v` and horizontal frequency `u`.
pub fn forward_transform(patch: &Block<f64>) -> Block<f64> {
    FilterBank::forward().apply(patch)
}

/// Inverse DCT of one 8×8 coefficient block.
pub fn inverse_transform(coeffs: &Block<f64>) -> Block<f64> {
    FilterBank::inverse().apply(coeffs)
}

/// Transform every 8×8 block of `image` independently and reassemble the
/// results in the same row-major block order.
///
/// Both dimensions must be positive multiples of 8.
pub fn transform(image: &Grid<f64>, direction: Direction) -> Result<Grid<f64>> {
    image.ensure_patch_aligned()?;
    let bank = FilterBank::for_direction(direction);

    let blocks = generate_patches(image, PATCH_SIZE)?
        .map(|patch| patch.to_block())
        .collect::<Result<Vec<_>>>()?;
    let transformed = map_in_order(&blocks, |block| Grid::from_block(&bank.apply(block)));

    assemble_patches(&transformed, image.height(), image.width(), PATCH_SIZE)
}

/// Level-shift pixels by −128 and apply the forward transform to the whole
/// image.
///
/// Pixels are not clamped; the shift is done in `f64` so any `i32` is valid.
pub fn dct_image(pixels: &PixelGrid) -> Result<Grid<f64>> {
    let shifted = pixels.map(|&p| f64::from(p) - f64::from(LEVEL_SHIFT));
    transform(&shifted, Direction::Forward)
}
