//! Quantization of DCT coefficient blocks.
//!
//! Quantization is the only lossy step of the codec. Each coefficient is
//! divided by its divisor and truncated toward zero; decoding multiplies back.
//! The divisors are not stored in the bitstream, so the same [`Quantization`]
//! must be supplied to both `compress` and `decompress`.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::grid::{Block, PATCH_SIZE};

/// Quantization divisors, either one value for every coefficient or a full
/// 8×8 table indexed by frequency `(v, u)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Quantization {
    /// The same divisor for all 64 coefficients.
    Scalar(f64),
    /// One divisor per coefficient.
    Matrix(Block<f64>),
}

impl Default for Quantization {
    /// Divisor 1: only the truncation of real coefficients loses information.
    fn default() -> Self {
        Quantization::Scalar(1.0)
    }
}

impl Quantization {
    /// A single divisor for every coefficient.
    pub fn uniform(q: f64) -> Self {
        Quantization::Scalar(q)
    }

    /// A per-coefficient divisor table.
    pub fn matrix(table: Block<f64>) -> Self {
        Quantization::Matrix(table)
    }

    /// Divisor for vertical frequency `v` and horizontal frequency `u`.
    #[inline]
    pub fn divisor(&self, v: usize, u: usize) -> f64 {
        match self {
            Quantization::Scalar(q) => *q,
            Quantization::Matrix(table) => table[v][u],
        }
    }

    /// Check that every divisor is positive and finite.
    pub fn validate(&self) -> Result<()> {
        let bad = match self {
            Quantization::Scalar(q) => (!is_valid_divisor(*q)).then_some(*q),
            Quantization::Matrix(table) => table
                .iter()
                .flatten()
                .copied()
                .find(|&q| !is_valid_divisor(q)),
        };
        match bad {
            Some(q) => Err(CodecError::Domain(format!(
                "quantization divisors must be positive and finite, got {q}"
            ))),
            None => Ok(()),
        }
    }

    /// Divide each coefficient by its divisor and truncate toward zero.
    ///
    /// Quotients beyond the `i32` range saturate; the entropy coder rejects
    /// magnitudes that large anyway.
    pub fn quantize(&self, coeffs: &Block<f64>) -> Block<i32> {
        let mut out = [[0i32; PATCH_SIZE]; PATCH_SIZE];
        for v in 0..PATCH_SIZE {
            for u in 0..PATCH_SIZE {
                out[v][u] = (coeffs[v][u] / self.divisor(v, u)).trunc() as i32;
            }
        }
        out
    }

    /// Multiply each quantized coefficient back by its divisor.
    pub fn dequantize(&self, levels: &Block<i32>) -> Block<f64> {
        let mut out = [[0.0; PATCH_SIZE]; PATCH_SIZE];
        for v in 0..PATCH_SIZE {
            for u in 0..PATCH_SIZE {
                out[v][u] = f64::from(levels[v][u]) * self.divisor(v, u);
            }
        }
        out
    }
}

#[inline]
fn is_valid_divisor(q: f64) -> bool {
    q.is_finite() && q > 0.0
}
