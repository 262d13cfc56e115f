//! Measurements for judging compression quality.

use std::collections::HashMap;

use serde::Serialize;

use crate::bitstream::Bitstream;
use crate::error::{CodecError, Result};
use crate::grid::{Grid, PixelGrid};

/// Bits per pixel of the uncompressed 8-bit source.
pub const RAW_BITS_PER_PIXEL: usize = 8;

/// Size summary of one compressed image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionStats {
    /// Size of the source at 8 bits per pixel.
    pub raw_bits: usize,
    /// Size of the bitstream, header included.
    pub compressed_bits: usize,
    /// `raw_bits / compressed_bits`.
    pub ratio: f64,
    pub bits_per_pixel: f64,
}

impl CompressionStats {
    pub fn measure(pixels: &PixelGrid, stream: &Bitstream) -> Self {
        let raw_bits = pixels.len() * RAW_BITS_PER_PIXEL;
        let compressed_bits = stream.len();
        let ratio = if compressed_bits == 0 {
            f64::INFINITY
        } else {
            raw_bits as f64 / compressed_bits as f64
        };
        let bits_per_pixel = if pixels.is_empty() {
            0.0
        } else {
            compressed_bits as f64 / pixels.len() as f64
        };
        Self {
            raw_bits,
            compressed_bits,
            ratio,
            bits_per_pixel,
        }
    }
}

/// Mean of the squared per-pixel differences.
///
/// Returns a shape error if the grids differ in size.
pub fn mean_squared_error(a: &PixelGrid, b: &PixelGrid) -> Result<f64> {
    if a.dimensions() != b.dimensions() {
        return Err(CodecError::shape(
            format!("expected {}x{} to match", a.height(), a.width()),
            b.height(),
            b.width(),
        ));
    }
    if a.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&p, &q)| {
            let d = f64::from(p) - f64::from(q);
            d * d
        })
        .sum();
    Ok(sum / a.len() as f64)
}

/// Peak signal-to-noise ratio in decibels; `peak` is 255 for 8-bit images.
///
/// Identical grids give `f64::INFINITY`.
pub fn psnr(a: &PixelGrid, b: &PixelGrid, peak: f64) -> Result<f64> {
    let mse = mean_squared_error(a, b)?;
    if mse == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(10.0 * (peak * peak / mse).log10())
}

/// Empirical Shannon entropy of `symbols`, in bits per symbol.
pub fn shannon_entropy(symbols: &[i32]) -> f64 {
    if symbols.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for &s in symbols {
        *counts.entry(s).or_insert(0) += 1;
    }
    let total = symbols.len() as f64;
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy of the `kernel_size`×`kernel_size` neighbourhood around every
/// pixel, in bits per symbol.
///
/// Windows that cross an edge are filled by mirroring the grid about that
/// edge (`c b a | a b c | c b a`). A zero kernel size is a domain error.
pub fn local_entropy(pixels: &PixelGrid, kernel_size: usize) -> Result<Grid<f64>> {
    if kernel_size == 0 {
        return Err(CodecError::Domain("entropy kernel size must be positive".into()));
    }
    let (height, width) = pixels.dimensions();
    let before = (kernel_size / 2) as isize;
    let mut window = Vec::with_capacity(kernel_size * kernel_size);

    let mut data = Vec::with_capacity(pixels.len());
    for y in 0..height {
        for x in 0..width {
            window.clear();
            for dy in 0..kernel_size as isize {
                let sy = reflect(y as isize + dy - before, height);
                for dx in 0..kernel_size as isize {
                    let sx = reflect(x as isize + dx - before, width);
                    window.push(pixels[(sy, sx)]);
                }
            }
            data.push(shannon_entropy(&window));
        }
    }
    Grid::from_vec(height, width, data)
}

/// Mean of [`local_entropy`] over the whole grid; 0 for an empty grid.
pub fn mean_local_entropy(pixels: &PixelGrid, kernel_size: usize) -> Result<f64> {
    let local = local_entropy(pixels, kernel_size)?;
    if local.is_empty() {
        return Ok(0.0);
    }
    Ok(local.as_slice().iter().sum::<f64>() / local.len() as f64)
}

/// Mirror an out-of-range index back into `0..len` (`len > 0`).
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let folded = index.rem_euclid(2 * len);
    if folded < len {
        folded as usize
    } else {
        (2 * len - 1 - folded) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure() {
        let pixels = Grid::filled(16, 16, 128);
        let stream = Bitstream::from_bit_string(&"0".repeat(96)).unwrap();
        let stats = CompressionStats::measure(&pixels, &stream);
        assert_eq!(stats.raw_bits, 2048);
        assert_eq!(stats.compressed_bits, 96);
        assert!((stats.ratio - 2048.0 / 96.0).abs() < 1e-12);
        assert!((stats.bits_per_pixel - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_mean_squared_error() {
        let a = Grid::from_rows(vec![vec![0, 10], vec![20, 30]]).unwrap();
        let b = Grid::from_rows(vec![vec![1, 8], vec![20, 34]]).unwrap();
        // (1 + 4 + 0 + 16) / 4
        assert_eq!(mean_squared_error(&a, &b).unwrap(), 5.25);
        assert_eq!(mean_squared_error(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn test_mismatched_shapes() {
        let a = Grid::filled(8, 8, 0);
        let b = Grid::filled(8, 16, 0);
        assert!(matches!(mean_squared_error(&a, &b), Err(CodecError::Shape { .. })));
        assert!(psnr(&a, &b, 255.0).is_err());
    }

    #[test]
    fn test_psnr() {
        let a = Grid::filled(8, 8, 100);
        assert_eq!(psnr(&a, &a, 255.0).unwrap(), f64::INFINITY);

        // MSE of 1 gives 20 * log10(255)
        let b = Grid::filled(8, 8, 101);
        let expected = 20.0 * 255f64.log10();
        assert!((psnr(&a, &b, 255.0).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_reflect() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
        assert_eq!(reflect(-3, 1), 0);
    }

    #[test]
    fn test_local_entropy_of_constant_grid() {
        let pixels = Grid::filled(8, 8, 42);
        let local = local_entropy(&pixels, 3).unwrap();
        assert_eq!(local.dimensions(), (8, 8));
        assert!(local.as_slice().iter().all(|&e| e == 0.0));
        assert_eq!(mean_local_entropy(&pixels, 3).unwrap(), 0.0);
    }

    #[test]
    fn test_local_entropy_mirrors_edges() {
        // Both windows hold one symbol twice and the other once
        let pixels = Grid::from_rows(vec![vec![0, 1]]).unwrap();
        let (major, minor) = (2.0f64 / 3.0, 1.0f64 / 3.0);
        let expected = -major * major.log2() - minor * minor.log2();

        let local = local_entropy(&pixels, 3).unwrap();
        assert!((local[(0, 0)] - expected).abs() < 1e-12);
        assert!((local[(0, 1)] - expected).abs() < 1e-12);
        assert!((mean_local_entropy(&pixels, 3).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_local_entropy_kernel_sizes() {
        let pixels = Grid::from_fn(4, 4, |y, x| (y * 4 + x) as i32);
        let single = local_entropy(&pixels, 1).unwrap();
        assert!(single.as_slice().iter().all(|&e| e == 0.0));

        // A 4x4 window centred on an interior pixel covers 16 distinct values
        let wide = local_entropy(&pixels, 4).unwrap();
        assert!((wide[(2, 2)] - 4.0).abs() < 1e-12);

        assert!(matches!(local_entropy(&pixels, 0), Err(CodecError::Domain(_))));
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(&[]), 0.0);
        assert_eq!(shannon_entropy(&[7; 10]), 0.0);
        assert!((shannon_entropy(&[0, 1, 0, 1]) - 1.0).abs() < 1e-12);
        assert!((shannon_entropy(&[0, 1, 2, 3, 4, 5, 6, 7]) - 3.0).abs() < 1e-12);
    }
}
