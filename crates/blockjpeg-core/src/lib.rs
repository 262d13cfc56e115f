//! Blockjpeg Core - grayscale block-transform image codec
//!
//! This crate implements the transform and entropy-coding pipeline of a
//! simplified JPEG-style codec for single-channel images:
//!
//! 1. Split the image into 8×8 patches in row-major order ([`patches`])
//! 2. Level-shift and apply the 2D DCT ([`dct`])
//! 3. Quantize ([`quantize`]) and reorder in zigzag order ([`zigzag`])
//! 4. Run-length and variable-length code each block ([`entropy`])
//! 5. Prefix a 64-bit size header and concatenate ([`codec`])
//!
//! Decompression runs the same steps backwards.

pub mod bits;
pub mod bitstream;
pub mod codec;
pub mod dct;
pub mod entropy;
pub mod error;
pub mod grid;
pub mod patches;
pub mod quantize;
pub mod stats;
pub mod zigzag;

pub use bitstream::{BitReader, BitWriter, Bitstream};
pub use codec::{compress, decompress, read_header, Header};
pub use dct::{dct_image, forward_transform, inverse_transform, Direction, FilterBank};
pub use error::{CodecError, Result};
pub use grid::{Block, Grid, PixelGrid, BLOCK_LEN, PATCH_SIZE};
pub use patches::{assemble_patches, generate_patches};
pub use quantize::Quantization;
pub use stats::{
    local_entropy, mean_local_entropy, mean_squared_error, psnr, shannon_entropy,
    CompressionStats,
};
pub use zigzag::{inverse_zigzag, zigzag};
