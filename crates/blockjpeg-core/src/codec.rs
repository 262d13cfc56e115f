//! Whole-image compression and decompression.
//!
//! A compressed image is a single bitstream:
//!
//! ```text
//! | height (32 bits) | width (32 bits) | block 1 | block 2 | ... | block N |
//! ```
//!
//! Blocks are the entropy-coded, zigzag-ordered, quantized DCT coefficients
//! of each 8×8 patch in row-major block order. Nothing else is stored: the
//! quantization divisors must be passed to [`decompress`] out of band.

use log::{debug, trace};

use crate::bitstream::{BitReader, BitWriter, Bitstream};
use crate::bits::BitStr;
use crate::dct::{dct_image, inverse_transform, LEVEL_SHIFT};
use crate::entropy;
use crate::error::{CodecError, Result};
use crate::grid::{Grid, PixelGrid, BLOCK_LEN, PATCH_SIZE};
use crate::patches::{assemble_patches, generate_patches, map_in_order};
use crate::quantize::Quantization;
use crate::zigzag::{inverse_zigzag, zigzag};

/// Width of each header field.
pub const HEADER_FIELD_BITS: usize = 32;

/// Total header length: height then width.
pub const HEADER_BITS: usize = 2 * HEADER_FIELD_BITS;

/// Image dimensions stored at the start of every bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub height: usize,
    pub width: usize,
}

impl Header {
    /// Number of 8×8 blocks the body must contain.
    pub fn block_count(&self) -> usize {
        (self.height / PATCH_SIZE) * (self.width / PATCH_SIZE)
    }

    fn validate(&self) -> Result<()> {
        if self.height == 0
            || self.width == 0
            || self.height % PATCH_SIZE != 0
            || self.width % PATCH_SIZE != 0
        {
            return Err(CodecError::shape(
                format!("header dimensions must be positive multiples of {PATCH_SIZE}"),
                self.height,
                self.width,
            ));
        }
        Ok(())
    }

    fn write(&self, writer: &mut BitWriter) -> Result<()> {
        for (name, value) in [("height", self.height), ("width", self.width)] {
            let value = u32::try_from(value).map_err(|_| {
                CodecError::Domain(format!(
                    "{name} {value} does not fit the {HEADER_FIELD_BITS}-bit header field"
                ))
            })?;
            writer.write_bits(u64::from(value), HEADER_FIELD_BITS)?;
        }
        Ok(())
    }

    fn read(reader: &mut BitReader<'_>) -> Result<Self> {
        let height = reader.read_bits(HEADER_FIELD_BITS)? as usize;
        let width = reader.read_bits(HEADER_FIELD_BITS)? as usize;
        let header = Header { height, width };
        header.validate()?;
        Ok(header)
    }
}

/// Parse the header at the start of `bits`.
///
/// Fails with a bounds error if fewer than 64 bits are present and with a
/// shape error if either dimension is zero or not a multiple of 8.
pub fn read_header(bits: &BitStr) -> Result<Header> {
    Header::read(&mut BitReader::new(bits))
}

/// Compress a grayscale image.
///
/// # Arguments
/// * `pixels` - Pixel values, nominally 0-255; both dimensions must be
///   positive multiples of 8
/// * `quantization` - Divisors applied to the DCT coefficients
///
/// # Returns
/// The header followed by one entropy-coded block per 8×8 patch.
pub fn compress(pixels: &PixelGrid, quantization: &Quantization) -> Result<Bitstream> {
    quantization.validate()?;
    pixels.ensure_patch_aligned()?;
    let header = Header {
        height: pixels.height(),
        width: pixels.width(),
    };
    debug!(
        "compressing {}x{} image ({} blocks)",
        header.height,
        header.width,
        header.block_count()
    );

    let mut writer = BitWriter::new();
    header.write(&mut writer)?;

    let coefficients = dct_image(pixels)?;
    let blocks = generate_patches(&coefficients, PATCH_SIZE)?
        .map(|patch| patch.to_block())
        .collect::<Result<Vec<_>>>()?;

    let encoded = map_in_order(&blocks, |block| {
        entropy::encode(&zigzag(&quantization.quantize(block)))
    });
    for (index, block) in encoded.into_iter().enumerate() {
        let block = block?;
        trace!("block {index}: {} bits", block.len());
        writer.extend_from_bitslice(block.as_bitslice());
    }

    let stream = writer.finish();
    debug!(
        "compressed to {} bits ({} header + {} body)",
        stream.len(),
        HEADER_BITS,
        stream.len() - HEADER_BITS
    );
    Ok(stream)
}

/// Decompress a bitstream produced by [`compress`].
///
/// `quantization` must be the value used for compression. Output pixels are
/// rounded to the nearest integer and are not clamped.
///
/// Fails with a bounds error if a block is malformed or if the number of
/// blocks disagrees with the header.
pub fn decompress(stream: &Bitstream, quantization: &Quantization) -> Result<PixelGrid> {
    quantization.validate()?;
    let mut reader = stream.reader();
    let header = Header::read(&mut reader)?;
    let expected = header.block_count();
    debug!(
        "decompressing {}x{} image from {} bits ({expected} blocks)",
        header.height,
        header.width,
        stream.len()
    );

    // Each block ends with at least one marker, so the body bounds the count
    let room = reader.remaining() / entropy::MARKER_BITS;
    if expected > room {
        return Err(CodecError::DecodeBounds(format!(
            "header declares {expected} blocks, {} body bits hold at most {room}",
            reader.remaining()
        )));
    }

    let mut sequences: Vec<[i32; BLOCK_LEN]> = Vec::with_capacity(expected);
    while !reader.is_exhausted() {
        if sequences.len() == expected {
            return Err(CodecError::DecodeBounds(format!(
                "{} trailing bits after the {expected} blocks the header declares",
                reader.remaining()
            )));
        }
        let start = reader.position();
        sequences.push(entropy::decode_block(&mut reader)?);
        trace!(
            "block {}: {} bits",
            sequences.len() - 1,
            reader.position() - start
        );
    }
    if sequences.len() != expected {
        return Err(CodecError::DecodeBounds(format!(
            "stream holds {} blocks, header declares {expected}",
            sequences.len()
        )));
    }

    let patches = map_in_order(&sequences, |sequence| -> Result<Grid<f64>> {
        let levels = inverse_zigzag(sequence)?;
        Ok(Grid::from_block(&inverse_transform(
            &quantization.dequantize(&levels),
        )))
    })
    .into_iter()
    .collect::<Result<Vec<_>>>()?;

    let shifted = assemble_patches(&patches, header.height, header.width, PATCH_SIZE)?;
    Ok(shifted.map(|&v| (v + f64::from(LEVEL_SHIFT)).round() as i32))
}
