//! Run-length and variable-length coding of one 64-coefficient block.
//!
//! Each non-zero value is written as a tuple:
//!
//! ```text
//! | run (4 bits) | size (4 bits) | sign (1 bit) | magnitude (size bits) |
//! ```
//!
//! where `run` counts the zeros skipped before the value and `size` is the
//! minimal bit width of the magnitude. A `size` of zero means no value
//! follows: `11110000` skips fifteen zeros and `00000000` ends the block.
//! Zeros after the last non-zero value are implied by the end-of-block marker,
//! so every block is self-delimiting.

use crate::bits::{int_to_bits, BitStr};
use crate::bitstream::{BitReader, BitWriter, Bitstream};
use crate::error::{CodecError, Result};
use crate::grid::BLOCK_LEN;

/// Width of the zero-run field.
pub const RUN_BITS: usize = 4;

/// Width of the magnitude-size field.
pub const SIZE_BITS: usize = 4;

/// Longest zero run a single escape code skips.
pub const ESCAPE_RUN: usize = 15;

/// Widest magnitude the size field can describe.
pub const MAX_MAGNITUDE_BITS: usize = (1 << SIZE_BITS) - 1;

/// `run = 15, size = 0`: fifteen zeros, no value.
pub const ZERO_RUN_ESCAPE: u64 = 0b1111_0000;

/// `run = 0, size = 0`: the rest of the block is zero.
pub const END_OF_BLOCK: u64 = 0b0000_0000;

/// Width of a run-only code, and so the size of the smallest block.
pub const MARKER_BITS: usize = RUN_BITS + SIZE_BITS;

/// Encode a zigzag-ordered sequence into a standalone bitstream.
pub fn encode(sequence: &[i32]) -> Result<Bitstream> {
    let mut writer = BitWriter::new();
    encode_into(sequence, &mut writer)?;
    Ok(writer.finish())
}

/// Append the encoding of `sequence` to `writer`, ending with the
/// end-of-block marker.
///
/// The sequence holds at most 64 values; shorter sequences are treated as
/// zero-padded. Magnitudes that need more than 15 bits cannot be described
/// by the size field and are rejected with a domain error.
pub fn encode_into(sequence: &[i32], writer: &mut BitWriter) -> Result<()> {
    if sequence.len() > BLOCK_LEN {
        return Err(CodecError::Length {
            expected: BLOCK_LEN,
            actual: sequence.len(),
        });
    }

    let mut run = 0usize;
    for &value in sequence {
        if value == 0 {
            run += 1;
            continue;
        }

        let magnitude = int_to_bits(i64::from(value).abs())?;
        if magnitude.len() > MAX_MAGNITUDE_BITS {
            return Err(CodecError::Domain(format!(
                "coefficient {value} needs {} bits, the size field allows {MAX_MAGNITUDE_BITS}",
                magnitude.len()
            )));
        }

        while run >= ESCAPE_RUN {
            writer.write_bits(ZERO_RUN_ESCAPE, MARKER_BITS)?;
            run -= ESCAPE_RUN;
        }
        writer.write_bits(run as u64, RUN_BITS)?;
        writer.write_bits(magnitude.len() as u64, SIZE_BITS)?;
        writer.write_bit(value < 0);
        writer.extend_from_bitslice(&magnitude);
        run = 0;
    }

    writer.write_bits(END_OF_BLOCK, MARKER_BITS)
}

/// Decode one block from the reader's position, leaving the cursor just past
/// its end-of-block marker.
///
/// Fails with a bounds error if the block would place a coefficient beyond
/// index 63 or if the bits run out before the marker.
pub fn decode_block(reader: &mut BitReader<'_>) -> Result<[i32; BLOCK_LEN]> {
    let mut sequence = [0i32; BLOCK_LEN];
    let mut pos = 0usize;

    loop {
        let offset = reader.position();
        let run = reader.read_bits(RUN_BITS)? as usize;
        let size = reader.read_bits(SIZE_BITS)? as usize;

        if size == 0 {
            if run == 0 {
                return Ok(sequence);
            }
            // Zero run without a value; the escape code is the run == 15 case.
            // Landing on 64 writes nothing, so only an overshoot is an error.
            pos += run;
            if pos > BLOCK_LEN {
                return Err(CodecError::DecodeBounds(format!(
                    "zero run at bit {offset} reaches coefficient {pos}"
                )));
            }
            continue;
        }

        let negative = reader.read_bit()?;
        let magnitude = reader.read_bits(size)? as i32;
        pos += run;
        if pos >= BLOCK_LEN {
            return Err(CodecError::DecodeBounds(format!(
                "value at bit {offset} targets coefficient {pos}"
            )));
        }
        sequence[pos] = if negative { -magnitude } else { magnitude };
        pos += 1;
    }
}

/// Decode the first block of `bits`, ignoring anything after its marker.
pub fn decode(bits: &BitStr) -> Result<[i32; BLOCK_LEN]> {
    decode_block(&mut BitReader::new(bits))
}

/// Decode the first block of `bits` and return the unconsumed remainder, so
/// that blocks can be chained over one concatenated stream.
pub fn decode_with_remainder(bits: &BitStr) -> Result<([i32; BLOCK_LEN], &BitStr)> {
    let mut reader = BitReader::new(bits);
    let sequence = decode_block(&mut reader)?;
    Ok((sequence, reader.remainder()))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Mostly-zero sequences, like quantized high frequencies.
    fn sparse_sequence() -> impl Strategy<Value = Vec<i32>> {
        prop::collection::vec(
            prop_oneof![
                6 => Just(0i32),
                3 => -2047i32..=2047,
                1 => -32767i32..=32767,
            ],
            64,
        )
    }

    proptest! {
        /// Property: Decoding an encoded block restores it exactly.
        #[test]
        fn prop_round_trip(seq in sparse_sequence()) {
            let encoded = encode(&seq).unwrap();
            let decoded = decode(encoded.as_bitslice()).unwrap();
            prop_assert_eq!(decoded.to_vec(), seq);
        }

        /// Property: The decoder consumes exactly the encoded bits.
        #[test]
        fn prop_self_delimiting(seq in sparse_sequence(), tail in "[01]{0,40}") {
            let mut text = encode(&seq).unwrap().to_bit_string();
            let block_len = text.len();
            text.push_str(&tail);

            let bits = crate::bits::parse_bit_string(&text).unwrap();
            let (_, rest) = decode_with_remainder(&bits).unwrap();
            prop_assert_eq!(rest.len(), text.len() - block_len);
        }
    }
}
