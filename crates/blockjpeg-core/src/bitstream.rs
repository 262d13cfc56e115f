//! Packed bit buffer with an append-only writer and a cursor-based reader.
//!
//! The compressed format is defined bit by bit, not byte by byte. [`Bitstream`]
//! keeps the exact bit count, [`BitWriter`] appends fixed-width fields
//! MSB-first, and [`BitReader`] walks them back with a cursor so that
//! self-delimiting blocks can be decoded one after another.

use std::fmt;
use std::str::FromStr;

use crate::bits::{bits_to_int, parse_bit_string, to_bit_string, BitStr, Bits};
use crate::error::{CodecError, Result};

/// Widest field that fits in a single `u64` read or write.
const MAX_FIELD_WIDTH: usize = u64::BITS as usize;

/// An ordered sequence of bits produced by the encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitstream {
    bits: Bits,
}

impl Bitstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bits(bits: Bits) -> Self {
        Self { bits }
    }

    /// Number of bits (not bytes).
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_bitslice(&self) -> &BitStr {
        &self.bits
    }

    pub fn into_bits(self) -> Bits {
        self.bits
    }

    /// A reader positioned at the first bit.
    pub fn reader(&self) -> BitReader<'_> {
        BitReader::new(&self.bits)
    }

    /// Render as a string of `'0'` and `'1'` characters.
    pub fn to_bit_string(&self) -> String {
        to_bit_string(&self.bits)
    }

    /// Parse a string of `'0'` and `'1'` characters.
    pub fn from_bit_string(s: &str) -> Result<Self> {
        parse_bit_string(s).map(Self::from_bits)
    }

    /// Pack into bytes, MSB-first. The final byte is padded with zero bits,
    /// so the bit length must be kept alongside the bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bits = self.bits.clone();
        bits.set_uninitialized(false);
        bits.into_vec()
    }

    /// Unpack the first `bit_len` bits of `bytes`.
    pub fn from_bytes(bytes: &[u8], bit_len: usize) -> Result<Self> {
        let available = bytes.len() * 8;
        if bit_len > available {
            return Err(CodecError::Length {
                expected: bit_len,
                actual: available,
            });
        }
        let mut bits = Bits::from_slice(bytes);
        bits.truncate(bit_len);
        Ok(Self { bits })
    }
}

impl fmt::Display for Bitstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

impl FromStr for Bitstream {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bit_string(s)
    }
}

impl From<Bits> for Bitstream {
    fn from(bits: Bits) -> Self {
        Self::from_bits(bits)
    }
}

/// Appends fixed-width fields to a growing bit buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    bits: Bits,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Bits::with_capacity(bits),
        }
    }

    /// Append the low `width` bits of `value`, most significant first.
    ///
    /// Returns a domain error if `value` does not fit in `width` bits or
    /// `width` exceeds 64.
    pub fn write_bits(&mut self, value: u64, width: usize) -> Result<()> {
        if width > MAX_FIELD_WIDTH {
            return Err(CodecError::Domain(format!(
                "field width {width} exceeds {MAX_FIELD_WIDTH} bits"
            )));
        }
        if width < MAX_FIELD_WIDTH && value >> width != 0 {
            return Err(CodecError::Domain(format!(
                "{value} does not fit in a {width}-bit field"
            )));
        }
        for shift in (0..width).rev() {
            self.bits.push((value >> shift) & 1 == 1);
        }
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn extend_from_bitslice(&mut self, bits: &BitStr) {
        self.bits.extend_from_bitslice(bits);
    }

    /// Bits written so far.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn finish(self) -> Bitstream {
        Bitstream { bits: self.bits }
    }
}

/// Reads fixed-width fields from a bit slice, advancing a cursor.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bits: &'a BitStr,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a BitStr) -> Self {
        Self { bits, pos: 0 }
    }

    /// Cursor offset from the start of the slice, in bits.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bits left after the cursor.
    pub fn remaining(&self) -> usize {
        self.bits.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// The unconsumed tail of the slice.
    pub fn remainder(&self) -> &'a BitStr {
        &self.bits[self.pos..]
    }

    /// Decode the next `width` bits without moving the cursor.
    pub fn peek_bits(&self, width: usize) -> Result<u64> {
        if width > MAX_FIELD_WIDTH {
            return Err(CodecError::Domain(format!(
                "field width {width} exceeds {MAX_FIELD_WIDTH} bits"
            )));
        }
        if width > self.remaining() {
            return Err(CodecError::DecodeBounds(format!(
                "need {width} bits at offset {}, only {} remain",
                self.pos,
                self.remaining()
            )));
        }
        Ok(bits_to_int(&self.bits[self.pos..self.pos + width]))
    }

    /// Decode the next `width` bits and advance past them.
    pub fn read_bits(&mut self, width: usize) -> Result<u64> {
        let value = self.peek_bits(width)?;
        self.pos += width;
        Ok(value)
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }
}
