//! Conversions between non-negative integers and big-endian bit sequences.
//!
//! Headers and coefficient magnitudes are both serialized through these
//! helpers. Bits are stored most significant first in a packed
//! [`BitVec`](bitvec::vec::BitVec), so `int_to_bits(5)` is the sequence `101`.

use bitvec::prelude::*;

use crate::error::{CodecError, Result};

/// Owned, packed, MSB-first bit sequence.
pub type Bits = BitVec<u8, Msb0>;

/// Borrowed view of a [`Bits`] sequence.
pub type BitStr = BitSlice<u8, Msb0>;

/// Number of bits in the minimal binary representation of `n`.
///
/// Zero still takes one bit.
#[inline]
pub fn min_bit_width(n: u64) -> usize {
    if n == 0 {
        1
    } else {
        (u64::BITS - n.leading_zeros()) as usize
    }
}

/// Minimal-width binary representation of a non-negative integer.
///
/// `0` maps to the single bit `0`. Negative input is a domain error. The
/// result is not padded; use [`int_to_bits_padded`] for fixed-width fields.
pub fn int_to_bits(n: i64) -> Result<Bits> {
    let n = non_negative(n)?;
    let width = min_bit_width(n);
    let mut bits = Bits::with_capacity(width);
    push_msb_first(&mut bits, n, width);
    Ok(bits)
}

/// Binary representation of `n`, left-padded with zeros to `width` bits.
///
/// Returns a domain error if `n` is negative or does not fit in `width` bits.
pub fn int_to_bits_padded(n: i64, width: usize) -> Result<Bits> {
    let n = non_negative(n)?;
    let needed = min_bit_width(n);
    if needed > width {
        return Err(CodecError::Domain(format!(
            "{n} needs {needed} bits, field is {width} bits wide"
        )));
    }
    let mut bits = Bits::with_capacity(width);
    bits.resize(width - needed, false);
    push_msb_first(&mut bits, n, needed);
    Ok(bits)
}

/// Decode a big-endian bit sequence of any length.
///
/// Leading zeros are ignored. Only the low 64 bits of the value survive, so
/// callers keep significant widths at or below 64.
pub fn bits_to_int(bits: &BitStr) -> u64 {
    bits.iter()
        .by_vals()
        .fold(0u64, |acc, bit| (acc << 1) | u64::from(bit))
}

/// Render bits as a string of `'0'` and `'1'` characters.
pub fn to_bit_string(bits: &BitStr) -> String {
    bits.iter()
        .by_vals()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}

/// Parse a string of `'0'` and `'1'` characters.
pub fn parse_bit_string(s: &str) -> Result<Bits> {
    let mut bits = Bits::with_capacity(s.len());
    for (i, c) in s.chars().enumerate() {
        match c {
            '0' => bits.push(false),
            '1' => bits.push(true),
            other => {
                return Err(CodecError::Domain(format!(
                    "invalid bit character {other:?} at position {i}"
                )))
            }
        }
    }
    Ok(bits)
}

fn non_negative(n: i64) -> Result<u64> {
    u64::try_from(n).map_err(|_| CodecError::Domain(format!("integer must be non-negative: {n}")))
}

fn push_msb_first(bits: &mut Bits, n: u64, width: usize) {
    for shift in (0..width).rev() {
        bits.push((n >> shift) & 1 == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITS_INT: &[(&str, i64)] = &[
        ("1111101", 125),
        ("1111110", 126),
        ("1111111", 127),
        ("1111", 15),
        ("1110", 14),
        ("1101", 13),
        ("1100", 12),
        ("1011", 11),
        ("1010", 10),
        ("1001", 9),
        ("0111", 7),
        ("1000", 8),
        ("0110", 6),
        ("0101", 5),
        ("0100", 4),
        ("0011", 3),
        ("0010", 2),
        ("0001", 1),
        ("0000", 0),
    ];

    fn bits(s: &str) -> Bits {
        parse_bit_string(s).unwrap()
    }

    #[test]
    fn test_bits_to_int() {
        for &(s, n) in BITS_INT {
            assert_eq!(bits_to_int(&bits(s)), n as u64, "decoding {s}");
        }
    }

    #[test]
    fn test_int_to_bits_padded_matches_table() {
        for &(s, n) in BITS_INT {
            let encoded = int_to_bits_padded(n, s.len()).unwrap();
            assert_eq!(to_bit_string(&encoded), s);
        }
    }

    #[test]
    fn test_int_to_bits_is_minimal() {
        assert_eq!(to_bit_string(&int_to_bits(0).unwrap()), "0");
        assert_eq!(to_bit_string(&int_to_bits(1).unwrap()), "1");
        assert_eq!(to_bit_string(&int_to_bits(7).unwrap()), "111");
        assert_eq!(to_bit_string(&int_to_bits(8).unwrap()), "1000");
    }

    #[test]
    fn test_int_to_bits_large_numbers() {
        let cases = [
            (233, "11101001"),
            (693, "1010110101"),
            (964, "1111000100"),
            (633, "1001111001"),
            (877, "1101101101"),
        ];
        for (n, s) in cases {
            assert_eq!(to_bit_string(&int_to_bits(n).unwrap()), s);
            assert_eq!(bits_to_int(&bits(s)), n as u64);
        }
    }

    #[test]
    fn test_negative_is_domain_error() {
        assert!(matches!(int_to_bits(-1), Err(CodecError::Domain(_))));
        assert!(matches!(int_to_bits_padded(-20, 32), Err(CodecError::Domain(_))));
    }

    #[test]
    fn test_padded_too_narrow_is_domain_error() {
        assert!(matches!(int_to_bits_padded(16, 4), Err(CodecError::Domain(_))));
        assert!(int_to_bits_padded(15, 4).is_ok());
    }

    #[test]
    fn test_leading_zeros_ignored() {
        assert_eq!(bits_to_int(&bits("1010")), bits_to_int(&bits("0000001010")));
        assert_eq!(bits_to_int(&bits("")), 0);
    }

    #[test]
    fn test_min_bit_width() {
        assert_eq!(min_bit_width(0), 1);
        assert_eq!(min_bit_width(1), 1);
        assert_eq!(min_bit_width(2), 2);
        assert_eq!(min_bit_width(1023), 10);
        assert_eq!(min_bit_width(1024), 11);
        assert_eq!(min_bit_width(u64::MAX), 64);
    }

    #[test]
    fn test_parse_rejects_other_characters() {
        assert!(matches!(parse_bit_string("01a1"), Err(CodecError::Domain(_))));
        assert!(matches!(parse_bit_string("0 1"), Err(CodecError::Domain(_))));
    }

    #[test]
    fn test_round_trip_up_to_ten_thousand() {
        for n in 0..=10_000i64 {
            let encoded = int_to_bits(n).unwrap();
            assert_eq!(bits_to_int(&encoded), n as u64);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Padding to any sufficient width preserves the value.
        #[test]
        fn prop_padded_round_trip(n in 0i64..=i64::MAX, extra in 0usize..=16) {
            let width = min_bit_width(n as u64) + extra;
            let encoded = int_to_bits_padded(n, width).unwrap();
            prop_assert_eq!(encoded.len(), width);
            prop_assert_eq!(bits_to_int(&encoded), n as u64);
        }

        /// Property: The minimal encoding never starts with a zero (except for 0).
        #[test]
        fn prop_minimal_has_no_leading_zero(n in 1i64..=i64::MAX) {
            let encoded = int_to_bits(n).unwrap();
            prop_assert!(encoded[0]);
            prop_assert_eq!(encoded.len(), min_bit_width(n as u64));
        }

        /// Property: Bit strings survive a textual round trip.
        #[test]
        fn prop_bit_string_round_trip(s in "[01]{0,200}") {
            let parsed = parse_bit_string(&s).unwrap();
            prop_assert_eq!(to_bit_string(&parsed), s);
        }
    }
}
