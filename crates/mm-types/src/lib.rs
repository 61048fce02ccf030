//! Fixed-width two's-complement integer primitives shared by every crate in
//! the modelmachine emulator family.

mod cell;
mod endianess;

pub use cell::{Cell, CellError, Result, MAX_BITS};
pub use endianess::Endianess;

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn bits_in_range(bits: u8) -> u8 {
        1 + bits % MAX_BITS
    }

    #[quickcheck]
    fn unsigned_in_range(raw_bits: u8, value: i128) -> bool {
        let bits = bits_in_range(raw_bits);
        let c = Cell::new(value, bits);
        c.unsigned() < (1u128 << bits)
    }

    #[quickcheck]
    fn signed_in_range(raw_bits: u8, value: i128) -> bool {
        let bits = bits_in_range(raw_bits);
        let c = Cell::new(value, bits);
        let half = 1i128 << (bits - 1);
        c.signed() >= -half && c.signed() < half
    }

    #[quickcheck]
    fn signed_unsigned_same_residue(raw_bits: u8, value: i128) -> bool {
        let bits = bits_in_range(raw_bits);
        let c = Cell::new(value, bits);
        let modulus = 1i128 << bits;
        (c.signed() - c.unsigned() as i128).rem_euclid(modulus) == 0
    }

    #[quickcheck]
    fn encode_decode_round_trip(chunk_count: u8, value: i128) -> bool {
        let chunks = 1 + chunk_count % 7;
        let bits = chunks * 8;
        let c = Cell::new(value, bits);
        let pieces = c.encode(8, Endianess::Little).unwrap();
        Cell::decode(&pieces, Endianess::Little) == c
    }

    #[test]
    fn hex_round_trip() {
        let c = Cell::new(0x2a, 8);
        assert_eq!(c.hex(), "2a");
        assert_eq!(Cell::from_hex("2a").unwrap(), c);
    }

    #[test]
    fn sdivmod_truncates_toward_zero() {
        let a = Cell::new(-7, 8);
        let b = Cell::new(2, 8);
        let (q, r) = a.sdivmod(b).unwrap();
        assert_eq!(q.signed(), -3);
        assert_eq!(r.signed(), -1);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let a = Cell::new(5, 8);
        let b = Cell::new(0, 8);
        assert_eq!(a.sdivmod(b), Err(CellError::DivisionByZero));
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let a = Cell::new(1, 8);
        let b = Cell::new(1, 16);
        assert_eq!(a.add(b), Err(CellError::WidthMismatch(8, 16)));
    }

    #[test]
    fn eq_int_matches_by_residue() {
        let c = Cell::new(-1, 8);
        assert!(c.eq_int(255));
        assert!(c.eq_int(-1));
    }

    #[test]
    fn slice_and_bit_are_little_endian() {
        let c = Cell::new(0b1010_0000, 8);
        assert_eq!(c.bit(5).unsigned(), 1);
        assert_eq!(c.bit(0).unsigned(), 0);
        assert_eq!(c.slice(4, 8).unsigned(), 0b1010);
    }
}
