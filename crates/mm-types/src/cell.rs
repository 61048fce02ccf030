use std::fmt;

use crate::Endianess;

/// Maximum width of a [`Cell`], in bits.
pub const MAX_BITS: u8 = 64;

/// An immutable, fixed-width two's-complement integer.
///
/// The canonical stored form is `value mod 2^bits`, in `[0, 2^bits)`. A
/// signed view is obtained by sign-extending from bit `bits - 1`. Every
/// arithmetic operation requires its operand to share the same width and
/// wraps modulo `2^bits` rather than overflowing.
#[derive(Debug, Clone, Copy, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    bits: u8,
    value: u64,
}

/// A cell was combined with one of a different width, or a width outside
/// `1..=64` was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    #[error("incompatible cell widths: {0} and {1}")]
    WidthMismatch(u8, u8),
    #[error("cell width {0} out of range 1..={MAX_BITS}")]
    WidthOutOfRange(u8),
    #[error("division by zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, CellError>;

fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

impl Cell {
    /// Build a cell of the given width, reducing `value` modulo `2^bits`.
    pub fn new(value: i128, bits: u8) -> Self {
        assert!((1..=MAX_BITS).contains(&bits), "cell width out of range: {bits}");
        let modulus = 1i128 << bits;
        let reduced = value.rem_euclid(modulus);
        Cell { bits, value: reduced as u64 }
    }

    /// Zero of the given width.
    pub fn zero(bits: u8) -> Self {
        Cell::new(0, bits)
    }

    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Signed view in `[-2^(bits-1), 2^(bits-1))`.
    pub fn signed(self) -> i128 {
        let v = self.value as i128;
        let sign_bit = 1i128 << (self.bits - 1);
        if v & sign_bit != 0 {
            v - (1i128 << self.bits)
        } else {
            v
        }
    }

    /// Unsigned view in `[0, 2^bits)`.
    pub const fn unsigned(self) -> u128 {
        self.value as u128
    }

    fn check_compatible(self, other: Cell) -> Result<()> {
        if self.bits != other.bits {
            Err(CellError::WidthMismatch(self.bits, other.bits))
        } else {
            Ok(())
        }
    }

    /// `self + other`, wrapping modulo `2^bits`.
    pub fn add(self, other: Cell) -> Result<Cell> {
        self.check_compatible(other)?;
        Ok(Cell::new(self.signed() + other.signed(), self.bits))
    }

    /// `self - other`, wrapping modulo `2^bits`.
    pub fn sub(self, other: Cell) -> Result<Cell> {
        self.check_compatible(other)?;
        Ok(Cell::new(self.signed() - other.signed(), self.bits))
    }

    /// Signed multiply; low half of the unbounded product.
    pub fn smul(self, other: Cell) -> Result<Cell> {
        self.check_compatible(other)?;
        Ok(Cell::new(self.signed() * other.signed(), self.bits))
    }

    /// Unsigned multiply; low half of the unbounded product.
    pub fn umul(self, other: Cell) -> Result<Cell> {
        self.check_compatible(other)?;
        Ok(Cell::new(self.unsigned() as i128 * other.unsigned() as i128, self.bits))
    }

    /// Signed `(quotient, remainder)`, rounding toward zero; remainder
    /// inherits the sign of the dividend.
    pub fn sdivmod(self, other: Cell) -> Result<(Cell, Cell)> {
        self.check_compatible(other)?;
        let (a, b) = (self.signed(), other.signed());
        if b == 0 {
            return Err(CellError::DivisionByZero);
        }
        let q = a / b;
        let r = a - q * b;
        Ok((Cell::new(q, self.bits), Cell::new(r, self.bits)))
    }

    /// Unsigned `(quotient, remainder)`.
    pub fn udivmod(self, other: Cell) -> Result<(Cell, Cell)> {
        self.check_compatible(other)?;
        let (a, b) = (self.unsigned() as i128, other.unsigned() as i128);
        if b == 0 {
            return Err(CellError::DivisionByZero);
        }
        let q = a / b;
        let r = a - q * b;
        Ok((Cell::new(q, self.bits), Cell::new(r, self.bits)))
    }

    /// Lower-case hex, zero-padded to `bits / 4` digits. Requires `bits`
    /// divisible by 4.
    pub fn hex(self) -> String {
        assert_eq!(self.bits % 4, 0, "hex() requires a multiple of 4 bits");
        format!("{:0width$x}", self.value, width = (self.bits / 4) as usize)
    }

    /// Inverse of [`Cell::hex`]; width is `s.len() * 4`.
    pub fn from_hex(s: &str) -> Result<Cell> {
        let bits = (s.len() * 4) as u8;
        if bits == 0 || bits > MAX_BITS {
            return Err(CellError::WidthOutOfRange(bits));
        }
        let value = u64::from_str_radix(s, 16).map_err(|_| CellError::WidthOutOfRange(bits))?;
        Ok(Cell { bits, value })
    }

    /// Single bit at index `k`, little-endian (bit 0 is least significant).
    pub fn bit(self, k: u8) -> Cell {
        assert!(k < self.bits, "bit index {k} out of range for width {}", self.bits);
        Cell::new(((self.value >> k) & 1) as i128, 1)
    }

    /// Slice `[lo, hi)`, little-endian, yielding a cell of width `hi - lo`.
    pub fn slice(self, lo: u8, hi: u8) -> Cell {
        assert!(lo < hi && hi <= self.bits, "invalid slice {lo}..{hi} for width {}", self.bits);
        let width = hi - lo;
        let shifted = self.value >> lo;
        Cell { bits: width, value: shifted & mask(width) }
    }

    /// Split into a sequence of `chunk_bits`-wide cells. Requires
    /// `bits % chunk_bits == 0`.
    pub fn encode(self, chunk_bits: u8, endianess: Endianess) -> Result<Vec<Cell>> {
        if chunk_bits == 0 || self.bits % chunk_bits != 0 {
            return Err(CellError::WidthOutOfRange(chunk_bits));
        }
        let chunks: Vec<Cell> = (0..self.bits)
            .step_by(chunk_bits as usize)
            .map(|lo| self.slice(lo, lo + chunk_bits))
            .collect();
        Ok(match endianess {
            Endianess::Little => chunks,
            Endianess::Big => chunks.into_iter().rev().collect(),
        })
    }

    /// Recompose a sequence of cells into one cell of their combined width.
    pub fn decode(seq: &[Cell], endianess: Endianess) -> Cell {
        let ordered: Vec<Cell> = match endianess {
            Endianess::Little => seq.to_vec(),
            Endianess::Big => seq.iter().rev().copied().collect(),
        };
        let total_bits: u32 = ordered.iter().map(|c| c.bits as u32).sum();
        let mut value: u128 = 0;
        let mut shift = 0u32;
        for c in &ordered {
            value |= (c.unsigned()) << shift;
            shift += c.bits as u32;
        }
        Cell::new(value as i128, total_bits as u8)
    }

    /// Compare against a plain integer by matching residues modulo
    /// `2^bits`, the way the Python original allows `Cell == int`.
    pub fn eq_int(self, other: i128) -> bool {
        let modulus = 1i128 << self.bits;
        self.value as i128 == other.rem_euclid(modulus)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits && self.value == other.value
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.hex())
    }
}
