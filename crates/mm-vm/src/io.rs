//! Typed I/O slots: hex-source loading, decimal input parsing, signed
//! output formatting. Grounded on `original_source/modelmachine/io.py` and
//! the newer `ide/source.py::parse_io_dir`/`Cpu.input_req`/`output_req`
//! shape, adapted to the directive grammar in spec.md §6.1.

use std::io::{BufRead, Read};

use mm_isa::HaltError;
use mm_types::Cell;
use thiserror::Error;

use crate::control_unit::ControlUnit;
use crate::ram::Ram;

/// One declared `.input`/`.output` slot: an absolute RAM address plus an
/// optional human-readable label used as the default prompt/annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRequest {
    pub address: Cell,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum IoError {
    #[error("source length {0} is not a multiple of the word size in hex digits ({1})")]
    SourceLengthError(usize, u8),
    #[error("source of {0} words overruns memory of size {1}")]
    SourceOverrun(u64, u64),
    #[error("source at 0x{0:x} overlaps already-filled memory")]
    SourceOverlap(u64),
    #[error("not enough input tokens: expected one more for {0}")]
    NotEnoughInput(String),
    #[error("input token {0:?} is not an integer")]
    NotAnInteger(String),
    #[error("value {0} does not fit in {1} io bits")]
    ValueOutOfRange(i128, u8),
    #[error(transparent)]
    Halt(#[from] HaltError),
}

/// Stateless helper functions operating against a [`Ram`]/[`ControlUnit`];
/// `Cpu` owns the actual `input_requests`/`output_requests`/`enter` lists.
pub struct IoUnit;

impl IoUnit {
    /// `check_word`: `-2^(bits-1) <= v < 2^bits`, matching spec.md §4.6.
    pub fn check_word(v: i128, io_bits: u8) -> Result<(), IoError> {
        let half = 1i128 << (io_bits - 1);
        let ceiling = 1i128 << io_bits;
        if v >= -half && v < ceiling {
            Ok(())
        } else {
            Err(IoError::ValueOutOfRange(v, io_bits))
        }
    }

    /// Parses a stream of hex digits into `word_bits`-sized chunks and
    /// writes them at consecutive addresses starting at `address`, using
    /// RAM's configured endianess for symmetry with [`crate::dump::dump`].
    pub fn load_source(ram: &mut Ram, address: Cell, hex_string: &str) -> Result<(), IoError> {
        let digits_per_word = (ram.word_bits() / 4) as usize;
        let hex_string: String = hex_string.chars().filter(|c| !c.is_whitespace()).collect();
        if digits_per_word == 0 || hex_string.len() % digits_per_word != 0 {
            return Err(IoError::SourceLengthError(hex_string.len(), ram.word_bits()));
        }
        let words = hex_string.len() / digits_per_word;
        let start = address.unsigned() as u64;
        if start + words as u64 > ram.memory_size() {
            return Err(IoError::SourceOverrun(words as u64, ram.memory_size()));
        }
        for i in 0..words {
            let addr = start + i as u64;
            if ram.is_filled(addr) {
                return Err(IoError::SourceOverlap(addr));
            }
            let digits = &hex_string[i * digits_per_word..(i + 1) * digits_per_word];
            let word = Cell::from_hex(digits).map_err(|_| IoError::SourceLengthError(hex_string.len(), ram.word_bits()))?;
            ram.put(Cell::new(addr as i128, address.bits()), word, false)?;
        }
        Ok(())
    }

    /// Parses one signed decimal token from `tokens` and writes it at
    /// `request.address`.
    pub fn input(
        cu: &mut dyn ControlUnit,
        request: &IoRequest,
        tokens: &mut impl Iterator<Item = String>,
    ) -> Result<(), IoError> {
        let label = request.message.clone().unwrap_or_else(|| format!("0x{:x}", request.address.unsigned()));
        let token = tokens.next().ok_or_else(|| IoError::NotEnoughInput(label.clone()))?;
        let value: i128 = token.parse().map_err(|_| IoError::NotAnInteger(token.clone()))?;
        let io_bits = cu.ram().word_bits();
        Self::check_word(value, io_bits)?;
        let word = Cell::new(value, io_bits);
        cu.ram_mut().put(request.address, word, false)?;
        Ok(())
    }

    /// Reads one word at `request.address` and returns its signed value.
    pub fn output(cu: &mut dyn ControlUnit, request: &IoRequest) -> Result<i128, IoError> {
        let io_bits = cu.ram().word_bits();
        let word = cu.ram_mut().fetch(request.address, io_bits, false)?;
        Ok(word.signed())
    }

    /// Splits an `.enter`/stdin text blob into whitespace-separated tokens,
    /// the decimal source `input` reads from.
    pub fn tokenize(mut reader: impl BufRead) -> Vec<String> {
        let mut buf = String::new();
        let _ = reader.read_to_string(&mut buf);
        buf.split_whitespace().map(str::to_owned).collect()
    }
}
