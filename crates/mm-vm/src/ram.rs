use mm_isa::HaltError;
use mm_types::{Cell, Endianess};
use tracing::warn;

pub const MAX_ADDRESS_BITS: u8 = 16;
pub const MAX_WORD_BITS: u8 = 64;

/// A single step's write-log entry: was the address already filled, the
/// old value (if any), the new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamWrite {
    pub was_filled: bool,
    pub old: Cell,
    pub new: Cell,
}

/// Random access memory: `2^address_bits` slots of `word_bits` each, with
/// filled-interval bookkeeping for the dumper and an optional per-step
/// write log for the debugger.
pub struct Ram {
    word_bits: u8,
    address_bits: u8,
    memory_size: u64,
    endianess: Endianess,
    protected: bool,
    table: Vec<u64>,
    filled: Vec<bool>,
    filled_intervals: Vec<(u64, u64)>,
    access_count: u64,
    write_log: Option<Vec<std::collections::HashMap<u64, RamWrite>>>,
}

impl Ram {
    pub fn new(word_bits: u8, address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        assert!(address_bits <= MAX_ADDRESS_BITS);
        assert!(word_bits <= MAX_WORD_BITS);
        let memory_size = 1u64 << address_bits;
        Ram {
            word_bits,
            address_bits,
            memory_size,
            endianess,
            protected,
            table: vec![0; memory_size as usize],
            filled: vec![false; memory_size as usize],
            filled_intervals: Vec::new(),
            access_count: 0,
            write_log: None,
        }
    }

    pub fn word_bits(&self) -> u8 {
        self.word_bits
    }

    pub fn address_bits(&self) -> u8 {
        self.address_bits
    }

    pub fn memory_size(&self) -> u64 {
        self.memory_size
    }

    pub fn endianess(&self) -> Endianess {
        self.endianess
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn filled_intervals(&self) -> &[(u64, u64)] {
        &self.filled_intervals
    }

    pub fn is_filled(&self, address: u64) -> bool {
        self.filled[address as usize]
    }

    /// Reads a filled word directly, bypassing the dirty-read policy and
    /// `access_count` bookkeeping. Used by the dumper, which only ever
    /// visits addresses already known to be filled.
    pub fn peek(&self, address: u64) -> Cell {
        Cell::new(self.table[address as usize] as i128, self.word_bits)
    }

    /// Enable per-step write logging; each call to [`Ram::begin_step`]
    /// pushes a fresh entry the debugger can inspect between steps.
    pub fn enable_write_log(&mut self) {
        self.write_log = Some(Vec::new());
    }

    pub fn begin_step(&mut self) {
        if let Some(log) = &mut self.write_log {
            log.push(std::collections::HashMap::new());
        }
    }

    pub fn write_log(&self) -> Option<&[std::collections::HashMap<u64, RamWrite>]> {
        self.write_log.as_deref()
    }

    fn fill_cell(&mut self, address: u64) {
        if self.filled[address as usize] {
            return;
        }
        self.filled[address as usize] = true;

        let pos = self
            .filled_intervals
            .iter()
            .position(|&(start, stop)| address == start.wrapping_sub(1) || address == stop);
        match pos {
            Some(i) => {
                let (start, stop) = self.filled_intervals[i];
                if address + 1 == start {
                    self.filled_intervals[i] = (address, stop);
                } else {
                    let mut new_stop = stop + 1;
                    if i + 1 < self.filled_intervals.len()
                        && new_stop == self.filled_intervals[i + 1].0
                    {
                        new_stop = self.filled_intervals[i + 1].1;
                        self.filled_intervals.remove(i + 1);
                    }
                    self.filled_intervals[i] = (start, new_stop);
                }
            }
            None => {
                let idx = self
                    .filled_intervals
                    .partition_point(|&(start, stop)| (start, stop) < (address, address + 1));
                self.filled_intervals.insert(idx, (address, address + 1));
            }
        }
    }

    fn get(&mut self, address: u64, from_cpu: bool) -> Result<Cell, HaltError> {
        if self.filled[address as usize] {
            return Ok(Cell::new(self.table[address as usize] as i128, self.word_bits));
        }
        if from_cpu {
            if self.protected {
                return Err(HaltError::RamAccessError(format!(
                    "cannot read memory by address: 0x{address:x}, it is dirty memory, clean it first"
                )));
            }
            warn!(
                address = format!("0x{address:x}"),
                "read memory by address, it is dirty memory, clean it first"
            );
        }
        Ok(Cell::zero(self.word_bits))
    }

    fn set(&mut self, address: u64, word: Cell) {
        assert_eq!(word.bits(), self.word_bits);
        if self.write_log.is_some() {
            let was_filled = self.filled[address as usize];
            let old = Cell::new(self.table[address as usize] as i128, self.word_bits);
            let log = self.write_log.as_mut().unwrap();
            if let Some(entry) = log.last_mut() {
                entry
                    .entry(address)
                    .and_modify(|w| w.new = word)
                    .or_insert(RamWrite { was_filled, old, new: word });
            }
        }
        self.table[address as usize] = word.unsigned() as u64;
        self.fill_cell(address);
    }

    /// Load `bits` (a multiple of `word_bits`) starting at `address`.
    pub fn fetch(&mut self, address: Cell, bits: u8, from_cpu: bool) -> Result<Cell, HaltError> {
        assert_eq!(address.bits(), self.address_bits);
        assert_eq!(bits % self.word_bits, 0);
        let words = (bits / self.word_bits) as u64;
        let addr = address.unsigned() as u64;
        if words + addr > self.memory_size {
            return Err(HaltError::RamAccessError(format!(
                "try to read {words} words from address 0x{addr:x} over memory size 0x{:x}",
                self.memory_size
            )));
        }
        if from_cpu {
            self.access_count += words;
        }
        let mut chunks = Vec::with_capacity(words as usize);
        for i in 0..words {
            chunks.push(self.get(addr + i, from_cpu)?);
        }
        Ok(Cell::decode(&chunks, self.endianess))
    }

    /// Store `value` (whose width is a multiple of `word_bits`) at `address`.
    pub fn put(&mut self, address: Cell, value: Cell, from_cpu: bool) -> Result<(), HaltError> {
        assert_eq!(address.bits(), self.address_bits);
        assert_eq!(value.bits() % self.word_bits, 0);
        let words = (value.bits() / self.word_bits) as u64;
        let addr = address.unsigned() as u64;
        if words + addr > self.memory_size {
            return Err(HaltError::RamAccessError(format!(
                "try to write {words} words from address 0x{addr:x} over memory size 0x{:x}",
                self.memory_size
            )));
        }
        if from_cpu {
            self.access_count += words;
        }
        let encoded = value.encode(self.word_bits, self.endianess).unwrap();
        for (i, word) in encoded.into_iter().enumerate() {
            self.set(addr + i as u64, word);
        }
        Ok(())
    }
}
