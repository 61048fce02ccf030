use std::collections::HashMap;

use mm_isa::RegisterName;
use mm_types::Cell;
use strum::IntoEnumIterator;

/// A single step's register write-log entry: the value before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub old: Cell,
    pub new: Cell,
}

/// Dense register bank indexed by [`RegisterName`]. Registers must be
/// declared with [`RegisterFile::add_register`] before they can be read or
/// written.
pub struct RegisterFile {
    table: [Option<Cell>; RegisterName::COUNT],
    write_log: Option<Vec<HashMap<RegisterName, RegisterWrite>>>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        RegisterFile { table: [None; RegisterName::COUNT], write_log: None }
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable_write_log(&mut self) {
        self.write_log = Some(Vec::new());
    }

    pub fn begin_step(&mut self) {
        if let Some(log) = &mut self.write_log {
            log.push(HashMap::new());
        }
    }

    pub fn write_log(&self) -> Option<&[HashMap<RegisterName, RegisterWrite>]> {
        self.write_log.as_deref()
    }

    /// Declare `name` with the given width. Idempotent if already declared
    /// with the same width; panics on a conflicting width, matching the
    /// Python original's `KeyError`.
    pub fn add_register(&mut self, name: RegisterName, bits: u8) {
        match self.table[name.index()] {
            None => self.table[name.index()] = Some(Cell::zero(bits)),
            Some(existing) => assert_eq!(
                existing.bits(),
                bits,
                "cannot add register {name} with {bits} bits, register with this name and {} bits already exists",
                existing.bits()
            ),
        }
    }

    pub fn contains(&self, name: RegisterName) -> bool {
        self.table[name.index()].is_some()
    }

    pub fn get(&self, name: RegisterName) -> Cell {
        self.table[name.index()].unwrap_or_else(|| panic!("{name} not found in register file"))
    }

    pub fn set(&mut self, name: RegisterName, value: Cell) {
        let current = self.get(name);
        assert_eq!(current.bits(), value.bits());
        if let Some(log) = &mut self.write_log {
            if let Some(entry) = log.last_mut() {
                entry.entry(name).and_modify(|w| w.new = value).or_insert(RegisterWrite {
                    old: current,
                    new: value,
                });
            }
        }
        self.table[name.index()] = Some(value);
    }

    /// Snapshot of every declared register, for debugger rendering.
    pub fn state(&self) -> HashMap<RegisterName, Cell> {
        RegisterName::iter().filter(|&name| self.contains(name)).map(|name| (name, self.get(name))).collect()
    }
}
