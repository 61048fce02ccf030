//! RAM, register file, ALU, the eight modelmachine control units, the I/O
//! unit, the `Cpu` aggregate, the directive source front-end and the
//! memory-dump writer.

mod alu;
mod control_unit;
mod cpu;
mod debug;
mod dump;
mod io;
mod ram;
mod register_file;
mod source;
pub mod variants;

pub use alu::{Alu, AluRegisters, Comparison, Flag};
pub use control_unit::{ControlUnit, Status};
pub use cpu::{Cpu, Program};
pub use debug::Debugger;
pub use dump::dump;
pub use io::{IoError, IoRequest, IoUnit};
pub use ram::{Ram, RamWrite, MAX_ADDRESS_BITS, MAX_WORD_BITS};
pub use register_file::{RegisterFile, RegisterWrite};
pub use source::{parse_source, AsmBackend, AssembledBlock, SourceError};

use mm_types::Endianess;

/// Builds the control unit for a named variant with the CPU-family's
/// canonical word/address width, the way `original_source/modelmachine/
/// cpu/cpu.py::CONTROL_UNITS` maps a `.cpu` name onto a control unit class.
pub fn make_control_unit(
    name: &str,
    address_bits: u8,
    endianess: Endianess,
    protected: bool,
) -> Option<Box<dyn ControlUnit>> {
    use variants::{Mm0, Mm1, Mm2, Mm3, MmM, MmR, MmS, MmV};
    Some(match name {
        "mm-0" => Box::new(Mm0::new(address_bits, endianess, protected)),
        "mm-1" => Box::new(Mm1::new(address_bits, endianess, protected)),
        "mm-2" => Box::new(Mm2::new(address_bits, endianess, protected)),
        "mm-3" => Box::new(Mm3::new(address_bits, endianess, protected)),
        "mm-v" => Box::new(MmV::new(address_bits, endianess, protected)),
        "mm-s" => Box::new(MmS::new(address_bits, endianess, protected)),
        "mm-r" => Box::new(MmR::new(address_bits, endianess, protected)),
        "mm-m" => Box::new(MmM::new(address_bits, endianess, protected)),
        _ => return None,
    })
}

/// Default address width for every variant, matching
/// `original_source/modelmachine/cpu/cpu.py`'s per-CPU defaults: 16-bit
/// addresses for all eight variants in this family.
pub const DEFAULT_ADDRESS_BITS: u8 = 16;
