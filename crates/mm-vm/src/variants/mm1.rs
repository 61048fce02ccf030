//! mm-1: single-address accumulator machine. Grounded on
//! `control_unit_1.py`.

use mm_isa::{HaltError, Opcode, RegisterName};
use mm_types::Endianess;

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;

pub struct Mm1 {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl Mm1 {
    pub fn new(address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        let ir_bits = mm_isa::OPCODE_BITS + address_bits;
        let ram = Ram::new(ir_bits, address_bits, endianess, protected);
        let mut registers = RegisterFile::new();
        let alu = Alu::new(
            &mut registers,
            AluRegisters { r1: RegisterName::S, r2: RegisterName::R, s: RegisterName::S, res: RegisterName::S1 },
            ir_bits,
            address_bits,
        );
        Mm1 { ram, registers, alu, failed: false }
    }
}

impl ControlUnit for Mm1 {
    fn name(&self) -> &'static str {
        "mm-1"
    }

    fn ram(&self) -> &Ram {
        &self.ram
    }

    fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    fn alu(&self) -> Alu {
        self.alu
    }

    fn ir_bits(&self) -> u8 {
        mm_isa::OPCODE_BITS + self.ram.address_bits()
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    fn is_known_opcode(&self, opcode: Opcode) -> bool {
        opcode.is_arithmetic()
            || opcode.is_jump()
            || matches!(opcode, Opcode::HALT | Opcode::LOAD | Opcode::COMP | Opcode::STORE | Opcode::SWAP)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if matches!(opcode, Opcode::SWAP | Opcode::HALT) {
            self.expect_zero_all();
        }
        let address_bits = self.ram.address_bits();
        let addr = self.ir().slice(0, address_bits);
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let addr = self.registers.get(RegisterName::Addr);
        if opcode.is_arithmetic() || opcode == Opcode::COMP {
            let r = self.ram.fetch(addr, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R, r);
        }
        if opcode == Opcode::LOAD {
            let s = self.ram.fetch(addr, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::S, s);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::COMP {
            let saved_s = self.registers.get(RegisterName::S);
            self.alu.sub(&mut self.registers);
            self.registers.set(RegisterName::S, saved_s);
        } else if opcode == Opcode::SWAP {
            self.alu.swap(&mut self.registers);
        } else if !matches!(opcode, Opcode::LOAD | Opcode::STORE) {
            self.common_execute(opcode)?;
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::STORE {
            let addr = self.registers.get(RegisterName::Addr);
            self.ram.put(addr, self.registers.get(RegisterName::S), true)?;
        }
        Ok(())
    }
}
