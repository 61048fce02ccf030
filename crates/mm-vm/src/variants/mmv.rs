//! mm-v: byte-addressable variant-length cousin of mm-2. Grounded on
//! `control_unit_v.py`.

use mm_isa::{HaltError, Opcode, RegisterName, OPCODE_BITS};
use mm_types::Endianess;

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;

pub struct MmV {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl MmV {
    pub fn new(address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        let ir_bits = OPCODE_BITS + 2 * address_bits;
        let ram = Ram::new(8, address_bits, endianess, protected);
        let mut registers = RegisterFile::new();
        registers.add_register(RegisterName::A1, address_bits);
        let alu = Alu::new(
            &mut registers,
            AluRegisters { r1: RegisterName::R1, r2: RegisterName::R2, s: RegisterName::R1, res: RegisterName::R2 },
            ir_bits,
            address_bits,
        );
        MmV { ram, registers, alu, failed: false }
    }
}

impl ControlUnit for MmV {
    fn name(&self) -> &'static str {
        "mm-v"
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
        OPCODE_BITS + 2 * self.ram.address_bits()
    }

    fn instruction_bits(&self, opcode: Opcode) -> u8 {
        let address_bits = self.ram.address_bits();
        if opcode == Opcode::HALT {
            OPCODE_BITS
        } else if opcode.is_jump() {
            OPCODE_BITS + address_bits
        } else {
            OPCODE_BITS + 2 * address_bits
        }
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    fn is_known_opcode(&self, opcode: Opcode) -> bool {
        opcode.is_arithmetic() || opcode.is_jump() || matches!(opcode, Opcode::HALT | Opcode::MOVE | Opcode::COMP)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let address_bits = self.ram.address_bits();
        let ir = self.ir();
        let a1 = ir.slice(address_bits, 2 * address_bits);
        let addr = ir.slice(0, address_bits);
        self.registers.set(RegisterName::A1, a1);
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let a1 = self.registers.get(RegisterName::A1);
        let addr = self.registers.get(RegisterName::Addr);
        if opcode == Opcode::MOVE {
            let r1 = self.ram.fetch(addr, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R1, r1);
        }
        if opcode.is_arithmetic() || opcode == Opcode::COMP {
            let r1 = self.ram.fetch(a1, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R1, r1);
            let r2 = self.ram.fetch(addr, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R2, r2);
        }
        if opcode.is_jump() {
            self.registers.set(RegisterName::Addr, a1);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::COMP {
            self.alu.sub(&mut self.registers);
        } else if opcode != Opcode::MOVE {
            self.common_execute(opcode)?;
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let a1 = self.registers.get(RegisterName::A1);
        if opcode.is_arithmetic() || opcode == Opcode::MOVE {
            self.ram.put(a1, self.registers.get(RegisterName::R1), true)?;
        }
        if opcode.is_dword_write_back() {
            let operand_words = self.alu.operand_bits() / self.ram.word_bits();
            let next = mm_types::Cell::new(a1.unsigned() as i128 + operand_words as i128, self.ram.address_bits());
            self.ram.put(next, self.registers.get(RegisterName::R2), true)?;
        }
        Ok(())
    }
}
