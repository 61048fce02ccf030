//! mm-s: byte-addressable, variable-length stack machine with 3-byte stack
//! slots. Grounded on `control_unit_s.py`.

use mm_isa::{HaltError, Opcode, RegisterName, OPCODE_BITS};
use mm_types::{Cell, Endianess};

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;

const ELEMENT_WORDS: i128 = 3;

pub struct MmS {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl MmS {
    pub fn new(address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        let ir_bits = OPCODE_BITS + address_bits;
        let ram = Ram::new(8, address_bits, endianess, protected);
        let mut registers = RegisterFile::new();
        registers.add_register(RegisterName::Sp, address_bits);
        let alu = Alu::new(
            &mut registers,
            AluRegisters { r1: RegisterName::R1, r2: RegisterName::R2, s: RegisterName::R1, res: RegisterName::R2 },
            ir_bits,
            address_bits,
        );
        MmS { ram, registers, alu, failed: false }
    }

    fn stack_size(&self) -> u64 {
        let sp = self.registers.get(RegisterName::Sp);
        if sp.unsigned() == 0 {
            0
        } else {
            (self.ram.memory_size() - sp.unsigned() as u64) / ELEMENT_WORDS as u64
        }
    }

    fn stack_pointer(&self) -> Result<Cell, HaltError> {
        if self.stack_size() == 0 {
            return Err(HaltError::StackAccessError(format!(
                "read outside stack; stack size={}",
                self.stack_size()
            )));
        }
        Ok(self.registers.get(RegisterName::Sp))
    }

    fn stack_pointer_next(&self) -> Result<Cell, HaltError> {
        if self.stack_size() <= 1 {
            return Err(HaltError::StackAccessError(format!(
                "read outside stack; stack size={}",
                self.stack_size()
            )));
        }
        let sp = self.registers.get(RegisterName::Sp);
        Ok(Cell::new(sp.unsigned() as i128 + ELEMENT_WORDS, self.ram.address_bits()))
    }

    fn opcodes_with_address(opcode: Opcode) -> bool {
        opcode.is_jump() || matches!(opcode, Opcode::PUSH | Opcode::POP)
    }
}

impl ControlUnit for MmS {
    fn name(&self) -> &'static str {
        "mm-s"
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
        OPCODE_BITS + self.ram.address_bits()
    }

    fn instruction_bits(&self, opcode: Opcode) -> u8 {
        if Self::opcodes_with_address(opcode) {
            OPCODE_BITS + self.ram.address_bits()
        } else {
            OPCODE_BITS
        }
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
            || matches!(opcode, Opcode::HALT | Opcode::COMP | Opcode::PUSH | Opcode::POP | Opcode::DUP | Opcode::SSWAP)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let address_bits = self.ram.address_bits();
        let addr = self.ir().slice(0, address_bits);
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let addr = self.registers.get(RegisterName::Addr);

        if opcode == Opcode::PUSH {
            let r1 = self.ram.fetch(addr, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R1, r1);
        }
        if matches!(opcode, Opcode::POP | Opcode::DUP) {
            let sp = self.stack_pointer()?;
            let r1 = self.ram.fetch(sp, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R1, r1);
        }
        if opcode.is_arithmetic() || matches!(opcode, Opcode::COMP | Opcode::SSWAP) {
            let sp_next = self.stack_pointer_next()?;
            let r1 = self.ram.fetch(sp_next, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R1, r1);
            let sp = self.stack_pointer()?;
            let r2 = self.ram.fetch(sp, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R2, r2);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::COMP {
            self.alu.sub(&mut self.registers);
        } else if opcode == Opcode::SSWAP {
            self.alu.swap(&mut self.registers);
        } else if !matches!(opcode, Opcode::PUSH | Opcode::POP | Opcode::DUP) {
            self.common_execute(opcode)?;
        }

        let address_bits = self.ram.address_bits();
        let sp = self.registers.get(RegisterName::Sp);
        if opcode == Opcode::COMP {
            self.registers.set(RegisterName::Sp, Cell::new(sp.unsigned() as i128 + 2 * ELEMENT_WORDS, address_bits));
        } else if matches!(opcode, Opcode::ADD | Opcode::SUB | Opcode::SMUL | Opcode::UMUL | Opcode::POP) {
            self.registers.set(RegisterName::Sp, Cell::new(sp.unsigned() as i128 + ELEMENT_WORDS, address_bits));
        } else if matches!(opcode, Opcode::PUSH | Opcode::DUP) {
            self.registers.set(RegisterName::Sp, Cell::new(sp.unsigned() as i128 - ELEMENT_WORDS, address_bits));
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::POP {
            let addr = self.registers.get(RegisterName::Addr);
            self.ram.put(addr, self.registers.get(RegisterName::R1), true)?;
        }
        if matches!(opcode, Opcode::ADD | Opcode::SUB | Opcode::SMUL | Opcode::UMUL | Opcode::PUSH | Opcode::DUP) {
            let sp = self.stack_pointer()?;
            self.ram.put(sp, self.registers.get(RegisterName::R1), true)?;
        }
        if opcode.is_dword_write_back() || opcode == Opcode::SSWAP {
            let sp_next = self.stack_pointer_next()?;
            self.ram.put(sp_next, self.registers.get(RegisterName::R1), true)?;
            let sp = self.stack_pointer()?;
            self.ram.put(sp, self.registers.get(RegisterName::R2), true)?;
        }
        Ok(())
    }
}
