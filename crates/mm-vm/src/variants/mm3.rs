//! mm-3: three-address machine with a distinct summator. Grounded on
//! `control_unit_3.py`.

use mm_isa::{HaltError, Opcode, RegisterName};
use mm_types::{Cell, Endianess};

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;

pub struct Mm3 {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl Mm3 {
    pub fn new(address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        let ir_bits = mm_isa::OPCODE_BITS + 3 * address_bits;
        let ram = Ram::new(ir_bits, address_bits, endianess, protected);
        let mut registers = RegisterFile::new();
        registers.add_register(RegisterName::A1, address_bits);
        registers.add_register(RegisterName::A2, address_bits);
        let alu = Alu::new(
            &mut registers,
            AluRegisters { r1: RegisterName::R1, r2: RegisterName::R2, s: RegisterName::S, res: RegisterName::R1 },
            ir_bits,
            address_bits,
        );
        Mm3 { ram, registers, alu, failed: false }
    }
}

impl ControlUnit for Mm3 {
    fn name(&self) -> &'static str {
        "mm-3"
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
        mm_isa::OPCODE_BITS + 3 * self.ram.address_bits()
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn set_failed(&mut self, failed: bool) {
        self.failed = failed;
    }

    fn is_known_opcode(&self, opcode: Opcode) -> bool {
        opcode.is_arithmetic() || opcode.is_jump() || matches!(opcode, Opcode::HALT | Opcode::MOVE)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let address_bits = self.ram.address_bits();
        if opcode == Opcode::JUMP {
            self.expect_zero_range(address_bits, 3 * address_bits);
        }
        if opcode == Opcode::HALT {
            self.expect_zero_all();
        }
        if opcode == Opcode::MOVE {
            self.expect_zero_range(address_bits, 2 * address_bits);
        }

        let ir = self.ir();
        let a1 = ir.slice(2 * address_bits, 3 * address_bits);
        let a2 = ir.slice(address_bits, 2 * address_bits);
        let addr = ir.slice(0, address_bits);
        self.registers.set(RegisterName::A1, a1);
        self.registers.set(RegisterName::A2, a2);
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let a1 = self.registers.get(RegisterName::A1);
        let a2 = self.registers.get(RegisterName::A2);
        let a3 = self.registers.get(RegisterName::Addr);

        if opcode == Opcode::MOVE {
            let s = self.ram.fetch(a1, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::S, s);
        }
        if opcode.is_arithmetic() || opcode.is_condjump() {
            let r1 = self.ram.fetch(a1, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R1, r1);
            let r2 = self.ram.fetch(a2, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::R2, r2);
        }
        if opcode.is_jump() {
            self.registers.set(RegisterName::Addr, a3);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode.is_condjump() {
            self.alu.sub(&mut self.registers);
        }
        if opcode != Opcode::MOVE {
            self.common_execute(opcode)?;
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let a3 = self.registers.get(RegisterName::Addr);
        if opcode.is_arithmetic() || opcode == Opcode::MOVE {
            self.ram.put(a3, self.registers.get(RegisterName::S), true)?;
        }
        if opcode.is_dword_write_back() {
            let operand_words = self.alu.operand_bits() / self.ram.word_bits();
            let next = Cell::new(a3.unsigned() as i128 + operand_words as i128, self.ram.address_bits());
            self.ram.put(next, self.registers.get(RegisterName::R1), true)?;
        }
        Ok(())
    }
}
