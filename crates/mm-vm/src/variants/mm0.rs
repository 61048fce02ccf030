//! mm-0: a stack machine addressing its operands by a signed offset from
//! the stack pointer, and with PC-relative jumps. Grounded on
//! `control_unit_0.py` of the reference implementation.

use mm_isa::{HaltError, Opcode, RegisterName};
use mm_types::{Cell, Endianess};

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;

/// `push` lives at 0x40 on this variant; every other opcode below is a
/// shared mnemonic from [`mm_isa::Opcode`].
const PUSH: Opcode = Opcode(0x40);

const RELATIVE_BITS: u8 = 8;

pub struct Mm0 {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl Mm0 {
    pub fn new(address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        let ir_bits = RELATIVE_BITS + mm_isa::OPCODE_BITS;
        let ram = Ram::new(ir_bits, address_bits, endianess, protected);
        let mut registers = RegisterFile::new();
        registers.add_register(RegisterName::Sp, address_bits);
        registers.add_register(RegisterName::A1, RELATIVE_BITS);
        let alu = Alu::new(
            &mut registers,
            AluRegisters { r1: RegisterName::R1, r2: RegisterName::R2, s: RegisterName::R1, res: RegisterName::R2 },
            ir_bits,
            address_bits,
        );
        Mm0 { ram, registers, alu, failed: false }
    }

    fn stack_size(&self) -> u64 {
        let sp = self.registers.get(RegisterName::Sp);
        if sp.unsigned() == 0 {
            0
        } else {
            self.ram.memory_size() - sp.unsigned() as u64
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
        Ok(Cell::new(sp.unsigned() as i128 + 1, self.ram.address_bits()))
    }

    fn a_word_signed(&self) -> Cell {
        let a1 = self.registers.get(RegisterName::A1);
        Cell::new(a1.signed(), self.ram.word_bits())
    }

    fn a_word_unsigned(&self) -> Cell {
        let a1 = self.registers.get(RegisterName::A1);
        Cell::new(a1.unsigned() as i128, self.ram.word_bits())
    }

    fn stack_pointer_a(&self) -> Result<Cell, HaltError> {
        let a1 = self.registers.get(RegisterName::A1);
        if self.stack_size() <= a1.unsigned() as u64 {
            return Err(HaltError::StackAccessError(format!(
                "read outside stack; stack size={}",
                self.stack_size()
            )));
        }
        let sp = self.registers.get(RegisterName::Sp);
        Ok(Cell::new(sp.unsigned() as i128 + a1.unsigned() as i128, self.ram.address_bits()))
    }

    fn is_arith_family(opcode: Opcode) -> bool {
        opcode.is_arithmetic() || opcode == Opcode::COMP || opcode == Opcode::SSWAP || opcode == Opcode::DUP
    }
}

impl ControlUnit for Mm0 {
    fn name(&self) -> &'static str {
        "mm-0"
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
        RELATIVE_BITS + mm_isa::OPCODE_BITS
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
            || matches!(opcode, Opcode::HALT | Opcode::COMP | PUSH | Opcode::POP | Opcode::DUP | Opcode::SSWAP)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::HALT {
            self.expect_zero_all();
        }

        let ir = self.ir();
        let a1 = ir.slice(0, RELATIVE_BITS);
        self.registers.set(RegisterName::A1, a1);

        let pc = self.registers.get(RegisterName::Pc);
        let address_bits = self.ram.address_bits();
        let addr = Cell::new(pc.unsigned() as i128 + a1.signed() - 1, address_bits);
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == PUSH {
            self.registers.set(RegisterName::R1, self.a_word_signed());
        }
        if Self::is_arith_family(opcode) {
            let sp_a = self.stack_pointer_a()?;
            let r1 = self.ram.fetch(sp_a, self.alu.operand_bits(), true)?;
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
        } else if !matches!(opcode, PUSH | Opcode::POP | Opcode::DUP) {
            self.common_execute(opcode)?;
        }

        let address_bits = self.ram.address_bits();
        if opcode == Opcode::COMP {
            let sp = self.registers.get(RegisterName::Sp);
            self.registers.set(RegisterName::Sp, Cell::new(sp.unsigned() as i128 + 1, address_bits));
        } else if matches!(opcode, Opcode::SDIV | Opcode::UDIV | PUSH | Opcode::DUP) {
            let sp = self.registers.get(RegisterName::Sp);
            self.registers.set(RegisterName::Sp, Cell::new(sp.unsigned() as i128 - 1, address_bits));
        } else if opcode == Opcode::POP {
            let a1 = self.registers.get(RegisterName::A1);
            if self.stack_size() < a1.unsigned() as u64 {
                return Err(HaltError::StackAccessError(format!(
                    "pop too many elements from stack; stack size={}",
                    self.stack_size()
                )));
            }
            let sp = self.registers.get(RegisterName::Sp);
            self.registers.set(RegisterName::Sp, Cell::new(sp.unsigned() as i128 + a1.unsigned() as i128, address_bits));
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if matches!(opcode, Opcode::ADD | Opcode::SUB | Opcode::SMUL | Opcode::UMUL | PUSH | Opcode::DUP) {
            let sp = self.stack_pointer()?;
            self.ram.put(sp, self.registers.get(RegisterName::R1), true)?;
        }
        if opcode.is_dword_write_back() {
            let sp_next = self.stack_pointer_next()?;
            self.ram.put(sp_next, self.registers.get(RegisterName::R1), true)?;
            let sp = self.stack_pointer()?;
            self.ram.put(sp, self.registers.get(RegisterName::R2), true)?;
        }
        if opcode == Opcode::SSWAP {
            let sp_a = self.stack_pointer_a()?;
            self.ram.put(sp_a, self.registers.get(RegisterName::R1), true)?;
            let sp = self.stack_pointer()?;
            self.ram.put(sp, self.registers.get(RegisterName::R2), true)?;
        }
        Ok(())
    }
}
