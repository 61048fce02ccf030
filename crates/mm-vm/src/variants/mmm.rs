//! mm-m: address-modification cousin of mm-r, adding an `addr` opcode that
//! computes an effective address from a base address plus a register
//! modifier. Grounded on `control_unit_m.py`, which subclasses
//! `control_unit_r.py` in the original; reuses mm-r's free helper functions
//! since Rust has no class inheritance to fall back on.

use mm_isa::{HaltError, Opcode, RegisterName};
use mm_types::{Cell, Endianess};

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;
use crate::variants::mmr::{expect_zero_m, general_register, ir_bits_for, is_one_word_opcode, m, r, r_next, REG_NO_BITS};

pub struct MmM {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl MmM {
    pub fn new(address_bits: u8, endianess: Endianess, protected: bool) -> Self {
        let ir_bits = ir_bits_for(address_bits);
        let ram = Ram::new(address_bits, address_bits, endianess, protected);
        let mut registers = RegisterFile::new();
        registers.add_register(RegisterName::R, REG_NO_BITS);
        registers.add_register(RegisterName::M, REG_NO_BITS);
        for reg_no in 0..16u8 {
            registers.add_register(general_register(reg_no), ir_bits);
        }
        let alu = Alu::new(
            &mut registers,
            AluRegisters { r1: RegisterName::S, r2: RegisterName::S1, s: RegisterName::S, res: RegisterName::S1 },
            ir_bits,
            address_bits,
        );
        MmM { ram, registers, alu, failed: false }
    }
}

impl ControlUnit for MmM {
    fn name(&self) -> &'static str {
        "mm-m"
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
        ir_bits_for(self.ram.address_bits())
    }

    fn instruction_bits(&self, opcode: Opcode) -> u8 {
        let word_bits = self.ram.word_bits();
        if is_one_word_opcode(opcode) {
            word_bits
        } else {
            2 * word_bits
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
            || opcode.is_register()
            || matches!(opcode, Opcode::HALT | Opcode::LOAD | Opcode::COMP | Opcode::STORE | Opcode::ADDR)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let address_bits = self.ram.address_bits();

        if opcode.is_jump() {
            // Unlike mm-r, mm-m address-modifies jumps through `M` too (decode
            // always folds `M` into the effective address below), so only the
            // `R` field is required to be zero here.
            self.expect_zero_range(address_bits + REG_NO_BITS, self.ir().bits() - mm_isa::OPCODE_BITS);
        }
        if opcode == Opcode::HALT {
            self.expect_zero_all();
        }

        let ir = self.ir();
        let r = ir.slice(address_bits + REG_NO_BITS, address_bits + 2 * REG_NO_BITS);
        let m = ir.slice(address_bits, address_bits + REG_NO_BITS);
        self.registers.set(RegisterName::R, r);
        self.registers.set(RegisterName::M, m);

        let m_reg = m(&self.registers);
        let modifier = if m_reg == RegisterName::R0 {
            Cell::new(0, address_bits)
        } else {
            let full = self.registers.get(m_reg);
            full.slice(0, address_bits)
        };
        let base = ir.slice(0, address_bits);
        let addr = base.add(modifier).expect("address and modifier share a width");
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode == Opcode::ADDR {
            let addr = self.registers.get(RegisterName::Addr);
            let s = Cell::new(addr.unsigned() as i128, self.alu.operand_bits());
            self.registers.set(RegisterName::S, s);
            return Ok(());
        }

        let addr = self.registers.get(RegisterName::Addr);
        if opcode.is_arithmetic() || matches!(opcode, Opcode::COMP | Opcode::LOAD) {
            let s1 = self.ram.fetch(addr, self.alu.operand_bits(), true)?;
            self.registers.set(RegisterName::S1, s1);
        }
        if opcode.is_register() {
            let m_reg = m(&self.registers);
            let s1 = self.registers.get(m_reg);
            self.registers.set(RegisterName::S1, s1);
        }
        if opcode.is_arithmetic()
            || opcode.is_register_arith()
            || matches!(opcode, Opcode::RCOMP | Opcode::COMP | Opcode::STORE)
        {
            let r_reg = r(&self.registers);
            let s = self.registers.get(r_reg);
            self.registers.set(RegisterName::S, s);
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if matches!(opcode, Opcode::COMP | Opcode::RCOMP | Opcode::SUB | Opcode::RSUB) {
            self.alu.sub(&mut self.registers);
        } else if opcode == Opcode::ADDR {
            // S is already set in load(); execute is a no-op here.
        } else if matches!(opcode, Opcode::LOAD | Opcode::RMOVE) {
            let s1 = self.registers.get(RegisterName::S1);
            self.registers.set(RegisterName::S, s1);
        } else if opcode == Opcode::RADD {
            self.alu.add(&mut self.registers);
        } else if opcode == Opcode::RUMUL {
            self.alu.umul(&mut self.registers);
        } else if opcode == Opcode::RUDIV {
            self.alu.udivmod(&mut self.registers)?;
        } else if opcode == Opcode::RSMUL {
            self.alu.smul(&mut self.registers);
        } else if opcode == Opcode::RSDIV {
            self.alu.sdivmod(&mut self.registers)?;
        } else if !matches!(opcode, Opcode::STORE) {
            self.common_execute(opcode)?;
        }
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        if opcode.is_arithmetic()
            || opcode.is_register_arith()
            || matches!(opcode, Opcode::LOAD | Opcode::RMOVE | Opcode::ADDR)
        {
            let r_reg = r(&self.registers);
            let s = self.registers.get(RegisterName::S);
            self.registers.set(r_reg, s);
        }
        if opcode.is_dword_write_back() || matches!(opcode, Opcode::RUDIV | Opcode::RSDIV) {
            let r_next_reg = r_next(&self.registers);
            let s1 = self.registers.get(RegisterName::S1);
            self.registers.set(r_next_reg, s1);
        }
        if opcode == Opcode::STORE {
            let addr = self.registers.get(RegisterName::Addr);
            self.ram.put(addr, self.registers.get(RegisterName::S), true)?;
        }
        Ok(())
    }
}
