//! mm-r: 16-register machine with opcode-selected register/memory operand
//! forms. Grounded on `control_unit_r.py`.

use mm_isa::{HaltError, Opcode, RegisterName, OPCODE_BITS};
use mm_types::Endianess;

use crate::alu::{Alu, AluRegisters};
use crate::control_unit::ControlUnit;
use crate::ram::Ram;
use crate::register_file::RegisterFile;

pub const REG_NO_BITS: u8 = 4;

pub fn ir_bits_for(address_bits: u8) -> u8 {
    OPCODE_BITS + 2 * REG_NO_BITS + address_bits
}

pub fn is_one_word_opcode(opcode: Opcode) -> bool {
    opcode.is_register() || opcode == Opcode::HALT
}

pub fn expect_zero_m(opcode: Opcode) -> bool {
    opcode.is_arithmetic() || matches!(opcode, Opcode::COMP | Opcode::LOAD | Opcode::STORE)
}

pub fn r(registers: &RegisterFile) -> RegisterName {
    general_register(registers.get(RegisterName::R).unsigned() as u8)
}

pub fn r_next(registers: &RegisterFile) -> RegisterName {
    let reg_no = registers.get(RegisterName::R).unsigned() as u8;
    general_register(reg_no.wrapping_add(1) & 0x0f)
}

pub fn m(registers: &RegisterFile) -> RegisterName {
    general_register(registers.get(RegisterName::M).unsigned() as u8)
}

/// Maps a 4-bit register number onto `R0..=RF`.
pub fn general_register(reg_no: u8) -> RegisterName {
    match reg_no & 0x0f {
        0x0 => RegisterName::R0,
        0x1 => RegisterName::R1,
        0x2 => RegisterName::R2,
        0x3 => RegisterName::R3,
        0x4 => RegisterName::R4,
        0x5 => RegisterName::R5,
        0x6 => RegisterName::R6,
        0x7 => RegisterName::R7,
        0x8 => RegisterName::R8,
        0x9 => RegisterName::R9,
        0xA => RegisterName::Ra,
        0xB => RegisterName::Rb,
        0xC => RegisterName::Rc,
        0xD => RegisterName::Rd,
        0xE => RegisterName::Re,
        _ => RegisterName::Rf,
    }
}

pub struct MmR {
    ram: Ram,
    registers: RegisterFile,
    alu: Alu,
    failed: bool,
}

impl MmR {
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
        MmR { ram, registers, alu, failed: false }
    }
}

impl ControlUnit for MmR {
    fn name(&self) -> &'static str {
        "mm-r"
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
            || matches!(opcode, Opcode::HALT | Opcode::LOAD | Opcode::COMP | Opcode::STORE)
    }

    fn decode(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
        let address_bits = self.ram.address_bits();

        if expect_zero_m(opcode) {
            self.expect_zero_range(address_bits, address_bits + REG_NO_BITS);
        }
        if opcode.is_jump() {
            self.expect_zero_from(address_bits);
        }
        if opcode == Opcode::HALT {
            self.expect_zero_all();
        }

        let ir = self.ir();
        let r = ir.slice(address_bits + REG_NO_BITS, address_bits + 2 * REG_NO_BITS);
        let m = ir.slice(address_bits, address_bits + REG_NO_BITS);
        let addr = ir.slice(0, address_bits);
        self.registers.set(RegisterName::R, r);
        self.registers.set(RegisterName::M, m);
        self.registers.set(RegisterName::Addr, addr);
        Ok(())
    }

    fn load(&mut self) -> Result<(), HaltError> {
        let opcode = self.opcode()?;
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
        if opcode.is_arithmetic() || opcode.is_register_arith() || matches!(opcode, Opcode::LOAD | Opcode::RMOVE) {
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
