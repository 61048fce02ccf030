use mm_isa::{HaltError, RegisterName};
use mm_types::Cell;

use crate::register_file::RegisterFile;

/// A single bit in the `FLAGS` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flag {
    Cf = 1 << 0,
    Of = 1 << 1,
    Sf = 1 << 2,
    Zf = 1 << 3,
    Halt = 1 << 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
}

/// Maps the ALU's abstract operand slots onto concrete register-file
/// names. Different CPU variants alias these differently: mm-1's
/// accumulator `S` plays both `R1` and `S`, while mm-3 keeps a distinct
/// summator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluRegisters {
    pub r1: RegisterName,
    pub r2: RegisterName,
    pub s: RegisterName,
    pub res: RegisterName,
}

/// Flag-producing arithmetic, jump and comparison unit. Operates only on
/// the register-file slots named by its [`AluRegisters`] mapping. Holds no
/// state of its own beyond that configuration, so it is `Copy` and taken by
/// value: a control unit can read it out of `self` and still mutably borrow
/// its register file in the same expression.
#[derive(Debug, Clone, Copy)]
pub struct Alu {
    operand_bits: u8,
    address_bits: u8,
    regs: AluRegisters,
}

impl Alu {
    pub fn new(registers: &mut RegisterFile, regs: AluRegisters, operand_bits: u8, address_bits: u8) -> Self {
        for name in [regs.r1, regs.r2, regs.s, regs.res] {
            registers.add_register(name, operand_bits);
        }
        registers.add_register(RegisterName::Flags, operand_bits);
        registers.add_register(RegisterName::Pc, address_bits);
        registers.add_register(RegisterName::Addr, address_bits);
        Alu { operand_bits, address_bits, regs }
    }

    pub fn operand_bits(&self) -> u8 {
        self.operand_bits
    }

    pub fn alu_registers(&self) -> AluRegisters {
        self.regs
    }

    fn set_flags(self, registers: &mut RegisterFile, signed: i128, unsigned: i128) {
        let s = registers.get(self.regs.s);
        let mut flags = 0u64;
        if s.signed() == 0 {
            flags |= Flag::Zf as u64;
        }
        if s.signed() < 0 {
            flags |= Flag::Sf as u64;
        }
        if s.signed() != signed {
            flags |= Flag::Of as u64;
        }
        if s.unsigned() as i128 != unsigned {
            flags |= Flag::Cf as u64;
        }
        registers.set(RegisterName::Flags, Cell::new(flags as i128, self.operand_bits));
    }

    fn flags(self, registers: &RegisterFile) -> u64 {
        registers.get(RegisterName::Flags).unsigned() as u64
    }

    fn flag(self, registers: &RegisterFile, flag: Flag) -> bool {
        self.flags(registers) & flag as u64 != 0
    }

    pub fn add(self, registers: &mut RegisterFile) {
        let (r1, r2) = (registers.get(self.regs.r1), registers.get(self.regs.r2));
        let signed = r1.signed() + r2.signed();
        let unsigned = r1.unsigned() as i128 + r2.unsigned() as i128;
        let result = r1.add(r2).expect("alu operands share a width");
        registers.set(self.regs.s, result);
        self.set_flags(registers, signed, unsigned);
    }

    pub fn sub(self, registers: &mut RegisterFile) {
        let (r1, r2) = (registers.get(self.regs.r1), registers.get(self.regs.r2));
        let signed = r1.signed() - r2.signed();
        let unsigned = r1.unsigned() as i128 - r2.unsigned() as i128;
        let result = r1.sub(r2).expect("alu operands share a width");
        registers.set(self.regs.s, result);
        self.set_flags(registers, signed, unsigned);
    }

    pub fn smul(self, registers: &mut RegisterFile) {
        let (r1, r2) = (registers.get(self.regs.r1), registers.get(self.regs.r2));
        let signed = r1.signed() * r2.signed();
        let unsigned = r1.unsigned() as i128 * r2.unsigned() as i128;
        let result = r1.smul(r2).expect("alu operands share a width");
        registers.set(self.regs.s, result);
        self.set_flags(registers, signed, unsigned);
    }

    pub fn umul(self, registers: &mut RegisterFile) {
        let (r1, r2) = (registers.get(self.regs.r1), registers.get(self.regs.r2));
        let signed = r1.signed() * r2.signed();
        let unsigned = r1.unsigned() as i128 * r2.unsigned() as i128;
        let result = r1.umul(r2).expect("alu operands share a width");
        registers.set(self.regs.s, result);
        self.set_flags(registers, signed, unsigned);
    }

    pub fn sdivmod(self, registers: &mut RegisterFile) -> Result<(), HaltError> {
        let (r1, r2) = (registers.get(self.regs.r1), registers.get(self.regs.r2));
        let (q, r) = r1.sdivmod(r2).map_err(|_| HaltError::AluZeroDivisionError)?;
        let unsigned = r1
            .udivmod(r2)
            .map(|(uq, _)| uq.unsigned() as i128)
            .unwrap_or(q.unsigned() as i128);
        registers.set(self.regs.s, q);
        registers.set(self.regs.res, r);
        self.set_flags(registers, q.signed(), unsigned);
        Ok(())
    }

    pub fn udivmod(self, registers: &mut RegisterFile) -> Result<(), HaltError> {
        let (r1, r2) = (registers.get(self.regs.r1), registers.get(self.regs.r2));
        let (q, r) = r1.udivmod(r2).map_err(|_| HaltError::AluZeroDivisionError)?;
        let signed = r1
            .sdivmod(r2)
            .map(|(sq, _)| sq.signed())
            .unwrap_or(q.unsigned() as i128);
        registers.set(self.regs.s, q);
        registers.set(self.regs.res, r);
        self.set_flags(registers, signed, q.unsigned() as i128);
        Ok(())
    }

    pub fn swap(self, registers: &mut RegisterFile) {
        let (s, res) = (registers.get(self.regs.s), registers.get(self.regs.res));
        registers.set(self.regs.s, res);
        registers.set(self.regs.res, s);
    }

    pub fn jump(self, registers: &mut RegisterFile) {
        let addr = registers.get(RegisterName::Addr);
        registers.set(RegisterName::Pc, Cell::new(addr.unsigned() as i128, self.address_bits));
    }

    pub fn cond_jump(self, registers: &mut RegisterFile, signed: bool, comp: Comparison, equal: bool) {
        let s = self.flag(registers, Flag::Sf) != self.flag(registers, Flag::Of);
        let z = self.flag(registers, Flag::Zf);
        let c = self.flag(registers, Flag::Cf);

        let taken = match comp {
            Comparison::Equal => {
                if equal {
                    z
                } else {
                    !z
                }
            }
            Comparison::Less => {
                let hi = if signed { s } else { c };
                if equal {
                    hi || z
                } else {
                    hi
                }
            }
            Comparison::Greater => {
                let hi = if signed { s } else { c };
                if equal {
                    !hi
                } else {
                    !hi && !z
                }
            }
        };

        if taken {
            self.jump(registers);
        }
    }

    pub fn halt(self, registers: &mut RegisterFile) {
        registers.set(RegisterName::Flags, Cell::new(Flag::Halt as i128, self.operand_bits));
    }

    pub fn is_halted(self, registers: &RegisterFile) -> bool {
        self.flag(registers, Flag::Halt)
    }
}
