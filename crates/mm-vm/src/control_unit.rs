use mm_isa::{HaltError, Opcode, RegisterName, OPCODE_BITS};
use mm_types::Cell;
use tracing::{error, warn};

use crate::alu::{Alu, Comparison};
use crate::ram::Ram;
use crate::register_file::RegisterFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
}

/// Common fetch/execute skeleton shared by every CPU variant. Each variant
/// implements the five hooks (`decode`, `load`, `execute`, `write_back`,
/// `instruction_bits`); `step` and `run` are provided.
pub trait ControlUnit {
    fn name(&self) -> &'static str;
    fn ram(&self) -> &Ram;
    fn ram_mut(&mut self) -> &mut Ram;
    fn registers(&self) -> &RegisterFile;
    fn registers_mut(&mut self) -> &mut RegisterFile;
    fn alu(&self) -> Alu;
    fn ir_bits(&self) -> u8;
    fn failed(&self) -> bool;
    fn set_failed(&mut self, failed: bool);

    /// Whether `opcode` is decodable by this variant.
    fn is_known_opcode(&self, opcode: Opcode) -> bool;

    /// Total instruction width in bits for `opcode`. Defaults to a fixed
    /// `IR_BITS`; mm-v and mm-s override this for their variable layout.
    fn instruction_bits(&self, opcode: Opcode) -> u8 {
        let _ = opcode;
        self.ir_bits()
    }

    fn decode(&mut self) -> Result<(), HaltError>;
    fn load(&mut self) -> Result<(), HaltError>;

    /// Variant-specific dispatch. Implementations typically handle their
    /// own opcodes and fall back to [`common_execute`] for the shared
    /// arithmetic/jump/halt set.
    fn execute(&mut self) -> Result<(), HaltError>;
    fn write_back(&mut self) -> Result<(), HaltError>;

    fn ir(&self) -> Cell {
        self.registers().get(RegisterName::Ir)
    }

    fn opcode(&self) -> Result<Opcode, HaltError> {
        let ir = self.ir();
        let byte = ir.slice(ir.bits() - OPCODE_BITS, ir.bits()).unsigned() as u8;
        let opcode = Opcode(byte);
        if self.is_known_opcode(opcode) {
            Ok(opcode)
        } else {
            Err(HaltError::WrongOpcodeError(byte))
        }
    }

    /// Warn (without failing) if bits `[start, end)` of the IR (bit 0 is
    /// the least significant, same as [`Cell::slice`]) are non-zero.
    fn expect_zero_range(&self, start: u8, end: u8) {
        let ir = self.ir();
        let part = ir.slice(start, end);
        if part.unsigned() != 0 {
            warn!(
                opcode = %self.opcode().map(|o| o.name()).unwrap_or("?"),
                bits = format!("{start}:{end}"),
                ir = %ir,
                "expected zero bits; these bits will be ignored"
            );
        }
    }

    /// Warn if bits `[start, operand_bits)` are non-zero, where
    /// `operand_bits` is the IR width minus its opcode byte.
    fn expect_zero_from(&self, start: u8) {
        self.expect_zero_range(start, self.ir().bits() - OPCODE_BITS);
    }

    /// Warn if every operand bit (the whole IR excluding its opcode byte)
    /// is non-zero.
    fn expect_zero_all(&self) {
        self.expect_zero_from(0);
    }

    fn fetch(&mut self) -> Result<(), HaltError> {
        let address_bits = self.ram().address_bits();
        let word_bits = self.ram().word_bits();
        let pc = self.registers().get(RegisterName::Pc);

        let opcode_word = self.ram_mut().fetch(pc, word_bits, true)?;
        let opcode_byte = opcode_word.slice(word_bits - OPCODE_BITS, word_bits).unsigned() as u8;
        let opcode = Opcode(opcode_byte);
        if !self.is_known_opcode(opcode) {
            return Err(HaltError::WrongOpcodeError(opcode_byte));
        }

        let instruction_bits = self.instruction_bits(opcode);
        let additional_bits = instruction_bits - opcode_word.bits();
        let instruction = if additional_bits == 0 {
            opcode_word
        } else {
            let next = Cell::new(pc.unsigned() as i128 + 1, address_bits);
            let operands = self.ram_mut().fetch(next, additional_bits, true)?;
            Cell::new(
                ((opcode_word.unsigned() << additional_bits) | operands.unsigned()) as i128,
                instruction_bits,
            )
        };

        let ir_bits = self.ir_bits();
        self.registers_mut().set(
            RegisterName::Ir,
            Cell::new((instruction.unsigned() << (ir_bits - instruction_bits)) as i128, ir_bits),
        );

        let new_pc = Cell::new(
            pc.unsigned() as i128 + (instruction_bits / word_bits) as i128,
            address_bits,
        );
        self.registers_mut().set(RegisterName::Pc, new_pc);
        Ok(())
    }

    /// The shared dispatch table: halt, the four arithmetic ops, the two
    /// division ops, and the eleven jump/condjump forms. Variants call this
    /// from their own `execute` for every opcode they don't special-case.
    fn common_execute(&mut self, opcode: Opcode) -> Result<(), HaltError> {
        let alu = self.alu();
        let registers = self.registers_mut();
        match opcode {
            Opcode::HALT => alu.halt(registers),
            Opcode::ADD => alu.add(registers),
            Opcode::SUB => alu.sub(registers),
            Opcode::SMUL => alu.smul(registers),
            Opcode::UMUL => alu.umul(registers),
            Opcode::SDIV => alu.sdivmod(registers)?,
            Opcode::UDIV => alu.udivmod(registers)?,
            Opcode::JUMP => alu.jump(registers),
            Opcode::JEQ => alu.cond_jump(registers, false, Comparison::Equal, true),
            Opcode::JNEQ => alu.cond_jump(registers, false, Comparison::Equal, false),
            Opcode::SJL => alu.cond_jump(registers, true, Comparison::Less, false),
            Opcode::SJGEQ => alu.cond_jump(registers, true, Comparison::Greater, true),
            Opcode::SJLEQ => alu.cond_jump(registers, true, Comparison::Less, true),
            Opcode::SJG => alu.cond_jump(registers, true, Comparison::Greater, false),
            Opcode::UJL => alu.cond_jump(registers, false, Comparison::Less, false),
            Opcode::UJGEQ => alu.cond_jump(registers, false, Comparison::Greater, true),
            Opcode::UJLEQ => alu.cond_jump(registers, false, Comparison::Less, true),
            Opcode::UJG => alu.cond_jump(registers, false, Comparison::Greater, false),
            _ => return Err(HaltError::WrongOpcodeError(opcode.0)),
        }
        Ok(())
    }

    fn status(&self) -> Status {
        if self.alu().is_halted(self.registers()) {
            Status::Halted
        } else {
            Status::Running
        }
    }

    /// Run one instruction. Any `HaltError` raised along the way is caught,
    /// logged, and converted into a halt with `failed = true`.
    fn step(&mut self) {
        self.ram_mut().begin_step();
        self.registers_mut().begin_step();
        let result = (|| -> Result<(), HaltError> {
            self.fetch()?;
            self.decode()?;
            self.load()?;
            self.execute()?;
            self.write_back()
        })();
        if let Err(err) = result {
            error!(cpu = self.name(), %err, "instruction faulted, halting");
            self.set_failed(true);
            self.alu().halt(self.registers_mut());
        }
    }

    fn run(&mut self) {
        while self.status() == Status::Running {
            self.step();
        }
    }
}
