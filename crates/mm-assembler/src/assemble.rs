//! Two-pass assembler: pass one walks the parsed lines building a label
//! table and an address for every instruction/`.word`; pass two resolves
//! every operand against that table and packs the final bits, grounded
//! bit-for-bit on each control unit's own `decode()` (see
//! `mm-isa::layout`), not on the stale `Operand(...)` literals in
//! `original_source/modelmachine/ide/asm/opcode_table/*.py`.
//!
//! A bare label in an immediate field is rejected: it's almost always a
//! mistake (an address used where a literal was meant). `.imm(label)`
//! opts in explicitly, taking the label's resolved address as the literal.

use std::collections::HashMap;

use mm_isa::{FieldKind, FieldSpec};
use mm_types::{Cell, Endianess};
use mm_vm::{AsmBackend, AssembledBlock, ControlUnit};

use crate::ast::{InstructionAst, Label, LineBody, OperandAst, ParsedLine, Value};
use crate::error::AsmError;
use crate::parse::parse_source as parse_pest;

fn label_key(label: &Label, scope: &Option<String>) -> Result<String, AsmError> {
    match label {
        Label::Global(name) => Ok(name.clone()),
        Label::Scoped(scope, name) => Ok(format!("{scope}.{name}")),
        Label::Local(name) => match scope {
            Some(scope) => Ok(format!("{scope}.{name}")),
            None => Err(AsmError::UnexpectedLocalLabel(name.clone())),
        },
    }
}

enum QueuedLine {
    Instruction { address: u64, ast: InstructionAst, scope: Option<String> },
    Word { values: Vec<Value>, scope: Option<String> },
}

struct Layout {
    labels: HashMap<String, u64>,
    queue: Vec<QueuedLine>,
}

fn lay_out(lines: Vec<ParsedLine>, cpu_name: &str, address_bits: u8, word_bits: u8) -> Result<Layout, AsmError> {
    let mut labels = HashMap::new();
    let mut queue = Vec::new();
    let mut scope: Option<String> = None;
    let mut pc: u64 = 0;

    for parsed in lines {
        for label in &parsed.labels {
            if let Label::Global(name) = label {
                if labels.contains_key(name.as_str()) {
                    return Err(AsmError::DuplicateLabel(name.clone()));
                }
            }
            let key = label_key(label, &scope)?;
            if labels.contains_key(&key) {
                return Err(AsmError::DuplicateLabel(key));
            }
            labels.insert(key, pc);
            if let Label::Global(name) = label {
                scope = Some(name.clone());
            }
        }

        match parsed.body {
            None => {}
            Some(LineBody::Word(values, _line)) => {
                let len = values.len() as u64;
                queue.push(QueuedLine::Word { values, scope: scope.clone() });
                pc += len;
            }
            Some(LineBody::Instruction(ast)) => {
                let opcode = mm_isa::opcode_for_mnemonic(cpu_name, &ast.mnemonic)
                    .ok_or_else(|| AsmError::UnknownMnemonic(ast.mnemonic.clone(), cpu_name.to_string()))?;
                let bits = mm_isa::instruction_bits(cpu_name, opcode, address_bits)
                    .ok_or_else(|| AsmError::UnknownCpu(cpu_name.to_string()))?;
                let words = (bits as u64).div_ceil(word_bits as u64);
                queue.push(QueuedLine::Instruction { address: pc, ast, scope: scope.clone() });
                pc += words;
            }
        }
    }

    Ok(Layout { labels, queue })
}

fn resolve_address(value: &Value, labels: &HashMap<String, u64>, scope: &Option<String>) -> Result<u64, AsmError> {
    match value {
        Value::Int(v) => Ok(*v as u64),
        Value::Label(label) => {
            let key = label_key(label, scope)?;
            labels.get(&key).copied().ok_or_else(|| AsmError::UndefinedLabel(key))
        }
    }
}

fn mask_to_width(value: i128, width: u8) -> u128 {
    let mask = if width >= 127 { u128::MAX } else { (1u128 << width) - 1 };
    (value as u128) & mask
}

#[allow(clippy::too_many_arguments)]
fn encode_field(
    field: FieldSpec,
    value: &Value,
    reg: Option<u8>,
    this_addr: u64,
    words: u64,
    labels: &HashMap<String, u64>,
    scope: &Option<String>,
    source: &str,
    forced_immediate: bool,
) -> Result<u128, AsmError> {
    match field.kind {
        FieldKind::Register => Ok(mask_to_width(reg.unwrap_or(0) as i128, field.width())),
        FieldKind::Absolute => {
            let addr = resolve_address(value, labels, scope)?;
            Ok(mask_to_width(addr as i128, field.width()))
        }
        FieldKind::PcRelative => {
            let target = resolve_address(value, labels, scope)?;
            let next_pc = this_addr + words;
            let rel = target as i128 - next_pc as i128 + 1;
            let half = 1i128 << (field.width() - 1);
            if rel < -half || rel >= (1i128 << field.width()) {
                return Err(AsmError::TooLongJump(source.to_string(), field.width()));
            }
            Ok(mask_to_width(rel, field.width()))
        }
        FieldKind::ImmediateSigned => {
            // `.imm(label)` embeds the label's resolved address as the literal.
            let v = match (value, forced_immediate) {
                (Value::Int(v), _) => *v,
                (Value::Label(_), true) => resolve_address(value, labels, scope)? as i128,
                (Value::Label(_), false) => {
                    return Err(AsmError::Syntax(format!(
                        "{source}: expected a literal immediate, found a label (wrap it in .imm(...) to use its address)"
                    )))
                }
            };
            let half = 1i128 << (field.width() - 1);
            if v < -half || v >= (1i128 << field.width()) {
                return Err(AsmError::TooLongImmediate(v, field.width()));
            }
            Ok(mask_to_width(v, field.width()))
        }
        FieldKind::ImmediateUnsigned => {
            let v = match (value, forced_immediate) {
                (Value::Int(v), _) => *v,
                (Value::Label(_), true) => resolve_address(value, labels, scope)? as i128,
                (Value::Label(_), false) => {
                    return Err(AsmError::Syntax(format!(
                        "{source}: expected a literal immediate, found a label (wrap it in .imm(...) to use its address)"
                    )))
                }
            };
            if v < 0 || v >= (1i128 << field.width()) {
                return Err(AsmError::TooLongImmediate(v, field.width()));
            }
            Ok(mask_to_width(v, field.width()))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn encode_instruction(
    cpu_name: &str,
    address_bits: u8,
    word_bits: u8,
    endianess: Endianess,
    address: u64,
    ast: &InstructionAst,
    labels: &HashMap<String, u64>,
    scope: &Option<String>,
) -> Result<Vec<Cell>, AsmError> {
    let opcode = mm_isa::opcode_for_mnemonic(cpu_name, &ast.mnemonic)
        .ok_or_else(|| AsmError::UnknownMnemonic(ast.mnemonic.clone(), cpu_name.to_string()))?;
    let fields = mm_isa::operand_fields(cpu_name, opcode, address_bits)
        .ok_or_else(|| AsmError::UnknownCpu(cpu_name.to_string()))?;
    let groups = mm_isa::operand_group_sizes(cpu_name, opcode);
    let instr_bits = mm_isa::instruction_bits(cpu_name, opcode, address_bits).expect("checked above");
    let full_bits = mm_isa::full_ir_bits(cpu_name, address_bits).expect("checked above");
    let shift = full_bits - instr_bits;
    let words = (instr_bits as u64).div_ceil(word_bits as u64);

    if ast.operands.len() != groups.len() {
        return Err(AsmError::OperandCount(ast.mnemonic.clone(), groups.len(), ast.operands.len()));
    }

    let mut raw: u128 = (opcode.0 as u128) << (instr_bits - mm_isa::OPCODE_BITS);
    let mut field_idx = 0usize;
    for (operand, group_size) in ast.operands.iter().zip(groups.iter()) {
        let group_fields = &fields[field_idx..field_idx + group_size];
        match (*group_size, operand) {
            (1, OperandAst::Register(n)) => {
                let field = group_fields[0];
                let v = encode_field(field, &Value::Int(0), Some(*n), address, words, labels, scope, &ast.source, false)?;
                raw |= v << (field.lo - shift);
            }
            (1, OperandAst::Value(value)) => {
                let field = group_fields[0];
                let v = encode_field(field, value, None, address, words, labels, scope, &ast.source, false)?;
                raw |= v << (field.lo - shift);
            }
            (1, OperandAst::Immediate(value)) => {
                let field = group_fields[0];
                let v = encode_field(field, value, None, address, words, labels, scope, &ast.source, true)?;
                raw |= v << (field.lo - shift);
            }
            (2, OperandAst::Indexed(value, reg)) => {
                let addr_field = group_fields[0];
                let reg_field = group_fields[1];
                let av = encode_field(addr_field, value, None, address, words, labels, scope, &ast.source, false)?;
                raw |= av << (addr_field.lo - shift);
                let rv =
                    encode_field(reg_field, &Value::Int(0), Some(*reg), address, words, labels, scope, &ast.source, false)?;
                raw |= rv << (reg_field.lo - shift);
            }
            (2, OperandAst::Value(value)) => {
                // Bare address with no `[rN]`: treat as unmodified (r0).
                let addr_field = group_fields[0];
                let av = encode_field(addr_field, value, None, address, words, labels, scope, &ast.source, false)?;
                raw |= av << (addr_field.lo - shift);
            }
            _ => {
                return Err(AsmError::ExpectedAddress(format!("{operand:?}")));
            }
        }
        field_idx += group_size;
    }

    Ok(Cell::new(raw as i128, instr_bits).encode(word_bits, endianess).expect("instr_bits is a multiple of word_bits"))
}

/// The `mm-vm`-facing two-pass assembler. Stateless: one instance serves
/// every `.asm` block `mm-vm::source` hands it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Assembler;

impl Assembler {
    pub fn new() -> Self {
        Assembler
    }

    pub fn assemble_for(&self, cpu_name: &str, address_bits: u8, word_bits: u8, endianess: Endianess, source: &str) -> Result<AssembledBlock, AsmError> {
        let lines = parse_pest(source)?;
        let layout = lay_out(lines, cpu_name, address_bits, word_bits)?;

        let mut hex = String::new();
        let mut comments = HashMap::new();
        // queue is already in ascending address order (single linear pass).
        for item in &layout.queue {
            match item {
                QueuedLine::Word { values, scope } => {
                    for value in values {
                        let v = match value {
                            Value::Int(v) => *v,
                            Value::Label(_) => resolve_address(value, &layout.labels, scope)? as i128,
                        };
                        hex.push_str(&Cell::new(v, word_bits).hex());
                    }
                }
                QueuedLine::Instruction { address, ast, scope } => {
                    let words =
                        encode_instruction(cpu_name, address_bits, word_bits, endianess, *address, ast, &layout.labels, scope)?;
                    for word in &words {
                        hex.push_str(&word.hex());
                    }
                    comments.insert(*address, ast.source.clone());
                }
            }
        }
        Ok(AssembledBlock { hex, comments })
    }
}

impl AsmBackend for Assembler {
    fn assemble(&self, cu: &dyn ControlUnit, source: &str) -> Result<AssembledBlock, String> {
        let address_bits = cu.ram().address_bits();
        let word_bits = cu.ram().word_bits();
        let endianess = cu.ram().endianess();
        self.assemble_for(cu.name(), address_bits, word_bits, endianess, source)
            .map_err(|e| e.to_string())
    }
}
