//! Per-CPU mnemonic tables: which byte each mnemonic decodes to and where
//! the assembler should pack its operands. Grounded on each variant's own
//! `decode()` bit ranges in `mm-vm` (which mirror `ide/asm/opcode_table/
//! *.py`'s intent) rather than that file's own `Operand` dataclass, whose
//! keyword arguments don't match its declared fields in this snapshot of
//! the source tree.

use crate::{Opcode, OPCODE_BITS};

/// How one assembly-syntax operand is encoded once linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A plain address: a label or literal, bits `[lo, hi)`.
    Absolute,
    /// mm-0's 8-bit label operand: `target - (pc after fetch) + 1`.
    PcRelative,
    /// An 8-bit signed literal, independent of `address_bits` (mm-0's `push`).
    ImmediateSigned,
    /// An 8-bit unsigned literal, independent of `address_bits` (mm-0/mm-s
    /// stack offsets and counts).
    ImmediateUnsigned,
    /// A 4-bit general register number, `r0..rf` (mm-r/mm-m).
    Register,
}

/// One operand's destination bits within the instruction, `[lo, hi)` with
/// bit 0 the least significant (matching `Cell::slice`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub lo: u8,
    pub hi: u8,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(lo: u8, hi: u8, kind: FieldKind) -> Self {
        FieldSpec { lo, hi, kind }
    }

    pub fn width(self) -> u8 {
        self.hi - self.lo
    }
}

/// Register-number field width, mm-r/mm-m's `R`/`M` slots.
pub const REG_NO_BITS: u8 = 4;

fn one(lo: u8, hi: u8, kind: FieldKind) -> Vec<FieldSpec> {
    vec![FieldSpec::new(lo, hi, kind)]
}

/// Total instruction width in bits for `(cpu_name, opcode)`. Mirrors each
/// variant's `ir_bits`/`instruction_bits`.
pub fn instruction_bits(cpu_name: &str, opcode: Opcode, address_bits: u8) -> Option<u8> {
    let a = address_bits;
    Some(match cpu_name {
        "mm-0" => OPCODE_BITS + 8,
        "mm-1" => OPCODE_BITS + a,
        "mm-2" => OPCODE_BITS + 2 * a,
        "mm-3" => OPCODE_BITS + 3 * a,
        "mm-v" => {
            if opcode == Opcode::HALT {
                OPCODE_BITS
            } else if opcode.is_jump() {
                OPCODE_BITS + a
            } else {
                OPCODE_BITS + 2 * a
            }
        }
        "mm-s" => {
            if opcode.is_jump() || matches!(opcode, Opcode::PUSH | Opcode::POP) {
                OPCODE_BITS + a
            } else {
                OPCODE_BITS
            }
        }
        "mm-r" | "mm-m" => {
            if opcode.is_register() || opcode == Opcode::HALT {
                a
            } else {
                2 * a
            }
        }
        _ => return None,
    })
}

/// The fixed width of the `Ir` register itself (mm-r/mm-m's narrower
/// one-word opcodes are zero-padded up to this width once fetched; see
/// `ControlUnit::fetch`'s left-shift). Every other variant's `ir_bits` is
/// already its only instruction width, i.e. equal to [`instruction_bits`].
pub fn full_ir_bits(cpu_name: &str, address_bits: u8) -> Option<u8> {
    let a = address_bits;
    match cpu_name {
        "mm-0" => Some(OPCODE_BITS + 8),
        "mm-1" => Some(OPCODE_BITS + a),
        "mm-2" | "mm-v" => Some(OPCODE_BITS + 2 * a),
        "mm-3" => Some(OPCODE_BITS + 3 * a),
        "mm-s" => Some(OPCODE_BITS + a),
        "mm-r" | "mm-m" => Some(OPCODE_BITS + 2 * REG_NO_BITS + a),
        _ => None,
    }
}

/// Maps a lower-case mnemonic to its opcode for `cpu_name`'s dialect. Every
/// variant shares the same byte values (`mm_isa::opcode`); this only scopes
/// which mnemonics are legal on which variant via [`mnemonic_table`].
pub fn opcode_for_mnemonic(cpu_name: &str, mnemonic: &str) -> Option<Opcode> {
    mnemonic_table(cpu_name).iter().find(|(name, _)| *name == mnemonic).map(|(_, op)| *op)
}

/// The operand field layout for `opcode` on `cpu_name`, in left-to-right
/// assembly syntax order (`mnemonic op1, op2, ...`).
pub fn operand_fields(cpu_name: &str, opcode: Opcode, address_bits: u8) -> Option<Vec<FieldSpec>> {
    let a = address_bits;
    Some(match cpu_name {
        "mm-0" => match opcode {
            Opcode::PUSH => one(0, 8, FieldKind::ImmediateSigned),
            Opcode::HALT => vec![],
            op if op.is_jump() => one(0, 8, FieldKind::PcRelative),
            _ => one(0, 8, FieldKind::ImmediateUnsigned),
        },
        "mm-1" => match opcode {
            Opcode::HALT | Opcode::SWAP => vec![],
            _ => one(0, a, FieldKind::Absolute),
        },
        "mm-2" => match opcode {
            Opcode::HALT => vec![],
            op if op.is_jump() => one(0, a, FieldKind::Absolute),
            _ => vec![FieldSpec::new(a, 2 * a, FieldKind::Absolute), FieldSpec::new(0, a, FieldKind::Absolute)],
        },
        "mm-3" => match opcode {
            Opcode::HALT => vec![],
            Opcode::MOVE => vec![FieldSpec::new(2 * a, 3 * a, FieldKind::Absolute), FieldSpec::new(0, a, FieldKind::Absolute)],
            Opcode::JUMP => one(0, a, FieldKind::Absolute),
            _ => vec![
                FieldSpec::new(2 * a, 3 * a, FieldKind::Absolute),
                FieldSpec::new(a, 2 * a, FieldKind::Absolute),
                FieldSpec::new(0, a, FieldKind::Absolute),
            ],
        },
        "mm-v" => match opcode {
            Opcode::HALT => vec![],
            op if op.is_jump() => one(a, 2 * a, FieldKind::Absolute),
            _ => vec![FieldSpec::new(a, 2 * a, FieldKind::Absolute), FieldSpec::new(0, a, FieldKind::Absolute)],
        },
        "mm-s" => match opcode {
            Opcode::HALT | Opcode::DUP | Opcode::SWAP => vec![],
            op if op.is_arithmetic() || op == Opcode::COMP => vec![],
            _ => one(0, a, FieldKind::Absolute),
        },
        "mm-r" | "mm-m" => mm_r_fields(opcode, a)?,
        _ => return None,
    })
}

/// How many consecutive [`FieldSpec`]s (from [`operand_fields`]) each
/// assembly-syntax operand consumes. Every variant but mm-r/mm-m has one
/// field per operand; mm-r/mm-m's indexed `addr[rM]` form packs the address
/// and its modifier register into a single syntax operand but two fields.
pub fn operand_group_sizes(cpu_name: &str, opcode: Opcode) -> Vec<usize> {
    match cpu_name {
        "mm-r" | "mm-m" => {
            if opcode == Opcode::HALT {
                vec![]
            } else if opcode.is_register() {
                vec![1, 1]
            } else if opcode.is_jump() {
                vec![2]
            } else {
                vec![1, 2]
            }
        }
        _ => operand_fields(cpu_name, opcode, 8).map(|f| vec![1; f.len()]).unwrap_or_default(),
    }
}

/// mm-r/mm-m share one instruction shape: an optional `R1` register, an
/// address with its `M` modifier register (`addr[rM]`), or a pair of plain
/// registers for the register-to-register family. Grounded on `mmr.rs`'s
/// free functions `r()`/`m()`/`addr` (mm-m reuses the same layout, adding
/// only the `addr` opcode).
fn mm_r_fields(opcode: Opcode, a: u8) -> Option<Vec<FieldSpec>> {
    Some(match opcode {
        Opcode::HALT => vec![],
        op if op.is_register() => vec![
            FieldSpec::new(a + REG_NO_BITS, a + 2 * REG_NO_BITS, FieldKind::Register),
            FieldSpec::new(a, a + REG_NO_BITS, FieldKind::Register),
        ],
        op if op.is_jump() => vec![
            FieldSpec::new(0, a, FieldKind::Absolute),
            FieldSpec::new(a, a + REG_NO_BITS, FieldKind::Register),
        ],
        _ => vec![
            FieldSpec::new(a + REG_NO_BITS, a + 2 * REG_NO_BITS, FieldKind::Register),
            FieldSpec::new(0, a, FieldKind::Absolute),
            FieldSpec::new(a, a + REG_NO_BITS, FieldKind::Register),
        ],
    })
}

/// `(mnemonic, opcode)` pairs legal on `cpu_name`, in the same grouping as
/// `ide/asm/opcode_table/*.py`.
pub fn mnemonic_table(cpu_name: &str) -> &'static [(&'static str, Opcode)] {
    match cpu_name {
        "mm-0" => {
            const T: &[(&str, Opcode)] = &[
                ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL), ("sdiv", Opcode::SDIV),
                ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV), ("comp", Opcode::COMP), ("push", Opcode::PUSH),
                ("pop", Opcode::POP), ("dup", Opcode::DUP), ("sswap", Opcode::SSWAP),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        "mm-1" => {
            const T: &[(&str, Opcode)] = &[
                ("load", Opcode::LOAD), ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL),
                ("sdiv", Opcode::SDIV), ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV), ("comp", Opcode::COMP),
                ("store", Opcode::STORE), ("swap", Opcode::SWAP),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        "mm-2" | "mm-v" => {
            const T: &[(&str, Opcode)] = &[
                ("move", Opcode::MOVE), ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL),
                ("sdiv", Opcode::SDIV), ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV), ("comp", Opcode::COMP),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        "mm-3" => {
            const T: &[(&str, Opcode)] = &[
                ("move", Opcode::MOVE), ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL),
                ("sdiv", Opcode::SDIV), ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        "mm-s" => {
            const T: &[(&str, Opcode)] = &[
                ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL), ("sdiv", Opcode::SDIV),
                ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV), ("comp", Opcode::COMP), ("push", Opcode::PUSH),
                ("pop", Opcode::POP), ("dup", Opcode::DUP), ("sswap", Opcode::SSWAP),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        "mm-r" => {
            const T: &[(&str, Opcode)] = &[
                ("load", Opcode::LOAD), ("store", Opcode::STORE), ("rmove", Opcode::RMOVE),
                ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL), ("sdiv", Opcode::SDIV),
                ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV), ("comp", Opcode::COMP),
                ("radd", Opcode::RADD), ("rsub", Opcode::RSUB), ("rsmul", Opcode::RSMUL), ("rsdiv", Opcode::RSDIV),
                ("rumul", Opcode::RUMUL), ("rudiv", Opcode::RUDIV), ("rcomp", Opcode::RCOMP),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        "mm-m" => {
            const T: &[(&str, Opcode)] = &[
                ("load", Opcode::LOAD), ("store", Opcode::STORE), ("rmove", Opcode::RMOVE), ("addr", Opcode::ADDR),
                ("add", Opcode::ADD), ("sub", Opcode::SUB), ("smul", Opcode::SMUL), ("sdiv", Opcode::SDIV),
                ("umul", Opcode::UMUL), ("udiv", Opcode::UDIV), ("comp", Opcode::COMP),
                ("radd", Opcode::RADD), ("rsub", Opcode::RSUB), ("rsmul", Opcode::RSMUL), ("rsdiv", Opcode::RSDIV),
                ("rumul", Opcode::RUMUL), ("rudiv", Opcode::RUDIV), ("rcomp", Opcode::RCOMP),
                ("jump", Opcode::JUMP), ("jeq", Opcode::JEQ), ("jneq", Opcode::JNEQ), ("sjl", Opcode::SJL),
                ("sjgeq", Opcode::SJGEQ), ("sjleq", Opcode::SJLEQ), ("sjg", Opcode::SJG), ("ujl", Opcode::UJL),
                ("ujgeq", Opcode::UJGEQ), ("ujleq", Opcode::UJLEQ), ("ujg", Opcode::UJG), ("halt", Opcode::HALT),
            ];
            T
        }
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mmr_padding_shift_matches_register_field_positions() {
        let a = 16;
        let full = full_ir_bits("mm-r", a).unwrap();
        let one_word = instruction_bits("mm-r", Opcode::RADD, a).unwrap();
        let two_word = instruction_bits("mm-r", Opcode::LOAD, a).unwrap();
        assert_eq!(full, 32);
        assert_eq!(one_word, a);
        assert_eq!(two_word, 2 * a);
        let shift_one = full - one_word;
        let fields = operand_fields("mm-r", Opcode::RADD, a).unwrap();
        assert_eq!(fields[0].lo - shift_one, 4);
        assert_eq!(fields[1].lo - shift_one, 0);
    }

    #[test]
    fn mm3_add_has_three_absolute_operands() {
        let fields = operand_fields("mm-3", Opcode::ADD, 8).unwrap();
        assert_eq!(fields.len(), 3);
        assert!(fields.iter().all(|f| f.kind == FieldKind::Absolute));
        assert_eq!(fields[2].lo, 0);
        assert_eq!(fields[2].hi, 8);
    }

    #[test]
    fn mm0_push_is_a_signed_immediate() {
        let fields = operand_fields("mm-0", Opcode::PUSH, 16).unwrap();
        assert_eq!(fields, vec![FieldSpec::new(0, 8, FieldKind::ImmediateSigned)]);
    }

    #[test]
    fn mmr_register_op_takes_two_registers() {
        let fields = operand_fields("mm-r", Opcode::RADD, 16).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|f| f.kind == FieldKind::Register));
    }

    #[test]
    fn mmr_load_groups_address_and_modifier_into_one_operand() {
        let fields = operand_fields("mm-r", Opcode::LOAD, 16).unwrap();
        assert_eq!(fields.len(), 3);
        let groups = operand_group_sizes("mm-r", Opcode::LOAD);
        assert_eq!(groups, vec![1, 2]);
        assert_eq!(groups.iter().sum::<usize>(), fields.len());
    }

    #[test]
    fn mmm_addr_shares_mmr_memory_layout() {
        let fields = operand_fields("mm-m", Opcode::ADDR, 16).unwrap();
        assert_eq!(fields, operand_fields("mm-r", Opcode::LOAD, 16).unwrap());
    }

    #[test]
    fn instruction_bits_match_known_variant_formulas() {
        assert_eq!(instruction_bits("mm-2", Opcode::ADD, 8), Some(24));
        assert_eq!(instruction_bits("mm-v", Opcode::HALT, 16), Some(8));
        assert_eq!(instruction_bits("mm-s", Opcode::ADD, 16), Some(8));
    }
}
