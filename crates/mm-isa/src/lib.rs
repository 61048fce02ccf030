//! The shared opcode table, register names and per-opcode operand layout
//! used by both the assembler and every control unit implementation.

mod error;
pub mod layout;
mod opcode;
mod register;

pub use error::HaltError;
pub use layout::{
    full_ir_bits, instruction_bits, mnemonic_table, opcode_for_mnemonic, operand_fields, operand_group_sizes,
    FieldKind, FieldSpec,
};
pub use opcode::{Opcode, OPCODE_BITS};
pub use register::RegisterName;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Opcode::MOVE, "move")]
    #[case(Opcode::LOAD, "move")]
    #[case(Opcode::SWAP, "swap")]
    #[case(Opcode::RMOVE, "swap")]
    #[case(Opcode::HALT, "halt")]
    fn aliases_share_a_byte_and_primary_name(#[case] op: Opcode, #[case] name: &str) {
        assert_eq!(op.name(), name);
    }

    #[test]
    fn move_and_load_are_the_same_byte() {
        assert_eq!(Opcode::MOVE, Opcode::LOAD);
        assert_eq!(Opcode::SWAP, Opcode::RMOVE);
    }

    #[rstest]
    #[case(Opcode::ADD)]
    #[case(Opcode::SUB)]
    #[case(Opcode::SMUL)]
    #[case(Opcode::SDIV)]
    #[case(Opcode::UMUL)]
    #[case(Opcode::UDIV)]
    fn arithmetic_opcodes_are_flagged(#[case] op: Opcode) {
        assert!(op.is_arithmetic());
    }

    #[test]
    fn dword_write_back_is_exactly_the_divisions() {
        assert!(Opcode::SDIV.is_dword_write_back());
        assert!(Opcode::UDIV.is_dword_write_back());
        assert!(!Opcode::ADD.is_dword_write_back());
    }

    #[test]
    fn register_name_count_matches_enum_len() {
        use strum::IntoEnumIterator;
        assert_eq!(RegisterName::iter().count(), RegisterName::COUNT);
    }

    #[test]
    fn register_indices_are_dense_from_zero() {
        use strum::IntoEnumIterator;
        for (i, reg) in RegisterName::iter().enumerate() {
            assert_eq!(reg.index(), i);
        }
    }
}
