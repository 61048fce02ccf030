use thiserror::Error;

/// Every runtime fault that `ControlUnit::step` can observe. All of them
/// are caught at the `step` boundary, printed, and turned into a halt; none
/// of them ever escape past one `step` call.
#[derive(Debug, Clone, Error)]
pub enum HaltError {
    #[error("division by zero")]
    AluZeroDivisionError,

    #[error("RAM access error: {0}")]
    RamAccessError(String),

    #[error("stack access error: {0}")]
    StackAccessError(String),

    #[error("unknown opcode 0x{0:02x} for this CPU variant")]
    WrongOpcodeError(u8),
}
