use strum::EnumIter;

/// Dense register name space shared by every CPU variant. Not every variant
/// wires up every name; `mm-vm::RegisterFile::add_register` decides which
/// ones exist and at what width for a given variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RegisterName {
    Pc = 0,
    Ir,
    Addr,
    Sp,
    S,
    S1,
    R,
    Flags,
    A1,
    A2,
    M,
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    Ra,
    Rb,
    Rc,
    Rd,
    Re,
    Rf,
}

impl RegisterName {
    pub const COUNT: usize = 27;

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for RegisterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
