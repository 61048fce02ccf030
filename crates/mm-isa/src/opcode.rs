use core::fmt;

/// A single instruction opcode byte, shared by every CPU variant's decode
/// table. Several mnemonics alias the same byte (`move`/`load`,
/// `swap`/`rmove`); [`Opcode::name`] picks the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode(pub u8);

pub const OPCODE_BITS: u8 = 8;

impl Opcode {
    pub const MOVE: Opcode = Opcode(0x00);
    pub const LOAD: Opcode = Opcode(0x00);
    pub const ADD: Opcode = Opcode(0x01);
    pub const SUB: Opcode = Opcode(0x02);
    pub const SMUL: Opcode = Opcode(0x03);
    pub const SDIV: Opcode = Opcode(0x04);
    pub const COMP: Opcode = Opcode(0x05);
    pub const STORE: Opcode = Opcode(0x10);
    pub const ADDR: Opcode = Opcode(0x11);
    pub const UMUL: Opcode = Opcode(0x13);
    pub const UDIV: Opcode = Opcode(0x14);
    pub const SWAP: Opcode = Opcode(0x20);
    pub const RMOVE: Opcode = Opcode(0x20);
    pub const RADD: Opcode = Opcode(0x21);
    pub const RSUB: Opcode = Opcode(0x22);
    pub const RSMUL: Opcode = Opcode(0x23);
    pub const RSDIV: Opcode = Opcode(0x24);
    pub const RCOMP: Opcode = Opcode(0x25);
    pub const RUMUL: Opcode = Opcode(0x33);
    pub const RUDIV: Opcode = Opcode(0x34);
    pub const PUSH: Opcode = Opcode(0x5A);
    pub const POP: Opcode = Opcode(0x5B);
    pub const DUP: Opcode = Opcode(0x5C);
    pub const SSWAP: Opcode = Opcode(0x5D);
    pub const JUMP: Opcode = Opcode(0x80);
    pub const JEQ: Opcode = Opcode(0x81);
    pub const JNEQ: Opcode = Opcode(0x82);
    pub const SJL: Opcode = Opcode(0x83);
    pub const SJGEQ: Opcode = Opcode(0x84);
    pub const SJLEQ: Opcode = Opcode(0x85);
    pub const SJG: Opcode = Opcode(0x86);
    pub const UJL: Opcode = Opcode(0x93);
    pub const UJGEQ: Opcode = Opcode(0x94);
    pub const UJLEQ: Opcode = Opcode(0x95);
    pub const UJG: Opcode = Opcode(0x96);
    pub const RESERVED_UNKNOWN: Opcode = Opcode(0x98);
    pub const HALT: Opcode = Opcode(0x99);

    /// Primary mnemonic for this byte, favoring the first-declared alias.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::MOVE => "move",
            Opcode::ADD => "add",
            Opcode::SUB => "sub",
            Opcode::SMUL => "smul",
            Opcode::SDIV => "sdiv",
            Opcode::COMP => "comp",
            Opcode::STORE => "store",
            Opcode::ADDR => "addr",
            Opcode::UMUL => "umul",
            Opcode::UDIV => "udiv",
            Opcode::SWAP => "swap",
            Opcode::RADD => "radd",
            Opcode::RSUB => "rsub",
            Opcode::RSMUL => "rsmul",
            Opcode::RSDIV => "rsdiv",
            Opcode::RCOMP => "rcomp",
            Opcode::RUMUL => "rumul",
            Opcode::RUDIV => "rudiv",
            Opcode::PUSH => "push",
            Opcode::POP => "pop",
            Opcode::DUP => "dup",
            Opcode::SSWAP => "sswap",
            Opcode::JUMP => "jump",
            Opcode::JEQ => "jeq",
            Opcode::JNEQ => "jneq",
            Opcode::SJL => "sjl",
            Opcode::SJGEQ => "sjgeq",
            Opcode::SJLEQ => "sjleq",
            Opcode::SJG => "sjg",
            Opcode::UJL => "ujl",
            Opcode::UJGEQ => "ujgeq",
            Opcode::UJLEQ => "ujleq",
            Opcode::UJG => "ujg",
            Opcode::RESERVED_UNKNOWN => "reserved_unknown",
            Opcode::HALT => "halt",
            _ => "unknown",
        }
    }

    pub const fn is_dword_write_back(self) -> bool {
        matches!(self, Opcode::UDIV | Opcode::SDIV)
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::ADD | Opcode::SUB | Opcode::SMUL | Opcode::SDIV | Opcode::UMUL | Opcode::UDIV
        )
    }

    pub const fn is_condjump(self) -> bool {
        matches!(
            self,
            Opcode::JEQ
                | Opcode::JNEQ
                | Opcode::SJL
                | Opcode::SJGEQ
                | Opcode::SJLEQ
                | Opcode::SJG
                | Opcode::UJL
                | Opcode::UJGEQ
                | Opcode::UJLEQ
                | Opcode::UJG
        )
    }

    pub const fn is_jump(self) -> bool {
        self.is_condjump() || matches!(self, Opcode::JUMP)
    }

    pub const fn is_register_arith(self) -> bool {
        matches!(
            self,
            Opcode::RADD
                | Opcode::RSUB
                | Opcode::RSMUL
                | Opcode::RSDIV
                | Opcode::RUMUL
                | Opcode::RUDIV
        )
    }

    pub const fn is_register(self) -> bool {
        self.is_register_arith() || matches!(self, Opcode::RMOVE | Opcode::RCOMP)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode.{}", self.name())
    }
}
