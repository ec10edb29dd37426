use std::fmt;

/// How an operand byte following an opcode is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandKind {
    /// Any byte value.
    Constant,
    /// Register index, `0..=7`.
    Register,
    /// Memory address, any byte value.
    MemoryAddress,
    /// Two register indices packed as `source << 4 | destination`.
    RegisterPair,
}

impl OperandKind {
    /// Returns true if `byte` is a legal encoding for this kind.
    #[must_use]
    pub const fn accepts(self, byte: u8) -> bool {
        match self {
            Self::Constant | Self::MemoryAddress => true,
            Self::Register => byte <= 7,
            Self::RegisterPair => (byte >> 4) <= 7 && (byte & 0x0F) <= 7,
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constant => "constant",
            Self::Register => "register",
            Self::MemoryAddress => "memory address",
            Self::RegisterPair => "register pair",
        };
        f.write_str(name)
    }
}

/// Opcodes of the standard instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Nop = 0x00,
    MovConstReg = 0x01,
    MovMemReg = 0x02,
    MovRegMem = 0x03,
    MovRegReg = 0x04,
    MovConstMem = 0x05,
    LoadIndirect = 0x06,
    StoreIndirect = 0x07,
    Add = 0x10,
    AddConst = 0x11,
    Sub = 0x12,
    SubConst = 0x13,
    Mul = 0x14,
    Div = 0x15,
    Mod = 0x16,
    Inc = 0x17,
    Dec = 0x18,
    And = 0x19,
    Or = 0x1A,
    Xor = 0x1B,
    Not = 0x1C,
    Shl = 0x1D,
    Shr = 0x1E,
    Jmp = 0x20,
    JmpCarry = 0x21,
    JmpNoCarry = 0x22,
    JmpZero = 0x23,
    JmpNotZero = 0x24,
    Call = 0x25,
    Ret = 0x26,
    ClearCarry = 0x30,
    SetCarry = 0x31,
    Print = 0x40,
    PrintChar = 0x41,
    VideoStore = 0x50,
    SelectBank = 0x51,
    SelectPalette = 0x52,
}

impl Opcode {
    /// Every standard opcode in ascending byte order.
    pub const ALL: [Self; 37] = [
        Self::Nop,
        Self::MovConstReg,
        Self::MovMemReg,
        Self::MovRegMem,
        Self::MovRegReg,
        Self::MovConstMem,
        Self::LoadIndirect,
        Self::StoreIndirect,
        Self::Add,
        Self::AddConst,
        Self::Sub,
        Self::SubConst,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Inc,
        Self::Dec,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Not,
        Self::Shl,
        Self::Shr,
        Self::Jmp,
        Self::JmpCarry,
        Self::JmpNoCarry,
        Self::JmpZero,
        Self::JmpNotZero,
        Self::Call,
        Self::Ret,
        Self::ClearCarry,
        Self::SetCarry,
        Self::Print,
        Self::PrintChar,
        Self::VideoStore,
        Self::SelectBank,
        Self::SelectPalette,
    ];

    /// The opcode byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Resolves a byte to a standard opcode. `None` means unbound.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_u8() == byte)
    }
}
