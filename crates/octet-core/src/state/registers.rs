/// Number of general-purpose registers (`R0..R7`).
pub const REGISTER_COUNT: usize = 8;

/// General-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    /// Ordered list of all registers.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the operand byte that names this register.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Resolves a raw operand byte into a register.
    ///
    /// Anything outside `0..=7` is rejected rather than masked.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::R0),
            1 => Some(Self::R1),
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            7 => Some(Self::R7),
            _ => None,
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.as_u8())
    }
}

/// Register file of eight byte-wide registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterFile {
    values: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    /// Reads a register.
    #[must_use]
    pub const fn get(&self, reg: Register) -> u8 {
        self.values[reg.index()]
    }

    /// Writes a register.
    pub const fn set(&mut self, reg: Register, value: u8) {
        self.values[reg.index()] = value;
    }

    /// Copies out every register value in index order.
    #[must_use]
    pub const fn values(&self) -> [u8; REGISTER_COUNT] {
        self.values
    }
}
