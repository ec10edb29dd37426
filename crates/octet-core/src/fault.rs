use thiserror::Error;

use crate::isa::OperandKind;

/// Fault classes used to group engine errors for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// An operand byte was outside the range its kind allows.
    Operand,
    /// The instruction decoded fine but could not complete.
    Runtime,
}

/// Instruction-level failure.
///
/// A fault aborts only the instruction that raised it. The engine reports it
/// through an error event and stays live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// A register or register-pair operand named a register outside `R0..R7`.
    #[error("operand byte 0x{byte:02X} is not a valid {expected}")]
    OperandOutOfRange {
        /// The raw byte read from memory.
        byte: u8,
        /// The operand kind the instruction declared.
        expected: OperandKind,
    },
    /// A constant parameter exceeded the limit of the selected resource.
    #[error("parameter {value} is out of range (limit {limit})")]
    ParameterOutOfRange {
        /// The value supplied.
        value: u8,
        /// Exclusive upper bound.
        limit: u8,
    },
    /// `DIV` or `MOD` with a zero divisor.
    #[error("division by zero")]
    DivideByZero,
    /// `CALL` with the call stack already at maximum depth.
    #[error("call stack overflow (depth {depth})")]
    CallStackOverflow {
        /// Maximum depth of the call stack.
        depth: usize,
    },
    /// `RET` with an empty call stack.
    #[error("return with empty call stack")]
    CallStackUnderflow,
}

impl Fault {
    /// Returns the class this fault reports under.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::OperandOutOfRange { .. } | Self::ParameterOutOfRange { .. } => {
                FaultClass::Operand
            }
            Self::DivideByZero | Self::CallStackOverflow { .. } | Self::CallStackUnderflow => {
                FaultClass::Runtime
            }
        }
    }
}
