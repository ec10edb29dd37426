//! Assembly errors.
//!
//! Every error is fatal to the whole assembly and carries the 1-based source
//! line it was raised on. It formats as `line N: message`.

use thiserror::Error;

/// An assembly failure at a source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct AssembleError {
    /// 1-based source line.
    pub line: usize,
    /// What went wrong.
    pub kind: AssembleErrorKind,
}

impl AssembleError {
    /// Creates an error at `line`.
    #[must_use]
    pub const fn new(line: usize, kind: AssembleErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Classification of assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleErrorKind {
    /// A numeric literal is malformed or outside `0..=255`.
    #[error("invalid literal `{0}`")]
    InvalidLiteral(String),
    /// A register number is outside `0..=7`.
    #[error("register `{0}` is out of range (R0..R7)")]
    RegisterOutOfRange(String),
    /// A token matches no operand form.
    #[error("malformed operand `{0}`")]
    MalformedOperand(String),
    /// The mnemonic is not in the instruction table.
    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),
    /// The mnemonic has no form for these operand kinds.
    #[error("`{mnemonic}` does not accept operands ({operands})")]
    InvalidOperandCombination {
        /// Mnemonic as written.
        mnemonic: String,
        /// Operand kinds as written, comma separated.
        operands: String,
    },
    /// A referenced label is never declared.
    #[error("label `:{0}` is not defined")]
    LabelNotFound(String),
    /// A label is declared twice.
    #[error("label `:{name}` is already defined on line {first_line}")]
    DuplicateLabel {
        /// Label name.
        name: String,
        /// Line of the first declaration.
        first_line: usize,
    },
    /// The program does not fit in memory.
    #[error("program needs {size} bytes but memory holds 256")]
    ProgramTooLarge {
        /// Bytes needed.
        size: usize,
    },
}
