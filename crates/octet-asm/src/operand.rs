//! Sequential operand consumption.

use octet_core::Register;

use crate::errors::{AssembleError, AssembleErrorKind};
use crate::parser::{Operand, SourceKind};

/// Cursor over the operands of one instruction.
#[derive(Debug, Clone)]
pub struct OperandCursor<'a> {
    line: usize,
    mnemonic: &'a str,
    operands: &'a [Operand],
    position: usize,
}

impl<'a> OperandCursor<'a> {
    /// Starts at the first operand.
    #[must_use]
    pub const fn new(line: usize, mnemonic: &'a str, operands: &'a [Operand]) -> Self {
        Self {
            line,
            mnemonic,
            operands,
            position: 0,
        }
    }

    /// Kind of the next operand without consuming it.
    #[must_use]
    pub fn peek_kind(&self) -> Option<SourceKind> {
        self.operands.get(self.position).map(Operand::kind)
    }

    /// Number of operands not yet consumed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.operands.len() - self.position
    }

    /// Consumes the next operand, which must be of `kind`.
    ///
    /// # Errors
    ///
    /// [`AssembleErrorKind::InvalidOperandCombination`] if the operand is
    /// missing or of another kind.
    pub fn expect(&mut self, kind: SourceKind) -> Result<&'a Operand, AssembleError> {
        match self.operands.get(self.position) {
            Some(operand) if operand.kind() == kind => {
                self.position += 1;
                Ok(operand)
            }
            _ => Err(self.mismatch()),
        }
    }

    /// Consumes the next operand, which must be a plain register.
    ///
    /// # Errors
    ///
    /// [`AssembleErrorKind::InvalidOperandCombination`] if the operand is
    /// missing or not a register.
    pub fn expect_register(&mut self) -> Result<Register, AssembleError> {
        match self.operands.get(self.position) {
            Some(Operand::Register(register)) => {
                self.position += 1;
                Ok(*register)
            }
            _ => Err(self.mismatch()),
        }
    }

    /// Fails unless every operand was consumed.
    ///
    /// # Errors
    ///
    /// [`AssembleErrorKind::InvalidOperandCombination`] for leftovers.
    pub fn finish(&self) -> Result<(), AssembleError> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(self.mismatch())
        }
    }

    /// Error describing the full operand list as unsupported.
    #[must_use]
    pub fn mismatch(&self) -> AssembleError {
        AssembleError::new(
            self.line,
            AssembleErrorKind::InvalidOperandCombination {
                mnemonic: self.mnemonic.to_string(),
                operands: describe(self.operands),
            },
        )
    }
}

/// Comma-separated operand kinds, or `none`.
#[must_use]
pub fn describe(operands: &[Operand]) -> String {
    if operands.is_empty() {
        return "none".to_string();
    }
    operands
        .iter()
        .map(|operand| operand.kind().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
