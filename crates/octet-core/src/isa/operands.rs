use crate::fault::Fault;
use crate::isa::OperandKind;
use crate::state::Register;

/// Operand bytes of a fully collected instruction, read by position.
///
/// The engine validates every byte against its declared kind before an
/// execution function runs, so the typed readers only fail if a descriptor
/// reads a position with a kind it did not declare.
#[derive(Debug, Clone, Copy)]
pub struct Operands<'a> {
    bytes: &'a [u8],
}

impl<'a> Operands<'a> {
    /// Wraps collected operand bytes.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Raw operand bytes.
    #[must_use]
    pub const fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Reads the byte at `index` as a constant or memory address.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OperandOutOfRange`] if no byte was collected at `index`.
    pub fn byte(&self, index: usize) -> Result<u8, Fault> {
        self.bytes
            .get(index)
            .copied()
            .ok_or(Fault::OperandOutOfRange {
                byte: 0,
                expected: OperandKind::Constant,
            })
    }

    /// Reads the byte at `index` as a register.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OperandOutOfRange`] if the byte does not name `R0..R7`.
    pub fn register(&self, index: usize) -> Result<Register, Fault> {
        let byte = self.byte(index)?;
        Register::from_index(byte).ok_or(Fault::OperandOutOfRange {
            byte,
            expected: OperandKind::Register,
        })
    }

    /// Reads the byte at `index` as a `(source, destination)` register pair.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::OperandOutOfRange`] if either nibble does not name
    /// `R0..R7`.
    pub fn register_pair(&self, index: usize) -> Result<(Register, Register), Fault> {
        let byte = self.byte(index)?;
        let fault = Fault::OperandOutOfRange {
            byte,
            expected: OperandKind::RegisterPair,
        };
        let source = Register::from_index(byte >> 4).ok_or(fault)?;
        let destination = Register::from_index(byte & 0x0F).ok_or(fault)?;
        Ok((source, destination))
    }
}

/// Packs a register pair into its operand byte.
#[must_use]
pub const fn pack_register_pair(source: Register, destination: Register) -> u8 {
    (source.as_u8() << 4) | destination.as_u8()
}
