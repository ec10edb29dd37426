use crate::fault::Fault;
use crate::isa::{InstructionDescriptor, OperandKind};

/// Decode state of the instruction currently being assembled.
///
/// Lives from the cycle that fetched its opcode until the cycle that executes
/// or rejects it.
#[derive(Debug, Clone)]
pub struct PendingInstruction {
    opcode: u8,
    position: u8,
    descriptor: InstructionDescriptor,
    operands: Vec<u8>,
}

impl PendingInstruction {
    pub(crate) fn new(opcode: u8, position: u8, descriptor: InstructionDescriptor) -> Self {
        Self {
            opcode,
            position,
            descriptor,
            operands: Vec::with_capacity(descriptor.operand_count()),
        }
    }

    /// The opcode byte.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Address the opcode was fetched from.
    #[must_use]
    pub const fn position(&self) -> u8 {
        self.position
    }

    /// Descriptor resolved from the opcode.
    #[must_use]
    pub const fn descriptor(&self) -> &InstructionDescriptor {
        &self.descriptor
    }

    /// Number of operand bytes the instruction needs.
    #[must_use]
    pub const fn required(&self) -> usize {
        self.descriptor.operand_count()
    }

    /// Operand bytes gathered so far.
    #[must_use]
    pub fn operands(&self) -> &[u8] {
        &self.operands
    }

    /// Returns true once every operand byte is collected.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.operands.len() >= self.required()
    }

    /// Kind of the next operand byte, if one is still missing.
    #[must_use]
    pub fn next_kind(&self) -> Option<OperandKind> {
        self.descriptor.operands.get(self.operands.len()).copied()
    }

    /// Stores `byte` as the next operand and returns the kind it fills.
    pub(crate) fn collect(&mut self, byte: u8) -> Option<OperandKind> {
        let kind = self.next_kind()?;
        self.operands.push(byte);
        Some(kind)
    }

    /// Checks every collected byte against its declared kind.
    ///
    /// # Errors
    ///
    /// [`Fault::OperandOutOfRange`] for the first rejected byte.
    pub fn validate(&self) -> Result<(), Fault> {
        self.descriptor
            .operands
            .iter()
            .zip(&self.operands)
            .find(|(kind, byte)| !kind.accepts(**byte))
            .map_or(Ok(()), |(kind, byte)| {
                Err(Fault::OperandOutOfRange {
                    byte: *byte,
                    expected: *kind,
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::PendingInstruction;
    use crate::{Fault, InstructionSet, Opcode, OperandKind};

    fn pending(opcode: Opcode) -> PendingInstruction {
        let set = InstructionSet::standard();
        let descriptor = *set.lookup(opcode.as_u8()).expect("standard opcode");
        PendingInstruction::new(opcode.as_u8(), 0, descriptor)
    }

    #[test]
    fn zero_operand_instruction_is_ready_immediately() {
        let pending = pending(Opcode::Nop);
        assert_eq!(pending.required(), 0);
        assert!(pending.is_ready());
        assert_eq!(pending.next_kind(), None);
    }

    #[test]
    fn collects_operands_in_declared_order() {
        let mut pending = pending(Opcode::MovConstReg);

        assert_eq!(pending.collect(73), Some(OperandKind::Constant));
        assert!(!pending.is_ready());
        assert_eq!(pending.collect(1), Some(OperandKind::Register));
        assert!(pending.is_ready());
        assert_eq!(pending.collect(2), None);
        assert_eq!(pending.operands(), &[73, 1]);
    }

    #[test]
    fn validate_reports_first_bad_register() {
        let mut pending = pending(Opcode::MovConstReg);
        pending.collect(200);
        pending.collect(8);

        assert_eq!(
            pending.validate(),
            Err(Fault::OperandOutOfRange {
                byte: 8,
                expected: OperandKind::Register
            })
        );
    }
}
