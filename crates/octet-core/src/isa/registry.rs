use std::fmt;

use thiserror::Error;

use crate::engine::Execution;
use crate::fault::Fault;
use crate::isa::instructions::STANDARD_INSTRUCTIONS;
use crate::isa::{OperandKind, Operands};

/// Execution semantics of one instruction.
///
/// Receives the after-execution capability and the validated operand bytes.
/// Must terminate unconditionally.
pub type ExecuteFn = fn(&mut Execution<'_>, &Operands<'_>) -> Result<(), Fault>;

/// Immutable description of one instruction.
#[derive(Clone, Copy)]
pub struct InstructionDescriptor {
    /// Short upper-case name, e.g. `MOV_CONST_REG`.
    pub name: &'static str,
    /// Human-readable summary for listings and explainers.
    pub description: &'static str,
    /// Operand kinds, in the order the bytes follow the opcode.
    pub operands: &'static [OperandKind],
    /// Semantics.
    pub execute: ExecuteFn,
}

impl InstructionDescriptor {
    /// Number of operand bytes following the opcode.
    #[must_use]
    pub const fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Total encoded length in bytes, opcode included.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        1 + self.operands.len()
    }
}

impl fmt::Debug for InstructionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionDescriptor")
            .field("name", &self.name)
            .field("operands", &self.operands)
            .finish_non_exhaustive()
    }
}

/// Registry construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The opcode already has a descriptor.
    #[error("opcode 0x{0:02X} is already registered")]
    DuplicateOpcode(u8),
}

/// Table from opcode byte to instruction descriptor.
///
/// Built once, then only read. The engine takes ownership and exposes no way
/// to register further opcodes.
#[derive(Clone)]
pub struct InstructionSet {
    entries: [Option<InstructionDescriptor>; 256],
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for InstructionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(opcode, d)| (opcode, d.name)))
            .finish()
    }
}

impl InstructionSet {
    /// An empty set: every byte is unbound.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            entries: [None; 256],
        }
    }

    /// The standard instruction set.
    ///
    /// # Panics
    ///
    /// Panics if the built-in table binds an opcode twice, which the unit
    /// tests rule out.
    #[must_use]
    pub fn standard() -> Self {
        let table = STANDARD_INSTRUCTIONS
            .iter()
            .map(|(opcode, descriptor)| (opcode.as_u8(), *descriptor));
        Self::from_table(table).expect("standard instruction table binds each opcode once")
    }

    /// Builds a set from `(opcode, descriptor)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOpcode`] on the first repeated opcode.
    pub fn from_table(
        table: impl IntoIterator<Item = (u8, InstructionDescriptor)>,
    ) -> Result<Self, RegistryError> {
        let mut set = Self::empty();
        for (opcode, descriptor) in table {
            set.register(opcode, descriptor)?;
        }
        Ok(set)
    }

    /// Binds `descriptor` to `opcode`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateOpcode`] if `opcode` is already bound.
    pub fn register(
        &mut self,
        opcode: u8,
        descriptor: InstructionDescriptor,
    ) -> Result<(), RegistryError> {
        let slot = &mut self.entries[usize::from(opcode)];
        if slot.is_some() {
            return Err(RegistryError::DuplicateOpcode(opcode));
        }
        *slot = Some(descriptor);
        Ok(())
    }

    /// Looks up the descriptor bound to `opcode`.
    #[must_use]
    pub fn lookup(&self, opcode: u8) -> Option<&InstructionDescriptor> {
        self.entries[usize::from(opcode)].as_ref()
    }

    /// Bound opcodes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &InstructionDescriptor)> + '_ {
        (0_u8..=255).filter_map(move |opcode| self.lookup(opcode).map(|d| (opcode, d)))
    }

    /// Number of bound opcodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Returns true when no opcode is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
