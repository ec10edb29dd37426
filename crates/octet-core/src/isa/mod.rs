//! Instruction set: opcodes, operand kinds and the descriptor registry.

pub mod instructions;
mod opcode;
mod operands;
mod registry;

pub use instructions::STANDARD_INSTRUCTIONS;
pub use opcode::{Opcode, OperandKind};
pub use operands::{pack_register_pair, Operands};
pub use registry::{ExecuteFn, InstructionDescriptor, InstructionSet, RegistryError};
