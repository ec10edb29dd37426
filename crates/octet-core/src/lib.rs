//! Core emulator crate for the Octet 8-bit computer.
//!
//! The [`Engine`] consumes one byte per [`Engine::cycle`], assembling and
//! executing instructions described by an [`InstructionSet`]. Every state
//! change is published on the engine's [`EventBus`].

/// Host-facing configuration, outcomes and snapshots.
pub mod api;
pub use api::{
    CycleOutcome, MachineConfig, MachineSnapshot, PendingSnapshot, Phase,
    DEFAULT_BANK_COUNT, DEFAULT_CALL_STACK_DEPTH, DEFAULT_PALETTE_COUNT,
};

/// Machine state: memory, registers, flags and call stack.
pub mod state;
pub use state::{CallStack, Machine, Register, RegisterFile, MEMORY_BYTES, REGISTER_COUNT};

/// Instruction-level fault taxonomy.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Opcodes, operand kinds and the instruction registry.
pub mod isa;
pub use isa::{
    pack_register_pair, ExecuteFn, InstructionDescriptor, InstructionSet, Opcode, OperandKind,
    Operands, RegistryError, STANDARD_INSTRUCTIONS,
};

/// Typed publish/subscribe bus.
pub mod event;
pub use event::{BusError, Event, EventBus, EventKind, Listener};

/// Decode/execute engine.
pub mod engine;
pub use engine::{Engine, Execution, PendingInstruction};

/// Long- and short-form state serializations.
pub mod codec;
pub use codec::{CodecWarning, MachineImage, Section};

/// Memory disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_one, disassemble_window, DisassemblyRow};
