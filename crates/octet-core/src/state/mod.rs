//! Machine state primitives.

/// Full mutable state of the machine.
pub mod machine;
/// Register identifiers and register file.
pub mod registers;

pub use machine::{CallStack, Machine, MEMORY_BYTES};
pub use registers::{Register, RegisterFile, REGISTER_COUNT};
