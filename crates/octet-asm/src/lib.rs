//! Octet assembler library.
//!
//! ```
//! let bytes = octet_asm::assemble("MOV NUM73 R1").unwrap();
//! assert_eq!(bytes, vec![0x01, 73, 1]);
//! ```

// Used by the `octet-asm` binary only.
use clap as _;
use simplelog as _;
#[cfg(test)]
use assert_cmd as _;
#[cfg(test)]
use tempfile as _;

/// Two-pass assembler pipeline.
pub mod assembler;
/// Instruction encoding driven by descriptor operand kinds.
pub mod encoder;
/// Assembly error types.
pub mod errors;
/// Mnemonic form table.
pub mod mnemonic;
/// Operand cursor.
pub mod operand;
/// Source line parser.
pub mod parser;
/// Label table.
pub mod symbols;

pub use assembler::{assemble, assemble_unlinked, AssembledProgram};
pub use errors::{AssembleError, AssembleErrorKind};
