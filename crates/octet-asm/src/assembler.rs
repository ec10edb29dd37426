//! Two-pass assembly.
//!
//! Pass one parses and encodes every line, assigns offsets and records label
//! declarations and placeholder fixups into an [`AssembledProgram`]. Pass two
//! ([`AssembledProgram::link`]) patches the fixups and flattens the chunks.

use octet_core::{InstructionSet, MEMORY_BYTES};

use crate::encoder::encode_instruction;
use crate::errors::{AssembleError, AssembleErrorKind};
use crate::parser::{parse_line, ParsedLine};
use crate::symbols::SymbolTable;

/// Encoded bytes of one source instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Source line.
    pub line: usize,
    /// Offset of the first byte.
    pub offset: usize,
    /// Encoded bytes, label operands still zero.
    pub bytes: Vec<u8>,
}

/// A label operand waiting for its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixup {
    /// Source line of the referencing instruction.
    pub line: usize,
    /// Absolute offset of the placeholder byte.
    pub offset: usize,
    /// Referenced label.
    pub label: String,
}

/// Output of pass one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledProgram {
    /// Chunks in source order.
    pub chunks: Vec<Chunk>,
    /// Declared labels.
    pub symbols: SymbolTable,
    /// Unresolved label operands.
    pub fixups: Vec<Fixup>,
}

impl AssembledProgram {
    /// Total encoded size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.last().map_or(0, |c| c.offset + c.bytes.len())
    }

    /// Returns true if nothing was encoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pass two: resolves every fixup and concatenates the chunks.
    ///
    /// # Errors
    ///
    /// [`AssembleErrorKind::LabelNotFound`] for an undeclared label, and
    /// [`AssembleErrorKind::ProgramTooLarge`] for a label declared past the
    /// last addressable byte.
    pub fn link(&self) -> Result<Vec<u8>, AssembleError> {
        let mut bytes: Vec<u8> = self
            .chunks
            .iter()
            .flat_map(|chunk| chunk.bytes.iter().copied())
            .collect();

        for fixup in &self.fixups {
            let symbol = self.symbols.get(&fixup.label).ok_or_else(|| {
                AssembleError::new(
                    fixup.line,
                    AssembleErrorKind::LabelNotFound(fixup.label.clone()),
                )
            })?;
            let address = u8::try_from(symbol.offset).map_err(|_| {
                AssembleError::new(
                    fixup.line,
                    AssembleErrorKind::ProgramTooLarge {
                        size: symbol.offset + 1,
                    },
                )
            })?;
            bytes[fixup.offset] = address;
        }

        log::debug!(
            "linked {} bytes, {} labels, {} fixups",
            bytes.len(),
            self.symbols.len(),
            self.fixups.len()
        );
        Ok(bytes)
    }
}

/// Pass one over `source` using the standard instruction set.
///
/// # Errors
///
/// The first parse, encoding, duplicate-label or size error.
pub fn assemble_unlinked(source: &str) -> Result<AssembledProgram, AssembleError> {
    assemble_unlinked_with(&InstructionSet::standard(), source)
}

/// Pass one against a custom instruction set.
///
/// # Errors
///
/// See [`assemble_unlinked`].
pub fn assemble_unlinked_with(
    set: &InstructionSet,
    source: &str,
) -> Result<AssembledProgram, AssembleError> {
    let mut program = AssembledProgram::default();
    let mut offset = 0;

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        match parse_line(line, text)? {
            ParsedLine::Blank => {}
            ParsedLine::Label { name } => program.symbols.define(&name, offset, line)?,
            ParsedLine::Instruction { mnemonic, operands } => {
                let encoded = encode_instruction(set, line, &mnemonic, &operands)?;
                let size = offset + encoded.bytes.len();
                if size > MEMORY_BYTES {
                    return Err(AssembleError::new(
                        line,
                        AssembleErrorKind::ProgramTooLarge { size },
                    ));
                }
                program
                    .fixups
                    .extend(encoded.fixups.into_iter().map(|(at, label)| Fixup {
                        line,
                        offset: offset + at,
                        label,
                    }));
                program.chunks.push(Chunk {
                    line,
                    offset,
                    bytes: encoded.bytes,
                });
                offset = size;
            }
        }
    }
    Ok(program)
}

/// Assembles `source` into a flat program loadable at address 0.
///
/// # Errors
///
/// The first error of either pass. No partial output is produced.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssembleError> {
    assemble_unlinked(source)?.link()
}

#[cfg(test)]
mod tests {
    use octet_core::Opcode;

    use super::{assemble, assemble_unlinked};
    use crate::errors::AssembleErrorKind;

    #[test]
    fn two_moves() {
        let bytes = assemble("MOV NUM0 R0\nMOV NUM73 R1\n").expect("assembles");
        assert_eq!(bytes, vec![0x01, 0, 0, 0x01, 73, 1]);
    }

    #[test]
    fn forward_and_backward_labels() {
        let source = "\
JMP :start
:back
RET
:start
CALL :back
";
        let bytes = assemble(source).expect("assembles");
        assert_eq!(
            bytes,
            vec![
                Opcode::Jmp.as_u8(),
                3,
                Opcode::Ret.as_u8(),
                Opcode::Call.as_u8(),
                2
            ]
        );
    }

    #[test]
    fn pass_one_records_chunks_and_fixups() {
        let program = assemble_unlinked("NOP\n:x\nJMP :x\n").expect("pass one");

        assert_eq!(program.chunks.len(), 2);
        assert_eq!(program.chunks[1].offset, 1);
        assert_eq!(program.chunks[1].line, 3);
        assert_eq!(program.fixups.len(), 1);
        assert_eq!(program.fixups[0].offset, 2);
        assert_eq!(program.symbols.get("x").map(|s| s.offset), Some(1));
        assert_eq!(program.len(), 3);
    }

    #[test]
    fn missing_label_fails_at_reference() {
        let err = assemble("NOP\nJMP :nowhere\n").expect_err("unresolved");
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            AssembleErrorKind::LabelNotFound("nowhere".to_string())
        );
    }

    #[test]
    fn oversize_program_is_rejected() {
        let source = "MOV NUM1 R0\n".repeat(86);
        let err = assemble(&source).expect_err("258 bytes");
        assert_eq!(err.line, 86);
        assert_eq!(err.kind, AssembleErrorKind::ProgramTooLarge { size: 258 });
    }

    #[test]
    fn label_past_last_byte_cannot_be_referenced() {
        let mut source = String::from("JMP :end\n");
        source.push_str(&"NOP\n".repeat(254));
        source.push_str(":end\n");
        let err = assemble(&source).expect_err("label at 256");
        assert_eq!(err.kind, AssembleErrorKind::ProgramTooLarge { size: 257 });
    }

    #[test]
    fn exactly_full_memory_is_accepted() {
        let source = "NOP\n".repeat(256);
        assert_eq!(assemble(&source).map(|b| b.len()), Ok(256));
    }
}
