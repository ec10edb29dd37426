//! Instruction encoding.
//!
//! Bytes are emitted by walking the descriptor's operand kinds, so the
//! assembler and the engine can never disagree on instruction length.

use octet_core::{pack_register_pair, InstructionSet, OperandKind};

use crate::errors::{AssembleError, AssembleErrorKind};
use crate::mnemonic::{self, Form};
use crate::operand::OperandCursor;
use crate::parser::{Operand, SourceKind};

/// Encoded bytes of one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInstruction {
    /// Opcode followed by operand bytes. Label operands hold a zero
    /// placeholder.
    pub bytes: Vec<u8>,
    /// `(index into bytes, label)` for every placeholder.
    pub fixups: Vec<(usize, String)>,
}

/// Encodes `mnemonic` with `operands` against `set`.
///
/// # Errors
///
/// [`AssembleErrorKind::UnknownMnemonic`] for a mnemonic with no forms,
/// [`AssembleErrorKind::InvalidOperandCombination`] when no form matches the
/// operand kinds.
pub fn encode_instruction(
    set: &InstructionSet,
    line: usize,
    mnemonic: &str,
    operands: &[Operand],
) -> Result<EncodedInstruction, AssembleError> {
    if !mnemonic::is_known(mnemonic) {
        return Err(AssembleError::new(
            line,
            AssembleErrorKind::UnknownMnemonic(mnemonic.to_string()),
        ));
    }

    let mut cursor = OperandCursor::new(line, mnemonic, operands);
    let kinds: Vec<SourceKind> = operands.iter().map(Operand::kind).collect();
    let form = mnemonic::select(mnemonic, &kinds).ok_or_else(|| cursor.mismatch())?;
    encode_form(set, form, &mut cursor)
}

fn encode_form(
    set: &InstructionSet,
    form: &Form,
    cursor: &mut OperandCursor<'_>,
) -> Result<EncodedInstruction, AssembleError> {
    let opcode = form.opcode.as_u8();
    let descriptor = set.lookup(opcode).ok_or_else(|| cursor.mismatch())?;

    let mut out = EncodedInstruction {
        bytes: vec![opcode],
        fixups: Vec::new(),
    };
    for kind in descriptor.operands {
        match kind {
            OperandKind::Constant => {
                let operand = cursor.expect(SourceKind::Constant)?;
                out.bytes.push(byte_of(operand));
            }
            OperandKind::MemoryAddress => match cursor.expect(SourceKind::Memory)? {
                Operand::Label(name) => {
                    out.fixups.push((out.bytes.len(), name.clone()));
                    out.bytes.push(0);
                }
                operand => out.bytes.push(byte_of(operand)),
            },
            OperandKind::Register => {
                let kind = match cursor.peek_kind() {
                    Some(SourceKind::RegisterMemory) => SourceKind::RegisterMemory,
                    _ => SourceKind::Register,
                };
                let operand = cursor.expect(kind)?;
                out.bytes.push(byte_of(operand));
            }
            OperandKind::RegisterPair => {
                let source = cursor.expect_register()?;
                let destination = cursor.expect_register()?;
                out.bytes.push(pack_register_pair(source, destination));
            }
        }
    }
    cursor.finish()?;
    Ok(out)
}

fn byte_of(operand: &Operand) -> u8 {
    match operand {
        Operand::Constant(value) | Operand::Memory(value) => *value,
        Operand::Register(reg) | Operand::RegisterMemory(reg) => reg.as_u8(),
        Operand::Label(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use octet_core::{InstructionSet, Opcode, Register};

    use super::encode_instruction;
    use crate::errors::AssembleErrorKind;
    use crate::parser::Operand;

    fn encode(mnemonic: &str, operands: &[Operand]) -> Vec<u8> {
        encode_instruction(&InstructionSet::standard(), 1, mnemonic, operands)
            .expect("encodes")
            .bytes
    }

    #[test]
    fn constant_to_register() {
        assert_eq!(
            encode(
                "MOV",
                &[Operand::Constant(73), Operand::Register(Register::R1)]
            ),
            vec![Opcode::MovConstReg.as_u8(), 73, 1]
        );
    }

    #[test]
    fn register_pair_packs_source_high() {
        assert_eq!(
            encode(
                "SUB",
                &[
                    Operand::Register(Register::R3),
                    Operand::Register(Register::R5)
                ]
            ),
            vec![Opcode::Sub.as_u8(), 0x35]
        );
    }

    #[test]
    fn register_memory_forms() {
        assert_eq!(
            encode(
                "MOV",
                &[
                    Operand::RegisterMemory(Register::R1),
                    Operand::Register(Register::R2)
                ]
            ),
            vec![Opcode::LoadIndirect.as_u8(), 1, 2]
        );
        assert_eq!(
            encode(
                "MOV",
                &[
                    Operand::Register(Register::R4),
                    Operand::RegisterMemory(Register::R6)
                ]
            ),
            vec![Opcode::StoreIndirect.as_u8(), 4, 6]
        );
    }

    #[test]
    fn label_leaves_placeholder_and_fixup() {
        let encoded = encode_instruction(
            &InstructionSet::standard(),
            1,
            "JNZ",
            &[
                Operand::Register(Register::R0),
                Operand::Label("top".to_string()),
            ],
        )
        .expect("encodes");

        assert_eq!(encoded.bytes, vec![Opcode::JmpNotZero.as_u8(), 0, 0]);
        assert_eq!(encoded.fixups, vec![(2, "top".to_string())]);
    }

    #[test]
    fn unknown_and_mismatched() {
        let set = InstructionSet::standard();
        let unknown = encode_instruction(&set, 2, "HALT", &[]).expect_err("unknown");
        assert_eq!(
            unknown.kind,
            AssembleErrorKind::UnknownMnemonic("HALT".to_string())
        );

        let mismatch =
            encode_instruction(&set, 3, "INC", &[Operand::Constant(1)]).expect_err("mismatch");
        assert_eq!(
            mismatch.kind,
            AssembleErrorKind::InvalidOperandCombination {
                mnemonic: "INC".to_string(),
                operands: "constant".to_string(),
            }
        );
    }
}
