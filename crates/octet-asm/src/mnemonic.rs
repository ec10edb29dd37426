//! Mnemonic forms: which opcode a mnemonic encodes to for a given list of
//! operand kinds.

use octet_core::Opcode;

use crate::parser::SourceKind;

use SourceKind::{Constant as C, Memory as M, Register as R, RegisterMemory as RM};

/// One encoding of a mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Form {
    /// Upper-case mnemonic.
    pub mnemonic: &'static str,
    /// Operand kinds in source order.
    pub sources: &'static [SourceKind],
    /// Opcode emitted.
    pub opcode: Opcode,
}

const fn form(mnemonic: &'static str, sources: &'static [SourceKind], opcode: Opcode) -> Form {
    Form {
        mnemonic,
        sources,
        opcode,
    }
}

/// Every mnemonic form. Two-register arithmetic reads `source, destination`.
pub const FORMS: &[Form] = &[
    form("NOP", &[], Opcode::Nop),
    form("MOV", &[C, R], Opcode::MovConstReg),
    form("MOV", &[M, R], Opcode::MovMemReg),
    form("MOV", &[R, M], Opcode::MovRegMem),
    form("MOV", &[R, R], Opcode::MovRegReg),
    form("MOV", &[C, M], Opcode::MovConstMem),
    form("MOV", &[RM, R], Opcode::LoadIndirect),
    form("MOV", &[R, RM], Opcode::StoreIndirect),
    form("ADD", &[R, R], Opcode::Add),
    form("ADD", &[C, R], Opcode::AddConst),
    form("SUB", &[R, R], Opcode::Sub),
    form("SUB", &[C, R], Opcode::SubConst),
    form("MUL", &[R, R], Opcode::Mul),
    form("DIV", &[R, R], Opcode::Div),
    form("MOD", &[R, R], Opcode::Mod),
    form("INC", &[R], Opcode::Inc),
    form("DEC", &[R], Opcode::Dec),
    form("AND", &[R, R], Opcode::And),
    form("OR", &[R, R], Opcode::Or),
    form("XOR", &[R, R], Opcode::Xor),
    form("NOT", &[R], Opcode::Not),
    form("SHL", &[R], Opcode::Shl),
    form("SHR", &[R], Opcode::Shr),
    form("JMP", &[M], Opcode::Jmp),
    form("JC", &[M], Opcode::JmpCarry),
    form("JNC", &[M], Opcode::JmpNoCarry),
    form("JZ", &[R, M], Opcode::JmpZero),
    form("JNZ", &[R, M], Opcode::JmpNotZero),
    form("CALL", &[M], Opcode::Call),
    form("RET", &[], Opcode::Ret),
    form("CLC", &[], Opcode::ClearCarry),
    form("SEC", &[], Opcode::SetCarry),
    form("PRINT", &[R], Opcode::Print),
    form("PRINTC", &[R], Opcode::PrintChar),
    form("VSTORE", &[R, M], Opcode::VideoStore),
    form("BANK", &[C], Opcode::SelectBank),
    form("PALETTE", &[C], Opcode::SelectPalette),
];

/// Returns true if `mnemonic` (upper case) has at least one form.
#[must_use]
pub fn is_known(mnemonic: &str) -> bool {
    FORMS.iter().any(|form| form.mnemonic == mnemonic)
}

/// Finds the form of `mnemonic` whose operand kinds equal `kinds`.
#[must_use]
pub fn select(mnemonic: &str, kinds: &[SourceKind]) -> Option<&'static Form> {
    FORMS
        .iter()
        .find(|form| form.mnemonic == mnemonic && form.sources == kinds)
}
