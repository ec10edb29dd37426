//! Memory disassembly for listings and debugger views.

use std::fmt::Write as _;

use crate::isa::{InstructionSet, OperandKind};
use crate::state::MEMORY_BYTES;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the opcode byte.
    pub address: u8,
    /// Encoded bytes, opcode first.
    pub bytes: Vec<u8>,
    /// Descriptor name, or `.byte` for unbound bytes.
    pub mnemonic: String,
    /// Formatted operands, e.g. `73, R1`.
    pub operands: String,
    /// Whether the opcode byte is unbound.
    pub is_illegal: bool,
}

impl DisassemblyRow {
    /// Encoded length in bytes.
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.bytes.len()
    }
}

/// Disassembles the instruction starting at `address`.
///
/// Operand bytes wrap around the end of memory like the program counter.
/// Operand bytes the declared kind rejects are rendered as `?0xNN`.
#[must_use]
pub fn disassemble_one(
    address: u8,
    memory: &[u8; MEMORY_BYTES],
    set: &InstructionSet,
) -> DisassemblyRow {
    let opcode = memory[usize::from(address)];
    let Some(descriptor) = set.lookup(opcode) else {
        return DisassemblyRow {
            address,
            bytes: vec![opcode],
            mnemonic: ".byte".to_string(),
            operands: format!("0x{opcode:02X}"),
            is_illegal: true,
        };
    };

    let mut bytes = vec![opcode];
    let mut operands = String::new();
    let mut cursor = address;
    for (i, kind) in descriptor.operands.iter().enumerate() {
        cursor = cursor.wrapping_add(1);
        let byte = memory[usize::from(cursor)];
        bytes.push(byte);
        if i > 0 {
            operands.push_str(", ");
        }
        format_operand(&mut operands, *kind, byte);
    }

    DisassemblyRow {
        address,
        bytes,
        mnemonic: descriptor.name.to_string(),
        operands,
        is_illegal: false,
    }
}

/// Disassembles up to `count` consecutive instructions from `start`.
///
/// Stops early if the listing would wrap past the end of memory.
#[must_use]
pub fn disassemble(
    start: u8,
    count: usize,
    memory: &[u8; MEMORY_BYTES],
    set: &InstructionSet,
) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut address = usize::from(start);
    while rows.len() < count && address < MEMORY_BYTES {
        let Ok(at) = u8::try_from(address) else {
            break;
        };
        let row = disassemble_one(at, memory, set);
        address += row.len_bytes();
        rows.push(row);
    }
    rows
}

/// Disassembles `before` instructions ahead of `center`, the instruction at
/// `center`, and `after` instructions following it.
///
/// Instruction boundaries before `center` are recovered by decoding linearly
/// from address 0; if `center` lies inside another instruction's operands the
/// listing still starts a row at `center`.
#[must_use]
pub fn disassemble_window(
    center: u8,
    before: usize,
    after: usize,
    memory: &[u8; MEMORY_BYTES],
    set: &InstructionSet,
) -> Vec<DisassemblyRow> {
    let mut leading = Vec::new();
    let mut address = 0_usize;
    while address < usize::from(center) {
        let Ok(at) = u8::try_from(address) else {
            break;
        };
        let row = disassemble_one(at, memory, set);
        if address + row.len_bytes() > usize::from(center) {
            break;
        }
        address += row.len_bytes();
        leading.push(row);
    }
    let skip = leading.len().saturating_sub(before);

    let mut rows: Vec<DisassemblyRow> = leading.into_iter().skip(skip).collect();
    rows.extend(disassemble(center, after + 1, memory, set));
    rows
}

fn format_operand(out: &mut String, kind: OperandKind, byte: u8) {
    if !kind.accepts(byte) {
        let _ = write!(out, "?0x{byte:02X}");
        return;
    }
    let _ = match kind {
        OperandKind::Constant => write!(out, "{byte}"),
        OperandKind::Register => write!(out, "R{byte}"),
        OperandKind::MemoryAddress => write!(out, "[0x{byte:02X}]"),
        OperandKind::RegisterPair => write!(out, "R{} -> R{}", byte >> 4, byte & 0x0F),
    };
}

#[cfg(test)]
mod tests {
    use super::{disassemble, disassemble_one, disassemble_window};
    use crate::{InstructionSet, Opcode, MEMORY_BYTES};

    fn memory(program: &[u8]) -> [u8; MEMORY_BYTES] {
        let mut memory = [0; MEMORY_BYTES];
        memory[..program.len()].copy_from_slice(program);
        memory
    }

    #[test]
    fn formats_each_operand_kind() {
        let set = InstructionSet::standard();
        let memory = memory(&[
            Opcode::MovConstReg.as_u8(),
            73,
            1,
            Opcode::MovRegMem.as_u8(),
            2,
            0x40,
            Opcode::Add.as_u8(),
            0x21,
        ]);

        let rows = disassemble(0, 3, &memory, &set);

        let text: Vec<_> = rows
            .iter()
            .map(|row| format!("{} {}", row.mnemonic, row.operands))
            .collect();
        assert_eq!(
            text,
            vec!["MOV_CONST_REG 73, R1", "MOV_REG_MEM R2, [0x40]", "ADD R2 -> R1"]
        );
        assert_eq!(rows[1].address, 3);
        assert_eq!(rows[2].bytes, vec![Opcode::Add.as_u8(), 0x21]);
    }

    #[test]
    fn unbound_byte_is_illegal_row() {
        let set = InstructionSet::standard();
        let row = disassemble_one(0, &memory(&[0xEE]), &set);
        assert!(row.is_illegal);
        assert_eq!(row.mnemonic, ".byte");
        assert_eq!(row.operands, "0xEE");
        assert_eq!(row.len_bytes(), 1);
    }

    #[test]
    fn rejected_operand_is_flagged() {
        let set = InstructionSet::standard();
        let row = disassemble_one(0, &memory(&[Opcode::Inc.as_u8(), 9]), &set);
        assert_eq!(row.operands, "?0x09");
    }

    #[test]
    fn operands_wrap_at_end_of_memory() {
        let set = InstructionSet::standard();
        let mut memory = memory(&[5]);
        memory[255] = Opcode::Inc.as_u8();
        let row = disassemble_one(255, &memory, &set);
        assert_eq!(row.bytes, vec![Opcode::Inc.as_u8(), 5]);
    }

    #[test]
    fn window_recovers_preceding_instructions() {
        let set = InstructionSet::standard();
        let memory = memory(&[
            Opcode::MovConstReg.as_u8(),
            1,
            0,
            Opcode::Inc.as_u8(),
            0,
            Opcode::Nop.as_u8(),
            Opcode::Nop.as_u8(),
        ]);

        let rows = disassemble_window(5, 1, 1, &memory, &set);

        let addresses: Vec<_> = rows.iter().map(|row| row.address).collect();
        assert_eq!(addresses, vec![3, 5, 6]);
    }
}
