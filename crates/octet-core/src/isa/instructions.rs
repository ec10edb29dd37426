//! The standard instruction table and its execution functions.

use crate::engine::Execution;
use crate::fault::Fault;
use crate::isa::{InstructionDescriptor, Opcode, OperandKind, Operands};

use OperandKind::{Constant as C, MemoryAddress as M, Register as R, RegisterPair as P};

const fn desc(
    name: &'static str,
    description: &'static str,
    operands: &'static [OperandKind],
    execute: fn(&mut Execution<'_>, &Operands<'_>) -> Result<(), Fault>,
) -> InstructionDescriptor {
    InstructionDescriptor {
        name,
        description,
        operands,
        execute,
    }
}

/// Every standard opcode with its descriptor.
pub const STANDARD_INSTRUCTIONS: &[(Opcode, InstructionDescriptor)] = &[
    (Opcode::Nop, desc("NOP", "Does nothing.", &[], nop)),
    (
        Opcode::MovConstReg,
        desc("MOV_CONST_REG", "Loads a constant into a register.", &[C, R], mov_const_reg),
    ),
    (
        Opcode::MovMemReg,
        desc("MOV_MEM_REG", "Loads a memory cell into a register.", &[M, R], mov_mem_reg),
    ),
    (
        Opcode::MovRegMem,
        desc("MOV_REG_MEM", "Stores a register into a memory cell.", &[R, M], mov_reg_mem),
    ),
    (
        Opcode::MovRegReg,
        desc("MOV_REG_REG", "Copies one register into another.", &[P], mov_reg_reg),
    ),
    (
        Opcode::MovConstMem,
        desc("MOV_CONST_MEM", "Stores a constant into a memory cell.", &[C, M], mov_const_mem),
    ),
    (
        Opcode::LoadIndirect,
        desc(
            "LOAD_INDIRECT",
            "Loads the cell addressed by the first register into the second.",
            &[R, R],
            load_indirect,
        ),
    ),
    (
        Opcode::StoreIndirect,
        desc(
            "STORE_INDIRECT",
            "Stores the first register into the cell addressed by the second.",
            &[R, R],
            store_indirect,
        ),
    ),
    (Opcode::Add, desc("ADD", "Adds source to destination.", &[P], add)),
    (
        Opcode::AddConst,
        desc("ADD_CONST", "Adds a constant to a register.", &[C, R], add_const),
    ),
    (Opcode::Sub, desc("SUB", "Subtracts source from destination.", &[P], sub)),
    (
        Opcode::SubConst,
        desc("SUB_CONST", "Subtracts a constant from a register.", &[C, R], sub_const),
    ),
    (Opcode::Mul, desc("MUL", "Multiplies destination by source.", &[P], mul)),
    (Opcode::Div, desc("DIV", "Divides destination by source.", &[P], div)),
    (
        Opcode::Mod,
        desc("MOD", "Remainder of destination divided by source.", &[P], rem),
    ),
    (Opcode::Inc, desc("INC", "Increments a register.", &[R], inc)),
    (Opcode::Dec, desc("DEC", "Decrements a register.", &[R], dec)),
    (Opcode::And, desc("AND", "Bitwise AND into destination.", &[P], and)),
    (Opcode::Or, desc("OR", "Bitwise OR into destination.", &[P], or)),
    (Opcode::Xor, desc("XOR", "Bitwise XOR into destination.", &[P], xor)),
    (Opcode::Not, desc("NOT", "Inverts every bit of a register.", &[R], not)),
    (
        Opcode::Shl,
        desc("SHL", "Shifts a register left; bit 7 moves to carry.", &[R], shl),
    ),
    (
        Opcode::Shr,
        desc("SHR", "Shifts a register right; bit 0 moves to carry.", &[R], shr),
    ),
    (Opcode::Jmp, desc("JMP", "Jumps to an address.", &[M], jmp)),
    (
        Opcode::JmpCarry,
        desc("JMP_CARRY", "Jumps when carry is set.", &[M], jmp_carry),
    ),
    (
        Opcode::JmpNoCarry,
        desc("JMP_NO_CARRY", "Jumps when carry is clear.", &[M], jmp_no_carry),
    ),
    (
        Opcode::JmpZero,
        desc("JMP_ZERO", "Jumps when a register is zero.", &[R, M], jmp_zero),
    ),
    (
        Opcode::JmpNotZero,
        desc("JMP_NOT_ZERO", "Jumps when a register is nonzero.", &[R, M], jmp_not_zero),
    ),
    (
        Opcode::Call,
        desc("CALL", "Pushes the return address and jumps.", &[M], call),
    ),
    (Opcode::Ret, desc("RET", "Returns to the last pushed address.", &[], ret)),
    (
        Opcode::ClearCarry,
        desc("CLEAR_CARRY", "Clears the carry flag.", &[], clear_carry),
    ),
    (
        Opcode::SetCarry,
        desc("SET_CARRY", "Sets the carry flag.", &[], set_carry),
    ),
    (
        Opcode::Print,
        desc("PRINT", "Prints a register as a decimal number.", &[R], print),
    ),
    (
        Opcode::PrintChar,
        desc("PRINT_CHAR", "Prints a register as a character.", &[R], print_char),
    ),
    (
        Opcode::VideoStore,
        desc("VIDEO_STORE", "Stores a register into video memory.", &[R, M], video_store),
    ),
    (
        Opcode::SelectBank,
        desc("SELECT_BANK", "Selects the active bank.", &[C], select_bank),
    ),
    (
        Opcode::SelectPalette,
        desc("SELECT_PALETTE", "Selects the color palette.", &[C], select_palette),
    ),
];

#[allow(clippy::unnecessary_wraps)]
const fn nop(_: &mut Execution<'_>, _: &Operands<'_>) -> Result<(), Fault> {
    Ok(())
}

fn mov_const_reg(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = ops.byte(0)?;
    exec.set_register(ops.register(1)?, value);
    Ok(())
}

fn mov_mem_reg(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = exec.memory(ops.byte(0)?);
    exec.set_register(ops.register(1)?, value);
    Ok(())
}

fn mov_reg_mem(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = exec.register(ops.register(0)?);
    exec.write_memory(ops.byte(1)?, value);
    Ok(())
}

fn mov_reg_reg(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let (src, dst) = ops.register_pair(0)?;
    let value = exec.register(src);
    exec.set_register(dst, value);
    Ok(())
}

fn mov_const_mem(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    exec.write_memory(ops.byte(1)?, ops.byte(0)?);
    Ok(())
}

fn load_indirect(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let address = exec.register(ops.register(0)?);
    let value = exec.memory(address);
    exec.set_register(ops.register(1)?, value);
    Ok(())
}

fn store_indirect(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = exec.register(ops.register(0)?);
    let address = exec.register(ops.register(1)?);
    exec.write_memory(address, value);
    Ok(())
}

/// Applies `op` to `dst, src`, storing the result in `dst` and the carry
/// flag.
fn pair_arith(
    exec: &mut Execution<'_>,
    ops: &Operands<'_>,
    op: fn(u8, u8) -> (u8, bool),
) -> Result<(), Fault> {
    let (src, dst) = ops.register_pair(0)?;
    let (value, carry) = op(exec.register(dst), exec.register(src));
    exec.set_register(dst, value);
    exec.set_carry(carry);
    Ok(())
}

fn const_arith(
    exec: &mut Execution<'_>,
    ops: &Operands<'_>,
    op: fn(u8, u8) -> (u8, bool),
) -> Result<(), Fault> {
    let constant = ops.byte(0)?;
    let reg = ops.register(1)?;
    let (value, carry) = op(exec.register(reg), constant);
    exec.set_register(reg, value);
    exec.set_carry(carry);
    Ok(())
}

fn pair_logic(
    exec: &mut Execution<'_>,
    ops: &Operands<'_>,
    op: fn(u8, u8) -> u8,
) -> Result<(), Fault> {
    let (src, dst) = ops.register_pair(0)?;
    let value = op(exec.register(dst), exec.register(src));
    exec.set_register(dst, value);
    Ok(())
}

fn add(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    pair_arith(exec, ops, u8::overflowing_add)
}

fn add_const(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    const_arith(exec, ops, u8::overflowing_add)
}

fn sub(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    pair_arith(exec, ops, u8::overflowing_sub)
}

fn sub_const(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    const_arith(exec, ops, u8::overflowing_sub)
}

fn mul(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    pair_arith(exec, ops, u8::overflowing_mul)
}

fn checked_pair(
    exec: &mut Execution<'_>,
    ops: &Operands<'_>,
    op: fn(u8, u8) -> Option<u8>,
) -> Result<(), Fault> {
    let (src, dst) = ops.register_pair(0)?;
    let value = op(exec.register(dst), exec.register(src)).ok_or(Fault::DivideByZero)?;
    exec.set_register(dst, value);
    Ok(())
}

fn div(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    checked_pair(exec, ops, u8::checked_div)
}

fn rem(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    checked_pair(exec, ops, u8::checked_rem)
}

fn unary(
    exec: &mut Execution<'_>,
    ops: &Operands<'_>,
    op: fn(u8) -> (u8, Option<bool>),
) -> Result<(), Fault> {
    let reg = ops.register(0)?;
    let (value, carry) = op(exec.register(reg));
    exec.set_register(reg, value);
    if let Some(carry) = carry {
        exec.set_carry(carry);
    }
    Ok(())
}

fn inc(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    unary(exec, ops, |v| {
        let (value, carry) = v.overflowing_add(1);
        (value, Some(carry))
    })
}

fn dec(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    unary(exec, ops, |v| {
        let (value, carry) = v.overflowing_sub(1);
        (value, Some(carry))
    })
}

fn and(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    pair_logic(exec, ops, |a, b| a & b)
}

fn or(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    pair_logic(exec, ops, |a, b| a | b)
}

fn xor(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    pair_logic(exec, ops, |a, b| a ^ b)
}

fn not(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    unary(exec, ops, |v| (!v, None))
}

fn shl(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    unary(exec, ops, |v| (v << 1, Some(v & 0x80 != 0)))
}

fn shr(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    unary(exec, ops, |v| (v >> 1, Some(v & 0x01 != 0)))
}

fn jmp(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    exec.jump(ops.byte(0)?);
    Ok(())
}

fn jmp_carry(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    if exec.carry() {
        exec.jump(ops.byte(0)?);
    }
    Ok(())
}

fn jmp_no_carry(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    if !exec.carry() {
        exec.jump(ops.byte(0)?);
    }
    Ok(())
}

fn jmp_zero(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    if exec.register(ops.register(0)?) == 0 {
        exec.jump(ops.byte(1)?);
    }
    Ok(())
}

fn jmp_not_zero(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    if exec.register(ops.register(0)?) != 0 {
        exec.jump(ops.byte(1)?);
    }
    Ok(())
}

fn call(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    exec.call(ops.byte(0)?)
}

fn ret(exec: &mut Execution<'_>, _: &Operands<'_>) -> Result<(), Fault> {
    exec.ret()
}

#[allow(clippy::unnecessary_wraps)]
fn clear_carry(exec: &mut Execution<'_>, _: &Operands<'_>) -> Result<(), Fault> {
    exec.set_carry(false);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn set_carry(exec: &mut Execution<'_>, _: &Operands<'_>) -> Result<(), Fault> {
    exec.set_carry(true);
    Ok(())
}

fn print(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = exec.register(ops.register(0)?);
    exec.print(value.to_string());
    Ok(())
}

fn print_char(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = exec.register(ops.register(0)?);
    exec.print(char::from(value));
    Ok(())
}

fn video_store(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    let value = exec.register(ops.register(0)?);
    exec.write_video_memory(ops.byte(1)?, value);
    Ok(())
}

fn select_bank(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    exec.select_bank(ops.byte(0)?)
}

fn select_palette(exec: &mut Execution<'_>, ops: &Operands<'_>) -> Result<(), Fault> {
    exec.select_palette(ops.byte(0)?)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::isa::pack_register_pair;
    use crate::{CycleOutcome, Engine, Fault, Opcode, Register};

    fn run(program: &[u8]) -> Engine {
        let mut engine = Engine::default();
        engine.load(program);
        while usize::from(engine.machine().program_counter()) < program.len() {
            engine.step_instruction();
        }
        engine
    }

    fn set(reg: Register, value: u8) -> [u8; 3] {
        [Opcode::MovConstReg.as_u8(), value, reg.as_u8()]
    }

    fn binary(op: Opcode, dst_value: u8, src_value: u8) -> Engine {
        let mut program = Vec::new();
        program.extend(set(Register::R1, dst_value));
        program.extend(set(Register::R2, src_value));
        program.extend([op.as_u8(), pack_register_pair(Register::R2, Register::R1)]);
        run(&program)
    }

    #[rstest]
    #[case(Opcode::Add, 200, 100, 44, true)]
    #[case(Opcode::Add, 2, 3, 5, false)]
    #[case(Opcode::Sub, 3, 5, 254, true)]
    #[case(Opcode::Sub, 9, 4, 5, false)]
    #[case(Opcode::Mul, 16, 16, 0, true)]
    #[case(Opcode::Mul, 12, 10, 120, false)]
    fn arithmetic_sets_result_and_carry(
        #[case] op: Opcode,
        #[case] dst: u8,
        #[case] src: u8,
        #[case] expected: u8,
        #[case] carry: bool,
    ) {
        let engine = binary(op, dst, src);
        assert_eq!(engine.machine().register(Register::R1), expected);
        assert_eq!(engine.machine().register(Register::R2), src);
        assert_eq!(engine.machine().carry(), carry);
    }

    #[rstest]
    #[case(Opcode::Div, 17, 5, 3)]
    #[case(Opcode::Mod, 17, 5, 2)]
    #[case(Opcode::And, 0b1100, 0b1010, 0b1000)]
    #[case(Opcode::Or, 0b1100, 0b1010, 0b1110)]
    #[case(Opcode::Xor, 0b1100, 0b1010, 0b0110)]
    #[case(Opcode::MovRegReg, 1, 99, 99)]
    fn register_pair_operations(
        #[case] op: Opcode,
        #[case] dst: u8,
        #[case] src: u8,
        #[case] expected: u8,
    ) {
        let engine = binary(op, dst, src);
        assert_eq!(engine.machine().register(Register::R1), expected);
    }

    #[test]
    fn mod_by_zero_faults() {
        let mut engine = Engine::default();
        engine.load(&[
            Opcode::Mod.as_u8(),
            pack_register_pair(Register::R0, Register::R1),
        ]);
        assert_eq!(
            engine.step_instruction(),
            CycleOutcome::Faulted {
                opcode: Opcode::Mod.as_u8(),
                fault: Fault::DivideByZero
            }
        );
    }

    #[rstest]
    #[case(Opcode::Inc, 255, 0, true)]
    #[case(Opcode::Inc, 4, 5, false)]
    #[case(Opcode::Dec, 0, 255, true)]
    #[case(Opcode::Shl, 0x81, 0x02, true)]
    #[case(Opcode::Shr, 0x81, 0x40, true)]
    #[case(Opcode::Shr, 0x80, 0x40, false)]
    fn unary_with_carry(
        #[case] op: Opcode,
        #[case] start: u8,
        #[case] expected: u8,
        #[case] carry: bool,
    ) {
        let mut program = set(Register::R3, start).to_vec();
        program.extend([op.as_u8(), Register::R3.as_u8()]);
        let engine = run(&program);
        assert_eq!(engine.machine().register(Register::R3), expected);
        assert_eq!(engine.machine().carry(), carry);
    }

    #[test]
    fn not_leaves_carry_alone() {
        let mut program = vec![Opcode::SetCarry.as_u8()];
        program.extend(set(Register::R0, 0x0F));
        program.extend([Opcode::Not.as_u8(), 0]);
        let engine = run(&program);
        assert_eq!(engine.machine().register(Register::R0), 0xF0);
        assert!(engine.machine().carry());
    }

    #[test]
    fn add_and_sub_const() {
        let mut program = set(Register::R0, 10).to_vec();
        program.extend([Opcode::AddConst.as_u8(), 250, 0]);
        program.extend([Opcode::SubConst.as_u8(), 1, 0]);
        let engine = run(&program);
        assert_eq!(engine.machine().register(Register::R0), 3);
        assert!(!engine.machine().carry());
    }

    #[test]
    fn memory_moves_and_indirection() {
        let program = [
            Opcode::MovConstMem.as_u8(),
            0x42,
            0x80,
            Opcode::MovMemReg.as_u8(),
            0x80,
            0,
            Opcode::MovConstReg.as_u8(),
            0x90,
            1,
            Opcode::StoreIndirect.as_u8(),
            0,
            1,
            Opcode::LoadIndirect.as_u8(),
            1,
            2,
            Opcode::MovRegMem.as_u8(),
            2,
            0xA0,
        ];
        let engine = run(&program);
        let machine = engine.machine();
        assert_eq!(machine.register(Register::R0), 0x42);
        assert_eq!(machine.memory(0x90), 0x42);
        assert_eq!(machine.register(Register::R2), 0x42);
        assert_eq!(machine.memory(0xA0), 0x42);
    }

    #[rstest]
    #[case(Opcode::JmpCarry, true, 0x40)]
    #[case(Opcode::JmpCarry, false, 3)]
    #[case(Opcode::JmpNoCarry, false, 0x40)]
    #[case(Opcode::JmpNoCarry, true, 3)]
    fn carry_jumps(#[case] op: Opcode, #[case] carry: bool, #[case] expected_pc: u8) {
        let flag = if carry {
            Opcode::SetCarry
        } else {
            Opcode::ClearCarry
        };
        let mut engine = Engine::default();
        engine.load(&[flag.as_u8(), op.as_u8(), 0x40]);
        engine.step_instruction();
        engine.step_instruction();
        assert_eq!(engine.machine().program_counter(), expected_pc);
    }

    #[rstest]
    #[case(Opcode::JmpZero, 0, 0x40)]
    #[case(Opcode::JmpZero, 1, 3)]
    #[case(Opcode::JmpNotZero, 1, 0x40)]
    #[case(Opcode::JmpNotZero, 0, 3)]
    fn register_jumps(#[case] op: Opcode, #[case] value: u8, #[case] expected_pc: u8) {
        let mut engine = Engine::default();
        engine.load(&[op.as_u8(), 5, 0x40]);
        engine.set_register(Register::R5, value);
        engine.step_instruction();
        assert_eq!(engine.machine().program_counter(), expected_pc);
    }

    #[test]
    fn call_and_ret_round_trip() {
        // 0: CALL 5 ; 2: INC R0 ; 4: NOP ; 5: RET
        let mut engine = Engine::default();
        engine.load(&[
            Opcode::Call.as_u8(),
            5,
            Opcode::Inc.as_u8(),
            0,
            Opcode::Nop.as_u8(),
            Opcode::Ret.as_u8(),
        ]);

        engine.step_instruction();
        assert_eq!(engine.machine().program_counter(), 5);
        assert_eq!(engine.machine().call_stack().frames(), &[2]);

        engine.step_instruction();
        assert_eq!(engine.machine().program_counter(), 2);
        assert!(engine.machine().call_stack().frames().is_empty());

        engine.step_instruction();
        assert_eq!(engine.machine().register(Register::R0), 1);
    }

    #[test]
    fn ret_on_empty_stack_faults_and_holds_pc() {
        let mut engine = Engine::default();
        engine.load(&[Opcode::Ret.as_u8()]);
        assert_eq!(
            engine.step_instruction(),
            CycleOutcome::Faulted {
                opcode: Opcode::Ret.as_u8(),
                fault: Fault::CallStackUnderflow
            }
        );
        assert_eq!(engine.machine().program_counter(), 0);
    }

    #[test]
    fn video_store_and_selectors() {
        let mut program = set(Register::R4, 7).to_vec();
        program.extend([Opcode::VideoStore.as_u8(), 4, 0x33]);
        program.extend([Opcode::SelectBank.as_u8(), 2]);
        program.extend([Opcode::SelectPalette.as_u8(), 3]);
        let engine = run(&program);
        assert_eq!(engine.machine().video_memory(0x33), 7);
        assert_eq!(engine.machine().bank_selector(), 2);
        assert_eq!(engine.machine().color_palette_id(), 3);
    }

    #[test]
    fn select_bank_out_of_range_faults() {
        let mut engine = Engine::default();
        engine.load(&[Opcode::SelectBank.as_u8(), 4]);
        assert_eq!(
            engine.step_instruction(),
            CycleOutcome::Faulted {
                opcode: Opcode::SelectBank.as_u8(),
                fault: Fault::ParameterOutOfRange { value: 4, limit: 4 }
            }
        );
        assert_eq!(engine.machine().bank_selector(), 0);
    }
}
