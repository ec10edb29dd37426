//! Byte-at-a-time decode/execute engine.
//!
//! Each [`Engine::cycle`] consumes exactly one byte at the program counter:
//!
//! 1. With no pending instruction the byte is an opcode. Unbound bytes are
//!    reported and skipped; bound ones start a pending instruction.
//! 2. While collecting, the byte is stored as the next operand.
//! 3. When the last operand arrives (or straight after fetch for operand-less
//!    instructions) the operands are validated and the instruction runs.
//!
//! The byte consumed by a cycle is always stepped over afterwards, except when
//! an executing instruction set the program counter itself.

mod execution;
mod pending;

pub use execution::Execution;
pub use pending::PendingInstruction;

use crate::api::{CycleOutcome, MachineConfig, MachineSnapshot, PendingSnapshot, Phase};
use crate::codec::MachineImage;
use crate::event::{Event, EventBus};
use crate::isa::{InstructionSet, Operands};
use crate::state::{Machine, Register};

/// The machine, its instruction set and its event bus.
#[derive(Debug)]
pub struct Engine {
    machine: Machine,
    instructions: InstructionSet,
    bus: EventBus,
    config: MachineConfig,
    pending: Option<PendingInstruction>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Engine {
    /// Creates an engine running the standard instruction set.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        Self::with_instruction_set(config, InstructionSet::standard())
    }

    /// Creates an engine running a custom instruction set.
    #[must_use]
    pub fn with_instruction_set(config: MachineConfig, instructions: InstructionSet) -> Self {
        Self {
            machine: Machine::new(&config),
            instructions,
            bus: EventBus::standard(),
            config,
            pending: None,
        }
    }

    /// Event bus for subscriptions.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Read-only machine state.
    #[must_use]
    pub const fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Instruction set in use.
    #[must_use]
    pub const fn instructions(&self) -> &InstructionSet {
        &self.instructions
    }

    /// Configuration the machine was built with.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Instruction currently being assembled.
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingInstruction> {
        self.pending.as_ref()
    }

    /// Current decode phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::Collecting
        } else {
            Phase::Idle
        }
    }

    /// Consumes one byte and advances the decode state machine.
    pub fn cycle(&mut self) -> CycleOutcome {
        let position = self.machine.program_counter();
        let byte = self.machine.memory(position);

        let Some(mut pending) = self.pending.take() else {
            return self.fetch(byte, position);
        };

        let Some(kind) = pending.collect(byte) else {
            // A complete instruction is never left pending.
            return self.execute(&pending);
        };
        self.bus.publish(&Event::ParameterParsed {
            kind,
            byte,
            position,
        });

        if pending.is_ready() {
            return self.execute(&pending);
        }

        self.pending = Some(pending);
        self.advance();
        CycleOutcome::OperandCollected { byte }
    }

    /// Cycles until the current instruction completes, is rejected, or an
    /// invalid byte is skipped. Returns the final cycle's outcome.
    ///
    /// Takes at most one cycle per byte of the longest descriptor in the
    /// instruction set, since every non-completing cycle collects one operand.
    pub fn step_instruction(&mut self) -> CycleOutcome {
        loop {
            let outcome = self.cycle();
            if outcome.completes_instruction() {
                return outcome;
            }
        }
    }

    /// Runs `cycles` cycles and returns how many instructions completed.
    pub fn run(&mut self, cycles: usize) -> usize {
        (0..cycles)
            .filter(|_| self.cycle().completes_instruction())
            .count()
    }

    /// Resets the machine and copies `program` to address 0.
    ///
    /// Publishes `Reset`, one `MemoryChanged` per copied byte, then
    /// `ProgramCounterChanged` for address 0. Returns the number of bytes
    /// copied.
    pub fn load(&mut self, program: &[u8]) -> usize {
        self.pending = None;
        self.machine.reset();
        self.bus.publish(&Event::Reset);

        let copied = self.machine.copy_program(program);
        for (address, value) in (0_u8..=255).zip(program.iter().copied()) {
            self.bus.publish(&Event::MemoryChanged { address, value });
        }
        self.bus.publish(&Event::ProgramCounterChanged { value: 0 });

        log::debug!("loaded {copied} bytes");
        copied
    }

    /// Loads a decoded state image: memory via [`Engine::load`], then every
    /// nonzero video memory cell.
    pub fn load_image(&mut self, image: &MachineImage) {
        self.load(&image.memory);
        for (address, value) in (0_u8..=255).zip(image.video_memory.iter().copied()) {
            if value != 0 {
                self.set_video_memory(address, value);
            }
        }
    }

    /// Captures memory and video memory as a state image.
    #[must_use]
    pub fn image(&self, filename: Option<String>) -> MachineImage {
        MachineImage {
            filename,
            memory: *self.machine.memory_bytes(),
            video_memory: *self.machine.video_memory_bytes(),
        }
    }

    /// Restores power-on state and publishes `Reset`.
    pub fn reset(&mut self) {
        self.pending = None;
        self.machine.reset();
        self.bus.publish(&Event::Reset);
    }

    /// Copies out the full machine state.
    #[must_use]
    pub fn get_state(&self) -> MachineSnapshot {
        MachineSnapshot {
            memory: self.machine.memory_bytes().to_vec(),
            video_memory: self.machine.video_memory_bytes().to_vec(),
            registers: self.machine.registers().values(),
            program_counter: self.machine.program_counter(),
            carry: self.machine.carry(),
            call_stack: self.machine.call_stack().frames().to_vec(),
            bank_selector: self.machine.bank_selector(),
            color_palette_id: self.machine.color_palette_id(),
            phase: self.phase(),
            pending: self.pending.as_ref().map(|pending| PendingSnapshot {
                opcode: pending.opcode(),
                name: pending.descriptor().name.to_string(),
                position: pending.position(),
                required: pending.required(),
                collected: pending.operands().to_vec(),
            }),
        }
    }

    /// Live-edits a register.
    pub fn set_register(&mut self, register: Register, value: u8) {
        self.machine.set_register(register, value);
        self.bus.publish(&Event::RegisterChanged { register, value });
    }

    /// Live-edits a memory cell.
    pub fn set_memory(&mut self, address: u8, value: u8) {
        self.machine.set_memory(address, value);
        self.bus.publish(&Event::MemoryChanged { address, value });
    }

    /// Live-edits a video memory cell.
    pub fn set_video_memory(&mut self, address: u8, value: u8) {
        self.machine.set_video_memory(address, value);
        self.bus.publish(&Event::VideoMemoryChanged { address, value });
    }

    /// Live-edits the program counter. Any pending instruction is dropped.
    pub fn set_program_counter(&mut self, value: u8) {
        self.pending = None;
        self.machine.set_program_counter(value);
        self.bus.publish(&Event::ProgramCounterChanged { value });
    }

    fn fetch(&mut self, byte: u8, position: u8) -> CycleOutcome {
        let Some(descriptor) = self.instructions.lookup(byte).copied() else {
            log::trace!("{position:02X}: invalid byte {byte:02X}");
            self.bus.publish(&Event::InvalidByteParsed { byte, position });
            self.advance();
            return CycleOutcome::InvalidByte { byte };
        };

        self.bus.publish(&Event::InstructionParseBegun {
            opcode: byte,
            position,
        });

        let pending = PendingInstruction::new(byte, position, descriptor);
        if pending.is_ready() {
            return self.execute(&pending);
        }

        self.pending = Some(pending);
        self.advance();
        CycleOutcome::Fetched { opcode: byte }
    }

    fn execute(&mut self, pending: &PendingInstruction) -> CycleOutcome {
        let opcode = pending.opcode();
        let position = pending.position();
        let descriptor = pending.descriptor();

        let mut jumped = false;
        let result = match pending.validate() {
            Ok(()) => {
                let mut execution = Execution::new(&mut self.machine, &self.bus);
                let operands = Operands::new(pending.operands());
                let result = (descriptor.execute)(&mut execution, &operands);
                jumped = execution.advance_suppressed();
                result
            }
            Err(fault) => Err(fault),
        };

        let outcome = match result {
            Ok(()) => {
                log::trace!(
                    "{position:02X}: {} {:02X?}",
                    descriptor.name,
                    pending.operands()
                );
                self.bus.publish(&Event::InstructionExecuted { opcode });
                CycleOutcome::Executed { opcode }
            }
            Err(fault) => {
                log::debug!("{position:02X}: {} aborted: {fault}", descriptor.name);
                self.bus.publish(&Event::Error {
                    opcode,
                    position,
                    fault,
                });
                CycleOutcome::Faulted { opcode, fault }
            }
        };

        if !jumped {
            self.advance();
        }
        outcome
    }

    fn advance(&mut self) {
        let value = self.machine.advance_program_counter();
        self.bus.publish(&Event::ProgramCounterChanged { value });
    }
}
