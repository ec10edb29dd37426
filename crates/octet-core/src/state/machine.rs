use crate::fault::Fault;
use crate::state::registers::{Register, RegisterFile};
use crate::MachineConfig;

/// Size in bytes of main memory and of the video bank.
pub const MEMORY_BYTES: usize = 256;

/// Bounded stack of return addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStack {
    frames: Vec<u8>,
    depth: usize,
}

impl CallStack {
    /// Creates an empty stack holding at most `depth` return addresses.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        Self {
            frames: Vec::with_capacity(depth),
            depth,
        }
    }

    /// Pushes a return address.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::CallStackOverflow`] when the stack is full; the stack
    /// is left untouched.
    pub fn push(&mut self, address: u8) -> Result<(), Fault> {
        if self.frames.len() >= self.depth {
            return Err(Fault::CallStackOverflow { depth: self.depth });
        }
        self.frames.push(address);
        Ok(())
    }

    /// Pops the most recent return address.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::CallStackUnderflow`] when the stack is empty.
    pub fn pop(&mut self) -> Result<u8, Fault> {
        self.frames.pop().ok_or(Fault::CallStackUnderflow)
    }

    /// Return addresses, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[u8] {
        &self.frames
    }

    /// Maximum number of frames.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    fn clear(&mut self) {
        self.frames.clear();
    }
}

/// All mutable state of the 8-bit machine.
///
/// Mutators here are silent. Anything that should be observable goes through
/// [`crate::Engine`] or [`crate::Execution`], which publish change events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    memory: [u8; MEMORY_BYTES],
    video_memory: [u8; MEMORY_BYTES],
    registers: RegisterFile,
    program_counter: u8,
    carry: bool,
    call_stack: CallStack,
    bank_selector: u8,
    color_palette_id: u8,
    bank_count: u8,
    palette_count: u8,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(&MachineConfig::default())
    }
}

impl Machine {
    /// Creates a zeroed machine sized by `config`.
    #[must_use]
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            memory: [0; MEMORY_BYTES],
            video_memory: [0; MEMORY_BYTES],
            registers: RegisterFile::default(),
            program_counter: 0,
            carry: false,
            call_stack: CallStack::new(config.call_stack_depth),
            bank_selector: 0,
            color_palette_id: 0,
            bank_count: config.bank_count,
            palette_count: config.palette_count,
        }
    }

    /// Restores power-on state. Limits from the configuration are kept.
    pub fn reset(&mut self) {
        self.memory = [0; MEMORY_BYTES];
        self.video_memory = [0; MEMORY_BYTES];
        self.registers = RegisterFile::default();
        self.program_counter = 0;
        self.carry = false;
        self.call_stack.clear();
        self.bank_selector = 0;
        self.color_palette_id = 0;
    }

    /// Copies `program` to the start of memory and returns the number of
    /// bytes copied (at most 256).
    pub fn copy_program(&mut self, program: &[u8]) -> usize {
        let len = program.len().min(MEMORY_BYTES);
        self.memory[..len].copy_from_slice(&program[..len]);
        len
    }

    /// Reads a memory cell.
    #[must_use]
    pub const fn memory(&self, address: u8) -> u8 {
        self.memory[address as usize]
    }

    /// Writes a memory cell.
    pub const fn set_memory(&mut self, address: u8, value: u8) {
        self.memory[address as usize] = value;
    }

    /// The whole main memory bank.
    #[must_use]
    pub const fn memory_bytes(&self) -> &[u8; MEMORY_BYTES] {
        &self.memory
    }

    /// Reads a video memory cell.
    #[must_use]
    pub const fn video_memory(&self, address: u8) -> u8 {
        self.video_memory[address as usize]
    }

    /// Writes a video memory cell.
    pub const fn set_video_memory(&mut self, address: u8, value: u8) {
        self.video_memory[address as usize] = value;
    }

    /// The whole video memory bank.
    #[must_use]
    pub const fn video_memory_bytes(&self) -> &[u8; MEMORY_BYTES] {
        &self.video_memory
    }

    /// Reads a register.
    #[must_use]
    pub const fn register(&self, reg: Register) -> u8 {
        self.registers.get(reg)
    }

    /// Writes a register.
    pub const fn set_register(&mut self, reg: Register, value: u8) {
        self.registers.set(reg, value);
    }

    /// The register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn program_counter(&self) -> u8 {
        self.program_counter
    }

    /// Writes the program counter.
    pub const fn set_program_counter(&mut self, value: u8) {
        self.program_counter = value;
    }

    /// Moves the program counter one byte forward, wrapping 255 to 0.
    pub const fn advance_program_counter(&mut self) -> u8 {
        self.program_counter = self.program_counter.wrapping_add(1);
        self.program_counter
    }

    /// Reads the carry flag.
    #[must_use]
    pub const fn carry(&self) -> bool {
        self.carry
    }

    /// Writes the carry flag.
    pub const fn set_carry(&mut self, carry: bool) {
        self.carry = carry;
    }

    /// The call stack.
    #[must_use]
    pub const fn call_stack(&self) -> &CallStack {
        &self.call_stack
    }

    /// Mutable access to the call stack.
    pub const fn call_stack_mut(&mut self) -> &mut CallStack {
        &mut self.call_stack
    }

    /// Active bank selector.
    #[must_use]
    pub const fn bank_selector(&self) -> u8 {
        self.bank_selector
    }

    /// Selects a bank.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ParameterOutOfRange`] when `bank` is not below the
    /// configured bank count.
    pub const fn select_bank(&mut self, bank: u8) -> Result<(), Fault> {
        if bank >= self.bank_count {
            return Err(Fault::ParameterOutOfRange {
                value: bank,
                limit: self.bank_count,
            });
        }
        self.bank_selector = bank;
        Ok(())
    }

    /// Active color palette.
    #[must_use]
    pub const fn color_palette_id(&self) -> u8 {
        self.color_palette_id
    }

    /// Selects a color palette.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ParameterOutOfRange`] when `palette` is not below the
    /// configured palette count.
    pub const fn select_palette(&mut self, palette: u8) -> Result<(), Fault> {
        if palette >= self.palette_count {
            return Err(Fault::ParameterOutOfRange {
                value: palette,
                limit: self.palette_count,
            });
        }
        self.color_palette_id = palette;
        Ok(())
    }
}
