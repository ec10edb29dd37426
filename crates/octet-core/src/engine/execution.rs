use crate::event::{Event, EventBus};
use crate::fault::Fault;
use crate::state::{Machine, Register};

/// Capability handed to an instruction's execution function.
///
/// Every mutation made through it publishes the matching change event, so an
/// execution function cannot change state silently. Jumps suppress the
/// engine's automatic program-counter advance.
pub struct Execution<'a> {
    machine: &'a mut Machine,
    bus: &'a EventBus,
    next_address: u8,
    advance_suppressed: bool,
}

impl<'a> Execution<'a> {
    pub(crate) fn new(machine: &'a mut Machine, bus: &'a EventBus) -> Self {
        let next_address = machine.program_counter().wrapping_add(1);
        Self {
            machine,
            bus,
            next_address,
            advance_suppressed: false,
        }
    }

    /// Read-only view of the machine.
    #[must_use]
    pub fn machine(&self) -> &Machine {
        self.machine
    }

    /// Address of the instruction that follows the one executing.
    #[must_use]
    pub const fn next_address(&self) -> u8 {
        self.next_address
    }

    /// Returns true once [`Execution::jump`] ran.
    #[must_use]
    pub const fn advance_suppressed(&self) -> bool {
        self.advance_suppressed
    }

    /// Reads a register.
    #[must_use]
    pub fn register(&self, reg: Register) -> u8 {
        self.machine.register(reg)
    }

    /// Writes a register.
    pub fn set_register(&mut self, reg: Register, value: u8) {
        self.machine.set_register(reg, value);
        self.bus.publish(&Event::RegisterChanged {
            register: reg,
            value,
        });
    }

    /// Reads a memory cell.
    #[must_use]
    pub fn memory(&self, address: u8) -> u8 {
        self.machine.memory(address)
    }

    /// Writes a memory cell.
    pub fn write_memory(&mut self, address: u8, value: u8) {
        self.machine.set_memory(address, value);
        self.bus.publish(&Event::MemoryChanged { address, value });
    }

    /// Writes a video memory cell.
    pub fn write_video_memory(&mut self, address: u8, value: u8) {
        self.machine.set_video_memory(address, value);
        self.bus.publish(&Event::VideoMemoryChanged { address, value });
    }

    /// Reads the carry flag.
    #[must_use]
    pub fn carry(&self) -> bool {
        self.machine.carry()
    }

    /// Writes the carry flag. Publishes only when the flag flips.
    pub fn set_carry(&mut self, carry: bool) {
        if self.machine.carry() == carry {
            return;
        }
        self.machine.set_carry(carry);
        self.bus.publish(&Event::CarryChanged { value: carry });
    }

    /// Sets the program counter and suppresses the automatic advance.
    pub fn jump(&mut self, target: u8) {
        self.machine.set_program_counter(target);
        self.advance_suppressed = true;
        self.bus.publish(&Event::ProgramCounterChanged { value: target });
    }

    /// Pushes the address of the next instruction and jumps to `target`.
    ///
    /// # Errors
    ///
    /// [`Fault::CallStackOverflow`] when the stack is full; nothing changes.
    pub fn call(&mut self, target: u8) -> Result<(), Fault> {
        let return_address = self.next_address;
        self.machine.call_stack_mut().push(return_address)?;
        self.jump(target);
        Ok(())
    }

    /// Pops a return address and jumps to it.
    ///
    /// # Errors
    ///
    /// [`Fault::CallStackUnderflow`] when the stack is empty. The program
    /// counter then stays on the `RET`.
    pub fn ret(&mut self) -> Result<(), Fault> {
        let Ok(target) = self.machine.call_stack_mut().pop() else {
            self.advance_suppressed = true;
            return Err(Fault::CallStackUnderflow);
        };
        self.jump(target);
        Ok(())
    }

    /// Selects the active bank.
    ///
    /// # Errors
    ///
    /// [`Fault::ParameterOutOfRange`] for a bank past the configured count.
    pub fn select_bank(&mut self, bank: u8) -> Result<(), Fault> {
        self.machine.select_bank(bank)?;
        self.bus.publish(&Event::BankSelected { bank });
        Ok(())
    }

    /// Selects the color palette.
    ///
    /// # Errors
    ///
    /// [`Fault::ParameterOutOfRange`] for a palette past the configured count.
    pub fn select_palette(&mut self, palette: u8) -> Result<(), Fault> {
        self.machine.select_palette(palette)?;
        self.bus.publish(&Event::PaletteSelected { palette });
        Ok(())
    }

    /// Asks the host to print `text`.
    pub fn print(&mut self, text: impl Into<String>) {
        self.bus.publish(&Event::PrintRequested { text: text.into() });
    }

    /// Publishes an arbitrary event.
    pub fn publish(&self, event: &Event) {
        self.bus.publish(event);
    }
}
