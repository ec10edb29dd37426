//! Host-facing configuration, outcomes and snapshots.

use crate::fault::Fault;
use crate::state::REGISTER_COUNT;

/// Default maximum call-stack depth.
pub const DEFAULT_CALL_STACK_DEPTH: usize = 16;

/// Default number of selectable banks.
pub const DEFAULT_BANK_COUNT: u8 = 4;

/// Default number of selectable color palettes.
pub const DEFAULT_PALETTE_COUNT: u8 = 4;

/// Top-level immutable configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Maximum number of return addresses on the call stack.
    pub call_stack_depth: usize,
    /// Number of banks `SELECT_BANK` accepts.
    pub bank_count: u8,
    /// Number of palettes `SELECT_PALETTE` accepts.
    pub palette_count: u8,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            call_stack_depth: DEFAULT_CALL_STACK_DEPTH,
            bank_count: DEFAULT_BANK_COUNT,
            palette_count: DEFAULT_PALETTE_COUNT,
        }
    }
}

/// What a single [`crate::Engine::cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(tag = "type")
)]
pub enum CycleOutcome {
    /// An unbound byte was skipped.
    InvalidByte {
        /// The skipped byte.
        byte: u8,
    },
    /// An opcode was fetched and operands are now being collected.
    Fetched {
        /// The opcode byte.
        opcode: u8,
    },
    /// An operand byte was collected; more are needed.
    OperandCollected {
        /// The collected byte.
        byte: u8,
    },
    /// An instruction ran to completion.
    Executed {
        /// The opcode byte.
        opcode: u8,
    },
    /// An instruction was rejected or failed.
    Faulted {
        /// The opcode byte.
        opcode: u8,
        /// Why it was aborted.
        fault: Fault,
    },
}

impl CycleOutcome {
    /// Returns true if the cycle left the engine with no pending instruction.
    #[must_use]
    pub const fn completes_instruction(self) -> bool {
        !matches!(self, Self::Fetched { .. } | Self::OperandCollected { .. })
    }
}

/// Decode phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Phase {
    /// No pending instruction; the next byte is an opcode.
    #[default]
    Idle,
    /// Operand bytes are being gathered.
    Collecting,
}

/// Host-visible view of the pending instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PendingSnapshot {
    /// The opcode byte.
    pub opcode: u8,
    /// Descriptor name.
    pub name: String,
    /// Address of the opcode.
    pub position: u8,
    /// Operand bytes the instruction needs.
    pub required: usize,
    /// Operand bytes gathered so far.
    pub collected: Vec<u8>,
}

/// Owned copy of the whole machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineSnapshot {
    /// Main memory, 256 bytes.
    pub memory: Vec<u8>,
    /// Video memory, 256 bytes.
    pub video_memory: Vec<u8>,
    /// `R0..R7`.
    pub registers: [u8; REGISTER_COUNT],
    /// Program counter.
    pub program_counter: u8,
    /// Carry flag.
    pub carry: bool,
    /// Return addresses, oldest first.
    pub call_stack: Vec<u8>,
    /// Active bank.
    pub bank_selector: u8,
    /// Active color palette.
    pub color_palette_id: u8,
    /// Decode phase.
    pub phase: Phase,
    /// Instruction being assembled, if any.
    pub pending: Option<PendingSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::{CycleOutcome, MachineConfig, DEFAULT_CALL_STACK_DEPTH};
    use crate::Fault;

    #[test]
    fn default_config_matches_documented_limits() {
        let config = MachineConfig::default();
        assert_eq!(config.call_stack_depth, DEFAULT_CALL_STACK_DEPTH);
        assert_eq!(config.bank_count, 4);
        assert_eq!(config.palette_count, 4);
    }

    #[test]
    fn only_mid_instruction_outcomes_leave_work_pending() {
        assert!(!CycleOutcome::Fetched { opcode: 1 }.completes_instruction());
        assert!(!CycleOutcome::OperandCollected { byte: 1 }.completes_instruction());
        assert!(CycleOutcome::Executed { opcode: 1 }.completes_instruction());
        assert!(CycleOutcome::InvalidByte { byte: 0xFF }.completes_instruction());
        assert!(CycleOutcome::Faulted {
            opcode: 0x15,
            fault: Fault::DivideByZero
        }
        .completes_instruction());
    }
}
