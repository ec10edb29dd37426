//! Text serializations of machine memory.
//!
//! [`long_form`] is a commented, line-oriented file format that also carries
//! video memory and a file name. [`short_form`] packs memory into a URL query
//! string.

pub mod long_form;
pub mod short_form;

use thiserror::Error;

use crate::state::MEMORY_BYTES;

/// Memory contents plus the name they were saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineImage {
    /// Name of the program. Empty names are treated as absent.
    pub filename: Option<String>,
    /// Main memory.
    pub memory: [u8; MEMORY_BYTES],
    /// Video memory.
    pub video_memory: [u8; MEMORY_BYTES],
}

impl Default for MachineImage {
    fn default() -> Self {
        Self {
            filename: None,
            memory: [0; MEMORY_BYTES],
            video_memory: [0; MEMORY_BYTES],
        }
    }
}

impl MachineImage {
    /// Builds an image whose memory starts with `program`. Bytes past 256
    /// are dropped.
    #[must_use]
    pub fn from_program(program: &[u8]) -> Self {
        let mut image = Self::default();
        let len = program.len().min(MEMORY_BYTES);
        image.memory[..len].copy_from_slice(&program[..len]);
        image
    }

    /// File name, if present and non-empty.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.filename.as_deref().filter(|name| !name.is_empty())
    }
}

/// Long-form section names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Before the first header.
    Start,
    /// `FILENAME`.
    Filename,
    /// `MEMORY`.
    Memory,
    /// `VRAM`.
    Vram,
    /// End of input.
    End,
}

impl Section {
    /// Header keyword, if the section has one.
    #[must_use]
    pub const fn header(self) -> Option<&'static str> {
        match self {
            Self::Filename => Some("FILENAME"),
            Self::Memory => Some("MEMORY"),
            Self::Vram => Some("VRAM"),
            Self::Start | Self::End => None,
        }
    }

    /// Returns true if `next` may directly follow `self`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::Filename | Self::Memory)
                | (Self::Filename, Self::Memory)
                | (Self::Memory, Self::Vram | Self::End)
                | (Self::Vram, Self::End)
        )
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.header() {
            Some(header) => f.write_str(header),
            None if *self == Self::Start => f.write_str("start of file"),
            None => f.write_str("end of file"),
        }
    }
}

/// Non-fatal problem found while decoding the long form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecWarning {
    /// A section header appeared where it is not allowed.
    #[error("line {line}: {found} may not follow {after}")]
    OutOfOrderSection {
        /// 1-based line number, 0 for end of input.
        line: usize,
        /// Section being entered.
        found: Section,
        /// Section being left.
        after: Section,
    },
    /// A byte token could not be parsed.
    #[error("line {line}: illegal byte `{token}`")]
    IllegalToken {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// Byte data appeared outside `MEMORY` or `VRAM`.
    #[error("line {line}: byte data outside a memory section")]
    ByteOutsideSection {
        /// 1-based line number.
        line: usize,
    },
    /// A section held more than 256 bytes.
    #[error("line {line}: {section} holds more than 256 bytes")]
    SectionOverflow {
        /// 1-based line number of the first excess byte.
        line: usize,
        /// Section that overflowed.
        section: Section,
    },
}
