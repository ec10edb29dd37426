//! Line-oriented state file.
//!
//! ```text
//! # octet machine state
//! FILENAME
//! demo
//! MEMORY
//! 0x01, 0x00, 0x00, ...
//! VRAM
//! 0x00, 0x07, ...
//! ```
//!
//! Lines starting with `#` are comments. The line following `FILENAME` is
//! taken verbatim as the name. Byte lines hold comma-separated `0xNN` or
//! decimal tokens.

use std::fmt::Write as _;

use super::{CodecWarning, MachineImage, Section};
use crate::state::MEMORY_BYTES;

const BANNER: &str = "# octet machine state";
const BYTES_PER_LINE: usize = 16;

/// Renders `image` as a long-form state file.
///
/// `FILENAME` is written only for a non-empty name, with line breaks turned
/// into spaces. `VRAM` is written only when video memory holds a nonzero
/// byte.
#[must_use]
pub fn encode(image: &MachineImage) -> String {
    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');

    if let Some(name) = image.name() {
        out.push_str("FILENAME\n");
        out.push_str(&name.replace(['\r', '\n'], " "));
        out.push('\n');
    }

    write_section(&mut out, Section::Memory, &image.memory);
    if image.video_memory.iter().any(|&b| b != 0) {
        write_section(&mut out, Section::Vram, &image.video_memory);
    }
    out
}

fn write_section(out: &mut String, section: Section, bytes: &[u8; MEMORY_BYTES]) {
    if let Some(header) = section.header() {
        out.push_str(header);
        out.push('\n');
    }
    for row in bytes.chunks(BYTES_PER_LINE) {
        for byte in row {
            let _ = write!(out, "0x{byte:02X}, ");
        }
        out.push('\n');
    }
}

/// Parses a long-form state file.
///
/// Never fails: problems are collected as warnings, each also logged with
/// `log::warn!`, and the image holds whatever was recovered. Sections that
/// are missing or short leave zeros.
#[must_use]
pub fn decode(text: &str) -> (MachineImage, Vec<CodecWarning>) {
    let mut decoder = Decoder::default();
    for (index, line) in text.lines().enumerate() {
        decoder.line(index + 1, line);
    }
    decoder.finish()
}

#[derive(Default)]
struct Decoder {
    image: MachineImage,
    warnings: Vec<CodecWarning>,
    section: Option<Section>,
    expecting_name: bool,
    memory_len: usize,
    vram_len: usize,
    overflowed: Vec<Section>,
}

impl Decoder {
    fn current(&self) -> Section {
        self.section.unwrap_or(Section::Start)
    }

    fn warn(&mut self, warning: CodecWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    fn enter(&mut self, line: usize, next: Section) {
        let current = self.current();
        if !current.can_advance_to(next) {
            self.warn(CodecWarning::OutOfOrderSection {
                line,
                found: next,
                after: current,
            });
        }
        self.section = Some(next);
    }

    fn line(&mut self, number: usize, raw: &str) {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if self.expecting_name {
            self.expecting_name = false;
            self.image.filename = Some(raw.to_string());
            return;
        }

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        match line {
            "FILENAME" => {
                self.enter(number, Section::Filename);
                self.expecting_name = true;
            }
            "MEMORY" => self.enter(number, Section::Memory),
            "VRAM" => self.enter(number, Section::Vram),
            _ => self.bytes(number, line),
        }
    }

    fn bytes(&mut self, number: usize, line: &str) {
        let section = self.current();
        if !matches!(section, Section::Memory | Section::Vram) {
            self.warn(CodecWarning::ByteOutsideSection { line: number });
            return;
        }

        for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some(byte) = parse_byte(token) else {
                self.warn(CodecWarning::IllegalToken {
                    line: number,
                    token: token.to_string(),
                });
                continue;
            };
            self.push(number, section, byte);
        }
    }

    fn push(&mut self, number: usize, section: Section, byte: u8) {
        let (target, len) = match section {
            Section::Vram => (&mut self.image.video_memory, &mut self.vram_len),
            _ => (&mut self.image.memory, &mut self.memory_len),
        };
        if *len < MEMORY_BYTES {
            target[*len] = byte;
            *len += 1;
        } else if !self.overflowed.contains(&section) {
            self.overflowed.push(section);
            self.warn(CodecWarning::SectionOverflow {
                line: number,
                section,
            });
        }
    }

    fn finish(mut self) -> (MachineImage, Vec<CodecWarning>) {
        if self.expecting_name {
            self.image.filename = Some(String::new());
        }
        let current = self.current();
        if !current.can_advance_to(Section::End) {
            self.warn(CodecWarning::OutOfOrderSection {
                line: 0,
                found: Section::End,
                after: current,
            });
        }
        if self.image.name().is_none() {
            self.image.filename = None;
        }
        (self.image, self.warnings)
    }
}

fn parse_byte(token: &str) -> Option<u8> {
    let (digits, radix) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .map_or((token, 10), |hex| (hex, 16));
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u8::from_str_radix(digits, radix).ok()
}
