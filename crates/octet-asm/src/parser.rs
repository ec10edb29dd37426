//! Source line parser.
//!
//! Turns one line of source into a [`ParsedLine`]. Operand tokens are typed
//! here; whether the combination is legal for the mnemonic is decided later
//! by the form table.

use std::fmt;

use octet_core::Register;

use crate::errors::{AssembleError, AssembleErrorKind};

/// Kind of a source operand as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `NUM<lit>`.
    Constant,
    /// `R<n>`.
    Register,
    /// `RM<n>`: the memory cell addressed by a register.
    RegisterMemory,
    /// `M<lit>` or `:label`.
    Memory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Constant => "constant",
            Self::Register => "register",
            Self::RegisterMemory => "register memory",
            Self::Memory => "memory",
        })
    }
}

/// A typed operand token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Constant byte.
    Constant(u8),
    /// Register.
    Register(Register),
    /// Memory at the address held in a register.
    RegisterMemory(Register),
    /// Memory address.
    Memory(u8),
    /// Label reference, resolved to a memory address at link time.
    Label(String),
}

impl Operand {
    /// Kind used for form selection. Labels count as memory addresses.
    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Constant(_) => SourceKind::Constant,
            Self::Register(_) => SourceKind::Register,
            Self::RegisterMemory(_) => SourceKind::RegisterMemory,
            Self::Memory(_) | Self::Label(_) => SourceKind::Memory,
        }
    }
}

/// A parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Empty or comment-only line.
    Blank,
    /// `:name` label declaration.
    Label {
        /// Label name without the colon.
        name: String,
    },
    /// Mnemonic with operands.
    Instruction {
        /// Upper-cased mnemonic.
        mnemonic: String,
        /// Operands in source order.
        operands: Vec<Operand>,
    },
}

/// Parses one source line.
///
/// # Errors
///
/// Returns an [`AssembleError`] at `line` for malformed tokens, literals
/// outside `0..=255` and registers outside `R0..R7`.
pub fn parse_line(line: usize, text: &str) -> Result<ParsedLine, AssembleError> {
    let code = text.split_once(';').map_or(text, |(code, _)| code).trim();
    if code.is_empty() {
        return Ok(ParsedLine::Blank);
    }

    let mut tokens = code
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty());
    let Some(head) = tokens.next() else {
        return Ok(ParsedLine::Blank);
    };

    if let Some(name) = head.strip_prefix(':') {
        if let Some(extra) = tokens.next() {
            return Err(AssembleError::new(
                line,
                AssembleErrorKind::MalformedOperand(extra.to_string()),
            ));
        }
        return Ok(ParsedLine::Label {
            name: label_name(line, head, name)?,
        });
    }

    let operands = tokens
        .map(|token| parse_operand(line, token))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedLine::Instruction {
        mnemonic: head.to_ascii_uppercase(),
        operands,
    })
}

/// Parses a single operand token.
///
/// # Errors
///
/// See [`parse_line`].
pub fn parse_operand(line: usize, token: &str) -> Result<Operand, AssembleError> {
    if let Some(name) = token.strip_prefix(':') {
        return Ok(Operand::Label(label_name(line, token, name)?));
    }

    let upper = token.to_ascii_uppercase();
    if let Some(literal) = upper.strip_prefix("NUM") {
        return parse_literal(line, token, literal).map(Operand::Constant);
    }
    if let Some(number) = upper.strip_prefix("RM") {
        return parse_register(line, token, number).map(Operand::RegisterMemory);
    }
    if let Some(number) = upper.strip_prefix('R') {
        return parse_register(line, token, number).map(Operand::Register);
    }
    if let Some(literal) = upper.strip_prefix('M') {
        return parse_literal(line, token, literal).map(Operand::Memory);
    }

    Err(AssembleError::new(
        line,
        AssembleErrorKind::MalformedOperand(token.to_string()),
    ))
}

fn parse_literal(line: usize, token: &str, literal: &str) -> Result<u8, AssembleError> {
    let (digits, radix) = literal
        .strip_prefix("0X")
        .map_or((literal, 10), |hex| (hex, 16));
    // `from_str_radix` tolerates a leading sign.
    let all_digits = !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    all_digits
        .then(|| u8::from_str_radix(digits, radix).ok())
        .flatten()
        .ok_or_else(|| {
            AssembleError::new(line, AssembleErrorKind::InvalidLiteral(token.to_string()))
        })
}

fn parse_register(line: usize, token: &str, number: &str) -> Result<Register, AssembleError> {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AssembleError::new(
            line,
            AssembleErrorKind::MalformedOperand(token.to_string()),
        ));
    }
    number
        .parse::<u8>()
        .ok()
        .and_then(Register::from_index)
        .ok_or_else(|| {
            AssembleError::new(
                line,
                AssembleErrorKind::RegisterOutOfRange(token.to_string()),
            )
        })
}

fn label_name(line: usize, token: &str, name: &str) -> Result<String, AssembleError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name.to_string())
    } else {
        Err(AssembleError::new(
            line,
            AssembleErrorKind::MalformedOperand(token.to_string()),
        ))
    }
}
