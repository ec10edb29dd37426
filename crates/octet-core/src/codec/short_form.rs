//! URL query-string encoding: `fn=<name>&p=<memory>`.
//!
//! Memory is trimmed of trailing zeros and packed six bits per symbol into
//! the alphabet `A-Z a-z 0-9 - _`, three bytes to four symbols. A final
//! partial group is padded with `.` so every group has four symbols. Video
//! memory is not carried.

use super::MachineImage;
use crate::state::MEMORY_BYTES;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const PAD: u8 = b'.';

/// Renders `image` as a query string without the leading `?`.
#[must_use]
pub fn encode(image: &MachineImage) -> String {
    let payload = encode_bytes(&image.memory);
    match image.name() {
        Some(name) => format!("fn={}&p={payload}", percent_encode(name)),
        None => format!("p={payload}"),
    }
}

/// Parses a query string produced by [`encode`]. A leading `?` is allowed
/// and unknown parameters are ignored.
///
/// Returns `None` when `p` is missing or malformed or when `fn` is not valid
/// percent-encoded UTF-8.
#[must_use]
pub fn decode(query: &str) -> Option<MachineImage> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut payload = None;
    let mut filename = None;
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "p" => payload = Some(value),
            "fn" => filename = Some(percent_decode(value)?),
            _ => log::debug!("ignoring query parameter `{key}`"),
        }
    }

    let bytes = decode_bytes(payload?)?;
    let mut image = MachineImage::from_program(&bytes);
    image.filename = filename.filter(|name: &String| !name.is_empty());
    Some(image)
}

/// Packs `bytes` with trailing zeros trimmed.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    let len = bytes.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    let bytes = &bytes[..len];

    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for group in bytes.chunks(3) {
        let b0 = group[0];
        let b1 = group.get(1).copied().unwrap_or(0);
        let b2 = group.get(2).copied().unwrap_or(0);
        let symbols = [
            b0 >> 2,
            ((b0 & 0x03) << 4) | (b1 >> 4),
            ((b1 & 0x0F) << 2) | (b2 >> 6),
            b2 & 0x3F,
        ];
        for (i, symbol) in symbols.into_iter().enumerate() {
            let ch = if i <= group.len() {
                ALPHABET[usize::from(symbol)]
            } else {
                PAD
            };
            out.push(char::from(ch));
        }
    }
    out
}

/// Unpacks a payload into at most 256 bytes.
///
/// Returns `None` for a length that is not a multiple of four, a symbol
/// outside the alphabet, padding anywhere but the tail of the final group,
/// or more than 256 decoded bytes.
#[must_use]
pub fn decode_bytes(payload: &str) -> Option<Vec<u8>> {
    let payload = payload.as_bytes();
    if payload.len() % 4 != 0 {
        return None;
    }

    let groups = payload.len() / 4;
    let mut out = Vec::with_capacity(groups * 3);
    for (index, group) in payload.chunks(4).enumerate() {
        let padding = group.iter().rev().take_while(|&&c| c == PAD).count();
        let is_last = index + 1 == groups;
        if padding > 2 || (padding > 0 && !is_last) {
            return None;
        }

        let mut values = [0_u8; 4];
        for (slot, &symbol) in values.iter_mut().zip(&group[..4 - padding]) {
            *slot = symbol_value(symbol)?;
        }

        let bytes = [
            (values[0] << 2) | (values[1] >> 4),
            (values[1] << 4) | (values[2] >> 2),
            (values[2] << 6) | values[3],
        ];
        out.extend_from_slice(&bytes[..3 - padding]);
    }

    (out.len() <= MEMORY_BYTES).then_some(out)
}

fn symbol_value(symbol: u8) -> Option<u8> {
    let value = match symbol {
        b'A'..=b'Z' => symbol - b'A',
        b'a'..=b'z' => symbol - b'a' + 26,
        b'0'..=b'9' => symbol - b'0' + 52,
        b'-' => 62,
        b'_' => 63,
        _ => return None,
    };
    Some(value)
}

fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            out.push(char::from(HEX_DIGITS[usize::from(byte & 0x0F)]));
        }
    }
    out
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn percent_decode(text: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut iter = text.bytes();
    while let Some(byte) = iter.next() {
        match byte {
            b'%' => {
                let hi = char::from(iter.next()?).to_digit(16)?;
                let lo = char::from(iter.next()?).to_digit(16)?;
                bytes.push(u8::try_from(hi * 16 + lo).ok()?);
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(byte),
        }
    }
    String::from_utf8(bytes).ok()
}
