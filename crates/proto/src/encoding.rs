//! ISO-8859-2 text encoding as used on the wire.
//!
//! The whiteboard protocol predates UTF-8 adoption and transmits Latin-2
//! text; peers interoperate on exact bytes, so the mapping is fixed here
//! rather than negotiated.

use thiserror::Error;

/// Errors produced when encoding outbound text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The character has no ISO-8859-2 byte value.
    #[error("character {0:?} is not representable in ISO-8859-2")]
    Unmappable(char),
}

/// Characters for bytes `0xA0..=0xFF`. Bytes below `0xA0` map to the
/// identical Unicode code point (ASCII plus the C1 control range).
const HIGH_HALF: [char; 96] = [
    '\u{00A0}', '\u{0104}', '\u{02D8}', '\u{0141}', '\u{00A4}', '\u{013D}', '\u{015A}', '\u{00A7}',
    '\u{00A8}', '\u{0160}', '\u{015E}', '\u{0164}', '\u{0179}', '\u{00AD}', '\u{017D}', '\u{017B}',
    '\u{00B0}', '\u{0105}', '\u{02DB}', '\u{0142}', '\u{00B4}', '\u{013E}', '\u{015B}', '\u{02C7}',
    '\u{00B8}', '\u{0161}', '\u{015F}', '\u{0165}', '\u{017A}', '\u{02DD}', '\u{017E}', '\u{017C}',
    '\u{0154}', '\u{00C1}', '\u{00C2}', '\u{0102}', '\u{00C4}', '\u{0139}', '\u{0106}', '\u{00C7}',
    '\u{010C}', '\u{00C9}', '\u{0118}', '\u{00CB}', '\u{011A}', '\u{00CD}', '\u{00CE}', '\u{010E}',
    '\u{0110}', '\u{0143}', '\u{0147}', '\u{00D3}', '\u{00D4}', '\u{0150}', '\u{00D6}', '\u{00D7}',
    '\u{0158}', '\u{016E}', '\u{00DA}', '\u{0170}', '\u{00DC}', '\u{00DD}', '\u{0162}', '\u{00DF}',
    '\u{0155}', '\u{00E1}', '\u{00E2}', '\u{0103}', '\u{00E4}', '\u{013A}', '\u{0107}', '\u{00E7}',
    '\u{010D}', '\u{00E9}', '\u{0119}', '\u{00EB}', '\u{011B}', '\u{00ED}', '\u{00EE}', '\u{010F}',
    '\u{0111}', '\u{0144}', '\u{0148}', '\u{00F3}', '\u{00F4}', '\u{0151}', '\u{00F6}', '\u{00F7}',
    '\u{0159}', '\u{016F}', '\u{00FA}', '\u{0171}', '\u{00FC}', '\u{00FD}', '\u{0163}', '\u{02D9}',
];

/// Decode wire bytes into text.
///
/// Every byte has a mapping, so decoding is total.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte_to_char(byte)).collect()
}

/// Encode text into wire bytes.
///
/// Fails on the first character outside the Latin-2 repertoire.
pub fn encode(text: &str) -> Result<Vec<u8>, EncodeError> {
    text.chars().map(char_to_byte).collect()
}

fn byte_to_char(byte: u8) -> char {
    if byte < 0xA0 {
        byte as char
    } else {
        HIGH_HALF[(byte - 0xA0) as usize]
    }
}

fn char_to_byte(ch: char) -> Result<u8, EncodeError> {
    let code = ch as u32;
    if code < 0xA0 {
        return Ok(code as u8);
    }
    HIGH_HALF
        .iter()
        .position(|&mapped| mapped == ch)
        .map(|index| 0xA0 + index as u8)
        .ok_or(EncodeError::Unmappable(ch))
}
