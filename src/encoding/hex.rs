//! Hex normalization for addresses, IDs and payloads
//!
//! The gateway expects every hex field without a `0x` prefix. Payloads travel
//! as the hex of a string where each UTF-16 code unit contributes one byte.

use serde_json::Value;

/// Strip a single leading `0x`, if present.
pub fn hex_fix(word: &str) -> &str {
    word.strip_prefix("0x").unwrap_or(word)
}

/// Normalize a loosely typed JSON value; anything but a string yields `""`.
pub fn hex_fix_value(word: &Value) -> String {
    match word {
        Value::String(s) => hex_fix(s).to_string(),
        _ => String::new(),
    }
}

/// Encode a string as lowercase hex, one byte per UTF-16 code unit.
///
/// Code units above `0xff` keep only their low byte. The gateway hashes and
/// decodes payloads with this exact rule, so it is kept as-is.
pub fn string_to_hex(s: &str) -> String {
    s.encode_utf16()
        .map(|unit| format!("{:02x}", unit as u8))
        .collect()
}

/// Decode hex produced by [`string_to_hex`].
///
/// Each two-character group is parsed from its leading hex digits; groups with
/// none are skipped, and NUL bytes are dropped instead of ending the string.
pub fn hex_to_string(hex: &str) -> String {
    let chars: Vec<char> = hex_fix(hex).chars().collect();

    chars
        .chunks(2)
        .filter_map(|pair| {
            let digits: String = pair.iter().take_while(|c| c.is_ascii_hexdigit()).collect();
            u8::from_str_radix(&digits, 16).ok()
        })
        .filter(|&code| code != 0)
        .map(char::from)
        .collect()
}
