//! Wire encodings shared by every gateway request
//!
//! - Hex normalization and string/hex conversion
//! - The gateway's canonical UTC timestamp format

pub mod hex;
pub mod timestamp;

pub use self::hex::{hex_fix, hex_fix_value, hex_to_string, string_to_hex};
pub use timestamp::{format_timestamp, now_timestamp, Clock, SystemClock};
