//! ASCII hex framing for binary passthrough payloads.
//!
//! Outgoing segments are rendered as space-separated, two-digit uppercase
//! hex (`"0A FF 10"`). Replies are scanned for runs of one or two hex digits;
//! each run becomes one byte, so `"0A FF"`, `"0aff"` and `"0A,FF"` all decode
//! to `[0x0A, 0xFF]`.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used)] // Static pattern
static HEX_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Fa-f0-9]{1,2}").unwrap());

/// Default number of payload bytes per passthrough exchange.
pub const DEFAULT_SEGMENT_SIZE: usize = 8;

/// Split `data` into segments of at most `segment_size` bytes.
///
/// `segment_size` must be at least 1; callers validate it through
/// `ProtocolOptions`.
pub fn segments(data: &[u8], segment_size: usize) -> std::slice::Chunks<'_, u8> {
    data.chunks(segment_size.max(1))
}

/// Render bytes as `"AA BB CC"`.
pub fn encode(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract every one- or two-digit hex token from a reply line, in order.
pub fn decode_tokens(line: &str) -> Vec<u8> {
    HEX_TOKEN
        .find_iter(line)
        .filter_map(|m| u8::from_str_radix(m.as_str(), 16).ok())
        .collect()
}

/// Like [`decode_tokens`], but for raw reply bytes.
pub fn decode_line(line: &[u8]) -> Vec<u8> {
    decode_tokens(&String::from_utf8_lossy(line))
}
