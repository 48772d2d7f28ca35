//! Code point transforms
//!
//! Turns caller strings into the `u32` code point sequences the renderer
//! consumes, and back into UTF-16 for hosts that want it.

/// Decode UTF-8 leniently; invalid sequences are dropped
pub fn code_points_utf8(bytes: &[u8]) -> impl Iterator<Item = u32> + Clone + '_ {
    bytes
        .utf8_chunks()
        .flat_map(|chunk| chunk.valid().chars().map(u32::from))
}

/// Decode UTF-16, combining surrogate pairs; unpaired surrogates are dropped
pub fn code_points_utf16(units: &[u16]) -> impl Iterator<Item = u32> + '_ {
    char::decode_utf16(units.iter().copied()).filter_map(|r| r.ok().map(u32::from))
}

/// Encode code points as UTF-16.
///
/// Code points at or above `0x10000` become a high/low surrogate pair.
/// Surrogates and values past `0x10FFFF` are not scalar values and are
/// skipped.
pub fn encode_utf16(code_points: &[u32]) -> Vec<u16> {
    let mut out = Vec::with_capacity(code_points.len());
    let mut buf = [0u16; 2];
    for c in code_points.iter().filter_map(|&cp| char::from_u32(cp)) {
        out.extend_from_slice(c.encode_utf16(&mut buf));
    }
    out
}
