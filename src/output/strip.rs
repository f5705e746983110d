//! Terminal control-sequence stripping.
//!
//! Pure byte-level removal of CSI/OSC escape sequences, stray escape
//! introducers, carriage returns, and Braille spinner glyphs. This is
//! *not* a terminal emulator: nothing is interpreted, sequences are
//! simply cut out of the byte stream.
//!
//! The passes run in a fixed order (CSI, OSC, lone ESC, CR, Braille)
//! and each has documented behavior on truncated input:
//!
//! - a CSI sequence with no alphabetic terminator is removed up to the
//!   end of the input;
//! - an OSC sequence with no BEL or `ESC \` terminator aborts the OSC
//!   pass, leaving the remainder of the input unmodified;
//! - a lone ESC as the very last byte is left in place.

/// First code point of the Unicode Braille-patterns block.
const BRAILLE_FIRST: u32 = 0x2800;
/// Last code point of the Unicode Braille-patterns block.
const BRAILLE_LAST: u32 = 0x28FF;

/// Strip terminal control sequences from a byte slice.
///
/// Removes CSI sequences (`ESC [` up to and including the first
/// alphabetic byte), OSC sequences (`ESC ]` up to a BEL or `ESC \`),
/// and any remaining ESC byte together with the byte that follows it.
pub fn strip_sequences(data: &[u8]) -> Vec<u8> {
    strip_lone_escapes(&strip_osc(&strip_csi(data)))
}

/// Clean one reassembled line for durable logging.
///
/// Strips control sequences, drops surviving carriage returns and
/// Braille spinner glyphs, and collapses an all-whitespace result to
/// empty so the caller can suppress the line entirely. Interior and
/// edge whitespace of a non-blank line is preserved.
pub fn clean_line(line: &[u8]) -> Vec<u8> {
    let mut cleaned = strip_sequences(line);
    cleaned.retain(|&b| b != b'\r');
    let cleaned = strip_braille(&cleaned);

    if cleaned.iter().all(|b| b.is_ascii_whitespace()) {
        return Vec::new();
    }

    cleaned
}

/// Remove CSI sequences: `ESC [` followed by parameter bytes, ended by
/// the first alphabetic byte. Truncated sequences are removed to the
/// end of the input.
fn strip_csi(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == 0x1b && data.get(i + 1) == Some(&b'[') {
            i += 2;
            while i < data.len() {
                let b = data[i];
                i += 1;
                if b.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

/// Remove OSC sequences: `ESC ]` ended by BEL or `ESC \`.
///
/// If a sequence is unterminated the scan aborts and the remainder is
/// passed through unmodified. The introducer then falls to the
/// lone-escape fallback, which matches the historically observed
/// output for truncated input.
fn strip_osc(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == 0x1b && data.get(i + 1) == Some(&b']') {
            let body = &data[i..];
            let end = match body.iter().position(|&b| b == 0x07) {
                Some(bel) => Some(bel + 1),
                None => body
                    .windows(2)
                    .position(|w| w == [0x1b, b'\\'])
                    .map(|st| st + 2),
            };
            match end {
                Some(len) => i += len,
                None => {
                    // Unterminated: stop scanning, keep the rest as-is.
                    out.extend_from_slice(body);
                    break;
                }
            }
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

/// Remove any remaining ESC byte together with the single byte that
/// follows it. A trailing ESC with nothing after it stays.
fn strip_lone_escapes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == 0x1b && i + 1 < data.len() {
            i += 2;
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

/// Remove code points in the Braille-patterns block (spinner glyphs).
///
/// UTF-8 is decoded defensively: malformed multi-byte sequences pass
/// through byte-by-byte rather than being discarded, so unrelated
/// binary content is never corrupted.
fn strip_braille(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut rest = data;
    while !rest.is_empty() {
        let (cp, size) = decode_utf8(rest);
        match cp {
            Some(c) if (BRAILLE_FIRST..=BRAILLE_LAST).contains(&c) => {}
            _ => out.extend_from_slice(&rest[..size]),
        }
        rest = &rest[size..];
    }
    out
}

/// Decode one UTF-8 code point, returning `(code_point, bytes_consumed)`.
///
/// On malformed input returns `(None, 1)` so the caller can pass the
/// offending byte through untouched.
fn decode_utf8(data: &[u8]) -> (Option<u32>, usize) {
    let b0 = data[0];
    let len = match b0 {
        0x00..=0x7f => return (Some(b0 as u32), 1),
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return (None, 1),
    };
    if data.len() < len || data[1..len].iter().any(|&b| b & 0xc0 != 0x80) {
        return (None, 1);
    }
    let mut cp = u32::from(b0) & (0x7f >> len as u32);
    for &b in &data[1..len] {
        cp = (cp << 6) | (b as u32 & 0x3f);
    }
    (Some(cp), len)
}
