//! Transient progress-line detection.
//!
//! Decides whether a sanitized line is a live status readout that
//! should be remembered but not persisted. The heuristic is narrow on
//! purpose, tuned to common build/test-runner status formats, and is
//! kept exactly as shipped for output compatibility. Known
//! false-positive: a legitimate list item such as `2. Step two:` is
//! suppressed by the digit-prefix rule.

/// Substrings of elapsed-seconds status indicators ("3.2s Run ...").
const ELAPSED_MARKERS: [&str; 2] = ["s Run", "s Build"];

/// Returns `true` if `line` looks like a transient progress update.
///
/// Rules, first match wins:
/// 1. the line contains an elapsed-seconds run/build marker;
/// 2. after trimming whitespace, the line starts with a digit `0`–`3`
///    followed by a literal `.` (fractional-progress readouts).
pub fn is_progress_line(line: &[u8]) -> bool {
    if ELAPSED_MARKERS
        .iter()
        .any(|m| contains_bytes(line, m.as_bytes()))
    {
        return true;
    }

    let trimmed = trim_ascii(line);
    matches!(trimmed, [b'0'..=b'3', b'.', ..])
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}
