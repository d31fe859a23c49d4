//! Helpers for logging client-supplied text.
//!
//! Display names arrive straight off the socket. Escaping them keeps every log
//! record on one line so a crafted name cannot fake extra log entries.

/// Longest preview of a client string kept in a log line.
pub const MAX_LOG_PREVIEW: usize = 64;

/// Escape a client string for single-line logging, truncated to [`MAX_LOG_PREVIEW`] chars.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, MAX_LOG_PREVIEW)
}

/// Like [`escape_log`] with an explicit character limit; an ellipsis marks truncation.
pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(s.len().min(limit) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
