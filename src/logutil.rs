//! Keep player input on one log line.

const MAX_PREVIEW: usize = 200;

/// Escape control characters in `s` and cut it at `MAX_PREVIEW` chars.
/// Player lines and generated text both go through this before logging.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Short form of a user id for log lines.
pub fn short_id(user_id: &str) -> &str {
    match user_id.char_indices().nth(8) {
        Some((idx, _)) => &user_id[..idx],
        None => user_id,
    }
}
