//! Small string helpers used when describing engine objects in logs.

/// Escapes backslashes, then replaces every `orig` with a backslash followed
/// by `new`.
pub fn escape_char(string: &str, orig: char, new: char) -> String {
    let mut out = String::with_capacity(string.len());
    for c in string.chars() {
        if c == '\\' {
            out.push_str("\\\\");
        } else if c == orig {
            out.push('\\');
            out.push(new);
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`escape_char`]: `\new` becomes `orig`, `\\` becomes `\`.
///
/// Any other escape sequence is left untouched, as is a trailing lone
/// backslash.
pub fn unescape_char(string: &str, orig: char, new: char) -> String {
    let mut out = String::with_capacity(string.len());
    let mut chars = string.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(n) if n == new => out.push(orig),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

pub fn new_line_escape(string: &str) -> String {
    escape_char(string, '\n', 'n')
}

pub fn new_line_unescape(string: &str) -> String {
    unescape_char(string, '\n', 'n')
}

pub fn double_quotes_escape(string: &str) -> String {
    escape_char(string, '"', '"')
}

pub fn double_quotes_unescape(string: &str) -> String {
    unescape_char(string, '"', '"')
}

/// Formats an opaque handle value the way native pointers are usually shown.
pub fn pointer(p: u64) -> String {
    format!("0x{p:x}")
}

/// `0.4567` → `"45.7%"`.
pub fn percent(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}
