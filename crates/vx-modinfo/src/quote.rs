//! Double-quoted string literals for arbitrary bytes.
//!
//! The `modinfo` line of an importcfg carries binary data, so it is written as
//! a quoted literal the compiler can unquote byte-for-byte: valid printable
//! UTF-8 stays as-is, everything else is escaped.
//!
//! "Printable" is decided without Unicode tables: unassigned code points are
//! kept verbatim where a table-driven quoter would escape them. Both forms
//! unquote to the same bytes, but text outside ASCII can be quoted
//! differently from other tools. The provenance markers and checksums are
//! ASCII or invalid UTF-8 and are not affected.

use std::fmt::Write;

/// Quote `bytes` as a double-quoted literal.
pub fn quote_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');

    for chunk in bytes.utf8_chunks() {
        for ch in chunk.valid().chars() {
            push_char(&mut out, ch);
        }
        for byte in chunk.invalid() {
            let _ = write!(out, "\\x{byte:02x}");
        }
    }

    out.push('"');
    out
}

fn push_char(out: &mut String, ch: char) {
    match ch {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\u{07}' => out.push_str("\\a"),
        '\u{08}' => out.push_str("\\b"),
        '\u{0c}' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{0b}' => out.push_str("\\v"),
        c if c.is_ascii_control() => {
            let _ = write!(out, "\\x{:02x}", c as u32);
        }
        c if c.is_ascii() || is_printable(c) => out.push(c),
        c if (c as u32) < 0x10000 => {
            let _ = write!(out, "\\u{:04x}", c as u32);
        }
        c => {
            let _ = write!(out, "\\U{:08x}", c as u32);
        }
    }
}

// Approximates "graphic or space": control, format, private-use and
// separator code points other than U+0020 are escaped.
fn is_printable(c: char) -> bool {
    let cp = c as u32;
    !(c.is_control()
        || c.is_whitespace()
        || (0xE000..=0xF8FF).contains(&cp)
        || (0xF0000..=0x10FFFF).contains(&cp)
        || matches!(cp, 0x00AD | 0x200B..=0x200F | 0x2028..=0x202E | 0x2060..=0x206F | 0xFEFF))
}
