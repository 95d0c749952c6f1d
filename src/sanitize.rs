//! Escaping of log file base names.
//!
//! Rolled-out file names are built from the active file's base name, which may
//! carry characters that a shell or a downstream tool would interpret. Every such
//! character is prefixed with [`ESCAPE_CHAR`]; nothing else about the name changes.
//! Every unsafe character is ASCII, so names that are not valid UTF-8 are escaped
//! byte by byte and keep their other bytes as they are.

use std::ffi::{OsStr, OsString};

/// Character inserted in front of each unsafe character.
pub const ESCAPE_CHAR: char = '\\';

/// Characters that are escaped in a base name.
pub const UNSAFE_CHARS: &[char] = &[
    '\\', ' ', '\'', '"', '*', '?', '{', '}', ';', '<', '>', '|', '^', '&', '$', '#', '!', '`',
    '~',
];

/// Returns true if `c` needs escaping.
pub fn is_unsafe(c: char) -> bool {
    UNSAFE_CHARS.contains(&c)
}

/// Escape every unsafe character of `base` in a single left-to-right pass.
///
/// Inserted escapes are never escaped again, so `a\b` becomes `a\\b`, not `a\\\b`.
pub fn escape_file_name(base: &str) -> String {
    let extra = base.chars().filter(|c| is_unsafe(*c)).count();
    let mut escaped = String::with_capacity(base.len() + extra);
    for c in base.chars() {
        if is_unsafe(c) {
            escaped.push(ESCAPE_CHAR);
        }
        escaped.push(c);
    }
    escaped
}

/// Escape an OS file name without going through a lossy UTF-8 conversion.
pub fn escape_os_file_name(base: &OsStr) -> OsString {
    let bytes = base.as_encoded_bytes();
    let extra = bytes.iter().filter(|b| is_unsafe_byte(**b)).count();
    let mut escaped = Vec::with_capacity(bytes.len() + extra);
    for &b in bytes {
        if is_unsafe_byte(b) {
            escaped.push(ESCAPE_CHAR as u8);
        }
        escaped.push(b);
    }
    // SAFETY: `escaped` is `base`'s encoded bytes with ASCII bytes inserted, each
    // directly in front of another ASCII byte, which keeps the encoding valid.
    unsafe { OsString::from_encoded_bytes_unchecked(escaped) }
}

fn is_unsafe_byte(b: u8) -> bool {
    b.is_ascii() && is_unsafe(b as char)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drop the escape in front of each escaped character.
    fn unescape(escaped: &str) -> String {
        let mut out = String::new();
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == ESCAPE_CHAR {
                out.extend(chars.next());
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(escape_file_name(""), "");
    }

    #[test]
    fn test_safe_name_unchanged() {
        let name = "levelroll-26-10-16-09:30-info.log";
        assert_eq!(escape_file_name(name), name);
    }

    #[test]
    fn test_quotes_escaped() {
        assert_eq!(escape_file_name(r#"my "log".txt"#), r#"my\ \"log\".txt"#);
    }

    #[test]
    fn test_backslash_escaped_once() {
        assert_eq!(escape_file_name(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_every_unsafe_char_escaped() {
        for c in UNSAFE_CHARS {
            let input = format!("x{}y", c);
            assert_eq!(escape_file_name(&input), format!("x{}{}y", ESCAPE_CHAR, c));
        }
    }

    #[test]
    fn test_case_and_length_preserved() {
        let escaped = escape_file_name("MiXeD~Case$Name");
        assert_eq!(escaped, r"MiXeD\~Case\$Name");
        assert_eq!(escaped.len(), "MiXeD~Case$Name".len() + 2);
    }

    #[test]
    fn test_os_name_matches_str_escaping() {
        for input in [r#"my "log".txt"#, "plain.log", "ünïcode ~ name", r"a\b"] {
            assert_eq!(
                escape_os_file_name(OsStr::new(input)),
                OsString::from(escape_file_name(input))
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_os_name_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let escaped = escape_os_file_name(OsStr::from_bytes(b"in fo\xff$.log"));
        assert_eq!(escaped.into_vec(), b"in\\ fo\xff\\$.log".to_vec());
    }

    #[test]
    fn test_unescape_recovers_original() {
        let inputs = [
            "plain.log",
            r#"my "log".txt"#,
            r"back\slash",
            "all \\'\"*?{};<>|^&$#!`~ of them",
            "\\\\",
            "ünïcode ~ name",
        ];
        for input in inputs {
            assert_eq!(unescape(&escape_file_name(input)), input, "input {:?}", input);
        }
    }
}
