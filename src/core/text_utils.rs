// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared byte classes for scanning assembler source.

/// Check if a byte can start an identifier (letter, underscore, or `@` for cheap locals).
#[inline]
pub fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'@'
}

/// Check if a byte can continue an identifier.
#[inline]
pub fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'@'
}

/// Check if a byte can start a dot keyword after the leading `.`.
#[inline]
pub fn is_keyword_start(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Check if a byte is horizontal whitespace. Newlines are separators, not space.
#[inline]
pub fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\r'
}

/// Convert a string to uppercase ASCII.
#[inline]
pub fn to_upper(s: &str) -> String {
    s.to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_classes() {
        assert!(is_ident_start(b'a'));
        assert!(is_ident_start(b'@'));
        assert!(!is_ident_start(b'1'));
        assert!(is_ident_char(b'1'));
        assert!(!is_ident_char(b'.'));
    }

    #[test]
    fn newline_is_not_space() {
        assert!(is_space(b'\t'));
        assert!(!is_space(b'\n'));
    }
}
