// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Source line highlighting for diagnostics.

/// Render `line` with the character at 1-based `column` highlighted.
///
/// Without color the line is returned unchanged, except that a column past
/// the end of the line is marked with a trailing `^`.
pub fn highlight_line(line: &str, column: Option<usize>, use_color: bool) -> String {
    let Some(column) = column.filter(|&c| c > 0) else {
        return line.to_string();
    };
    let idx = column - 1;
    if idx >= line.len() {
        if use_color {
            return format!("{line}\x1b[31m^\x1b[0m");
        }
        return format!("{line}^");
    }
    if !use_color || !line.is_char_boundary(idx) {
        return line.to_string();
    }
    let (head, tail) = line.split_at(idx);
    let ch = tail.chars().next().unwrap_or(' ');
    let rest = &tail[ch.len_utf8()..];
    format!("{head}\x1b[31m{ch}\x1b[0m{rest}")
}

#[cfg(test)]
mod tests {
    use super::highlight_line;

    #[test]
    fn plain_line_is_unchanged() {
        assert_eq!(highlight_line("lda #1", Some(3), false), "lda #1");
    }

    #[test]
    fn past_end_gets_caret() {
        assert_eq!(highlight_line("lda", Some(9), false), "lda^");
    }

    #[test]
    fn color_wraps_column() {
        assert_eq!(
            highlight_line("abc", Some(2), true),
            "a\x1b[31mb\x1b[0mc"
        );
    }
}
