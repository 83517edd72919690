// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the token layer.

use std::io;
use std::path::PathBuf;

use crate::core::tokenizer::Span;

/// User-facing errors reported while reading and expanding tokens.
///
/// Every kind is recoverable: it is recorded and the caller carries on with
/// a local fallback (a clamped value, a skipped statement, a value of zero).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Unexpected end of line")]
    UnexpectedEndOfLine,
    #[error("String constant expected")]
    StringConstantExpected,
    #[error("String constant too long")]
    StringTooLong,
    #[error("Range error")]
    RangeError,
    #[error("')' expected")]
    RightParenExpected,
    #[error("'(' expected")]
    LeftParenExpected,
    #[error("',' expected")]
    CommaExpected,
    #[error("Too many characters")]
    TooManyCharacters,
    #[error("{0}")]
    Syntax(String),
    #[error("{0}")]
    Expression(String),
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) span: Span,
    pub(crate) error: TokenError,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(span: Span, error: TokenError) -> Self {
        Self {
            span,
            error,
            file: None,
        }
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn error(&self) -> &TokenError {
        &self.error
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn format(&self) -> String {
        format!(
            "{}:{}: ERROR - {}",
            self.span.line, self.span.col_start, self.error
        )
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let header = match &self.file {
            Some(file) => format!("{file}:{}: ERROR", self.span.line),
            None => format!("{}: ERROR", self.span.line),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');
        for line in build_context_lines(self.span.line, Some(self.span.col_start), lines, use_color)
        {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("ERROR: {}", self.error));
        out
    }
}

/// Append-only sink for diagnostics raised while expanding a source.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error at `span`. Never interrupts the caller.
    pub fn report(&mut self, span: Span, error: TokenError) {
        tracing::debug!(line = span.line, col = span.col_start, "{error}");
        self.entries.push(Diagnostic::new(span, error));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics equal to `error`.
    pub fn count_of(&self, error: &TokenError) -> usize {
        self.entries.iter().filter(|d| &d.error == error).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

/// Error from a failed run of the command-line driver.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Cli(String),
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Report from expanding one input file.
#[derive(Debug)]
pub struct RunReport {
    file: String,
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl RunReport {
    pub fn new(file: String, diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            file,
            diagnostics,
            source_lines,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }
}

/// Build context lines for error display.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    lines: Option<&[String]>,
    use_color: bool,
) -> Vec<String> {
    let line_idx = line_num.saturating_sub(1) as usize;
    match lines.and_then(|lines| lines.get(line_idx)) {
        Some(line) => {
            let display = crate::core::report::highlight_line(line, column, use_color);
            vec![format!("{:>5} | {}", line_num, display)]
        }
        None => vec![format!("{:>5} | <source unavailable>", line_num)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: u32, col: usize) -> Span {
        Span {
            line,
            col_start: col,
            col_end: col + 1,
        }
    }

    #[test]
    fn diagnostic_format_includes_line_and_column() {
        let diag = Diagnostic::new(span(12, 4), TokenError::RangeError);
        assert_eq!(diag.format(), "12:4: ERROR - Range error");
    }

    #[test]
    fn diagnostic_context_shows_source_line() {
        let lines = vec!["  .left(200, a)".to_string()];
        let diag =
            Diagnostic::new(span(1, 9), TokenError::RangeError).with_file(Some("t.s".into()));
        let text = diag.format_with_context(Some(&lines), false);
        assert_eq!(
            text,
            "t.s:1: ERROR\n    1 |   .left(200, a)\nERROR: Range error"
        );
    }

    #[test]
    fn missing_source_line_is_marked() {
        let out = build_context_lines(3, None, Some(&[]), false);
        assert_eq!(out, vec!["    3 | <source unavailable>".to_string()]);
    }

    #[test]
    fn diagnostics_count_by_kind() {
        let mut diags = Diagnostics::new();
        diags.report(span(1, 1), TokenError::RangeError);
        diags.report(span(1, 5), TokenError::CommaExpected);
        diags.report(span(2, 1), TokenError::RangeError);
        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count_of(&TokenError::RangeError), 2);
        assert_eq!(diags.count_of(&TokenError::StringTooLong), 0);
    }
}
