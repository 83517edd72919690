// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Statement driver and listing output.
//!
//! [`expand_source`] plays the parser's part: it pulls tokens through a
//! [`TokenStream`], groups them into statements at line separators and
//! captures `.MACRO` bodies in raw mode.

use std::io::Write;

use crate::core::assembler::error::{Diagnostics, TokenError};
use crate::core::symbol_table::SymbolTable;
use crate::core::token_stream::{FunctionLimits, TokenStream};
use crate::core::tokenizer::{Token, TokenKind};

/// One statement as the parser saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedLine {
    pub line: u32,
    /// Read with function expansion suspended.
    pub raw: bool,
    pub tokens: Vec<Token>,
}

impl ExpandedLine {
    pub fn text(&self) -> String {
        render_tokens(&self.tokens)
    }
}

pub struct Expansion {
    pub lines: Vec<ExpandedLine>,
    pub diagnostics: Diagnostics,
}

pub fn expand_source(source: &str, limits: FunctionLimits, symbols: SymbolTable) -> Expansion {
    let stream = TokenStream::from_source(source)
        .with_limits(limits)
        .with_symbols(symbols);
    expand_stream(stream, false)
}

/// Run the whole of `source` in raw mode: every token is listed as scanned.
pub fn expand_source_raw(source: &str, limits: FunctionLimits) -> Expansion {
    let mut stream = TokenStream::from_source(source).with_limits(limits);
    stream.enter_raw_mode();
    expand_stream(stream, true)
}

fn expand_stream(mut stream: TokenStream, raw: bool) -> Expansion {
    let mut lines = Vec::new();
    stream.next_token();
    while stream.kind() != TokenKind::Eof {
        if !raw && stream.kind() == TokenKind::MacroStart {
            capture_macro(&mut stream, &mut lines);
        } else {
            push_statement(&mut stream, &mut lines);
        }
        stream.consume_sep();
    }
    if raw {
        stream.leave_raw_mode();
    }

    Expansion {
        lines,
        diagnostics: stream.into_diagnostics(),
    }
}

/// List a `.MACRO` block without expanding it. The current token is the
/// `.MACRO` keyword; on return the separator after `.ENDMACRO` is current
/// and raw mode is back at its previous depth.
fn capture_macro(stream: &mut TokenStream, lines: &mut Vec<ExpandedLine>) {
    let mut raw = stream.raw_mode();
    push_statement(&mut raw, lines);
    loop {
        raw.consume_sep();
        match raw.kind() {
            TokenKind::Eof => {
                raw.report(TokenError::Syntax("'.ENDMACRO' expected".to_string()));
                return;
            }
            TokenKind::MacroStart => capture_macro(&mut raw, lines),
            TokenKind::MacroEnd => {
                push_statement(&mut raw, lines);
                return;
            }
            _ => push_statement(&mut raw, lines),
        }
    }
}

fn push_statement(stream: &mut TokenStream, lines: &mut Vec<ExpandedLine>) {
    let line = stream.current().span.line;
    let raw = stream.is_raw();
    let mut tokens = Vec::new();
    while !stream.kind().is_separator() {
        tokens.push(stream.current().clone());
        stream.next_token();
    }
    if !tokens.is_empty() {
        lines.push(ExpandedLine { line, raw, tokens });
    }
}

/// Join tokens back into source form.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut glue = true;
    for token in tokens {
        let attach = matches!(
            token.kind,
            TokenKind::Comma | TokenKind::RParen | TokenKind::Colon
        );
        if !glue && !attach {
            out.push(' ');
        }
        out.push_str(&token.to_source_text());
        glue = matches!(token.kind, TokenKind::LParen | TokenKind::Hash)
            || token.kind.function().is_some();
    }
    out
}

/// Writer for listing file output.
pub struct ListingWriter<W: Write> {
    out: W,
}

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn header(&mut self, title: &str) -> std::io::Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "LINE  M  SOURCE")?;
        writeln!(self.out, "----  -  ------")?;
        Ok(())
    }

    pub fn write_line(&mut self, line: &ExpandedLine) -> std::io::Result<()> {
        let marker = if line.raw { 'R' } else { ' ' };
        writeln!(self.out, "{:>4}  {}  {}", line.line, marker, line.text())
    }

    pub fn footer(&mut self, lines: usize, errors: usize) -> std::io::Result<()> {
        writeln!(self.out, "\nLines: {lines}  Errors: {errors}")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
