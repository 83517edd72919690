// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Raw scanner for assembly source with spans.
//!
//! The scanner hands out one token at a time and never looks back. Line
//! ends become [`TokenKind::Sep`] tokens and the end of input is reported
//! as [`TokenKind::Eof`] on every request after the last token. Token-level
//! functions (`.CONCAT`, `.LEFT`, `.MID`, `.RIGHT`, `.STRING`) get their own
//! kinds so the layer above can expand them before the parser sees them.

use crate::core::text_utils::{is_ident_char, is_ident_start, is_keyword_start, is_space, to_upper};

/// Maximum length of a string literal, in bytes.
pub const MAX_STR_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub col_start: usize,
    pub col_end: usize,
}

impl Span {
    fn new(line: u32, start: usize, end: usize) -> Self {
        Self {
            line,
            col_start: start + 1,
            col_end: end + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Sep,
    Eof,
    LParen,
    RParen,
    Comma,
    Colon,
    Hash,
    Question,
    Ident,
    StrCon,
    IntCon,
    Operator(OperatorKind),
    Directive,
    MacroStart,
    MacroEnd,
    Concat,
    Left,
    Mid,
    Right,
    String,
}

impl TokenKind {
    /// The token function this kind triggers, if any.
    pub fn function(self) -> Option<TokenFunction> {
        match self {
            TokenKind::Concat => Some(TokenFunction::Concat),
            TokenKind::Left => Some(TokenFunction::Left),
            TokenKind::Mid => Some(TokenFunction::Mid),
            TokenKind::Right => Some(TokenFunction::Right),
            TokenKind::String => Some(TokenFunction::String),
            _ => None,
        }
    }

    /// Line separator or end of input.
    pub fn is_separator(self) -> bool {
        matches!(self, TokenKind::Sep | TokenKind::Eof)
    }
}

/// Token kinds that are expanded in the token stream instead of being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFunction {
    Concat,
    Left,
    Mid,
    Right,
    String,
}

impl TokenFunction {
    pub fn name(self) -> &'static str {
        match self {
            TokenFunction::Concat => ".CONCAT",
            TokenFunction::Left => ".LEFT",
            TokenFunction::Mid => ".MID",
            TokenFunction::Right => ".RIGHT",
            TokenFunction::String => ".STRING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Plus,
    Minus,
    Multiply,
    Power,
    Divide,
    Mod,
    Shl,
    Shr,
    BitNot,
    LogicNot,
    BitAnd,
    BitOr,
    BitXor,
    LogicAnd,
    LogicOr,
    LogicXor,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

impl OperatorKind {
    fn text(self) -> &'static str {
        match self {
            OperatorKind::Plus => "+",
            OperatorKind::Minus => "-",
            OperatorKind::Multiply => "*",
            OperatorKind::Power => "**",
            OperatorKind::Divide => "/",
            OperatorKind::Mod => "%",
            OperatorKind::Shl => "<<",
            OperatorKind::Shr => ">>",
            OperatorKind::BitNot => "~",
            OperatorKind::LogicNot => "!",
            OperatorKind::BitAnd => "&",
            OperatorKind::BitOr => "|",
            OperatorKind::BitXor => "^",
            OperatorKind::LogicAnd => "&&",
            OperatorKind::LogicOr => "||",
            OperatorKind::LogicXor => "^^",
            OperatorKind::Eq => "=",
            OperatorKind::Ne => "<>",
            OperatorKind::Ge => ">=",
            OperatorKind::Gt => ">",
            OperatorKind::Le => "<=",
            OperatorKind::Lt => "<",
        }
    }
}

/// Value attached to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Str(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: Option<Literal>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            literal: None,
            span,
        }
    }

    pub fn with_str(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            literal: Some(Literal::Str(value.into())),
            span,
        }
    }

    pub fn with_int(kind: TokenKind, value: i64, span: Span) -> Self {
        Self {
            kind,
            literal: Some(Literal::Int(value)),
            span,
        }
    }

    /// String payload, or the empty string for tokens without one.
    pub fn str_value(&self) -> &str {
        match &self.literal {
            Some(Literal::Str(s)) => s,
            _ => "",
        }
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.literal {
            Some(Literal::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn to_source_text(&self) -> String {
        match self.kind {
            TokenKind::Sep | TokenKind::Eof => String::new(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
            TokenKind::Colon => ":".to_string(),
            TokenKind::Hash => "#".to_string(),
            TokenKind::Question => "?".to_string(),
            TokenKind::Ident | TokenKind::Directive => self.str_value().to_string(),
            TokenKind::StrCon => quote_string(self.str_value()),
            TokenKind::IntCon => self.int_value().unwrap_or(0).to_string(),
            TokenKind::Operator(op) => op.text().to_string(),
            TokenKind::MacroStart => ".MACRO".to_string(),
            TokenKind::MacroEnd => ".ENDMACRO".to_string(),
            TokenKind::Concat => TokenFunction::Concat.name().to_string(),
            TokenKind::Left => TokenFunction::Left.name().to_string(),
            TokenKind::Mid => TokenFunction::Mid.name().to_string(),
            TokenKind::Right => TokenFunction::Right.name().to_string(),
            TokenKind::String => TokenFunction::String.name().to_string(),
        }
    }
}

fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TokenizeError {
    pub message: String,
    pub span: Span,
}

/// Source of raw tokens for the token stream.
pub trait Scanner {
    /// Advance and return the next raw token. Errors have already consumed
    /// the offending input, so calling again makes progress.
    fn next_raw_token(&mut self) -> Result<Token, TokenizeError>;
}

pub struct Tokenizer {
    input: Vec<u8>,
    cursor: usize,
    line_num: u32,
    line_start: usize,
}

impl Tokenizer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            input: source.as_bytes().to_vec(),
            cursor: 0,
            line_num: 1,
            line_start: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, TokenizeError> {
        self.skip_white();
        let start = self.cursor;
        let c = self.current_byte();
        match c {
            0 if self.cursor >= self.input.len() => {
                Ok(Token::new(TokenKind::Eof, self.span(start, start)))
            }
            b'\n' => {
                let span = self.span(start, start + 1);
                self.cursor += 1;
                self.line_num += 1;
                self.line_start = self.cursor;
                Ok(Token::new(TokenKind::Sep, span))
            }
            _ if is_ident_start(c) => Ok(self.scan_identifier()),
            _ if c.is_ascii_digit() => self.scan_number(),
            b'"' => self.scan_string(),
            b'\'' => self.scan_char(),
            b'.' => self.scan_keyword(),
            b'$' => {
                if is_hex_digit(self.peek_raw_byte(1)) {
                    self.scan_prefixed_number(16)
                } else {
                    self.cursor += 1;
                    Err(TokenizeError {
                        message: "Illegal character in hex constant".to_string(),
                        span: self.span(start, self.cursor),
                    })
                }
            }
            b'%' => {
                if is_bin_digit(self.peek_raw_byte(1)) && self.is_prefix_context(start) {
                    self.scan_prefixed_number(2)
                } else {
                    self.cursor += 1;
                    Ok(Token::new(
                        TokenKind::Operator(OperatorKind::Mod),
                        self.span(start, self.cursor),
                    ))
                }
            }
            _ => self.scan_operator(start, c),
        }
    }

    fn scan_operator(&mut self, start: usize, c: u8) -> Result<Token, TokenizeError> {
        self.cursor += 1;
        let kind = match c {
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b'#' => TokenKind::Hash,
            b'?' => TokenKind::Question,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'+' => TokenKind::Operator(OperatorKind::Plus),
            b'-' => TokenKind::Operator(OperatorKind::Minus),
            b'*' => {
                if self.peek_raw_byte(0) == b'*' {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Power)
                } else {
                    TokenKind::Operator(OperatorKind::Multiply)
                }
            }
            b'/' => TokenKind::Operator(OperatorKind::Divide),
            b'~' => TokenKind::Operator(OperatorKind::BitNot),
            b'=' => {
                if self.peek_raw_byte(0) == b'=' {
                    self.cursor += 1;
                }
                TokenKind::Operator(OperatorKind::Eq)
            }
            b'!' => {
                if self.peek_raw_byte(0) == b'=' {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Ne)
                } else {
                    TokenKind::Operator(OperatorKind::LogicNot)
                }
            }
            b'&' => self.doubled(b'&', OperatorKind::LogicAnd, OperatorKind::BitAnd),
            b'|' => self.doubled(b'|', OperatorKind::LogicOr, OperatorKind::BitOr),
            b'^' => self.doubled(b'^', OperatorKind::LogicXor, OperatorKind::BitXor),
            b'<' => match self.peek_raw_byte(0) {
                b'<' => {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Shl)
                }
                b'=' => {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Le)
                }
                b'>' => {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Ne)
                }
                _ => TokenKind::Operator(OperatorKind::Lt),
            },
            b'>' => match self.peek_raw_byte(0) {
                b'>' => {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Shr)
                }
                b'=' => {
                    self.cursor += 1;
                    TokenKind::Operator(OperatorKind::Ge)
                }
                _ => TokenKind::Operator(OperatorKind::Gt),
            },
            _ => {
                return Err(TokenizeError {
                    message: "Illegal character".to_string(),
                    span: self.span(start, self.cursor),
                })
            }
        };
        Ok(Token::new(kind, self.span(start, self.cursor)))
    }

    fn doubled(&mut self, c: u8, double: OperatorKind, single: OperatorKind) -> TokenKind {
        if self.peek_raw_byte(0) == c {
            self.cursor += 1;
            TokenKind::Operator(double)
        } else {
            TokenKind::Operator(single)
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.cursor;
        while is_ident_char(self.current_byte()) {
            self.cursor += 1;
        }
        let text = self.text(start, self.cursor);
        Token::with_str(TokenKind::Ident, text, self.span(start, self.cursor))
    }

    fn scan_keyword(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        self.cursor += 1;
        if !is_keyword_start(self.current_byte()) {
            return Err(TokenizeError {
                message: "Illegal character".to_string(),
                span: self.span(start, self.cursor),
            });
        }
        while is_ident_char(self.current_byte()) {
            self.cursor += 1;
        }
        let name = to_upper(&self.text(start, self.cursor));
        let span = self.span(start, self.cursor);
        let kind = match &name[1..] {
            "CONCAT" => TokenKind::Concat,
            "LEFT" => TokenKind::Left,
            "MID" => TokenKind::Mid,
            "RIGHT" => TokenKind::Right,
            "STRING" => TokenKind::String,
            "MACRO" | "MAC" => TokenKind::MacroStart,
            "ENDMACRO" | "ENDMAC" => TokenKind::MacroEnd,
            _ => return Ok(Token::with_str(TokenKind::Directive, name, span)),
        };
        Ok(Token::new(kind, span))
    }

    fn scan_number(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        while is_num_char(self.current_byte()) {
            self.cursor += 1;
        }
        let text = to_upper(&self.text(start, self.cursor)).replace('_', "");
        let (digits, base) = match text.chars().last() {
            Some('H') => (&text[..text.len() - 1], 16),
            Some('B') if text[..text.len() - 1].bytes().all(is_bin_digit) => {
                (&text[..text.len() - 1], 2)
            }
            Some('O') | Some('Q') => (&text[..text.len() - 1], 8),
            Some('D') => (&text[..text.len() - 1], 10),
            _ => (text.as_str(), 10),
        };
        let span = self.span(start, self.cursor);
        match number_value(digits, base) {
            Some(value) => Ok(Token::with_int(TokenKind::IntCon, value, span)),
            None => Err(TokenizeError {
                message: "Illegal character in constant".to_string(),
                span,
            }),
        }
    }

    fn scan_prefixed_number(&mut self, base: u32) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        self.cursor += 1;
        let digits_start = self.cursor;
        loop {
            let c = self.current_byte();
            let ok = match base {
                2 => is_bin_digit(c) || c == b'_',
                _ => is_hex_digit(c) || c == b'_',
            };
            if !ok {
                break;
            }
            self.cursor += 1;
        }
        let digits = self.text(digits_start, self.cursor).replace('_', "");
        let span = self.span(start, self.cursor);
        match number_value(&digits, base) {
            Some(value) => Ok(Token::with_int(TokenKind::IntCon, value, span)),
            None => Err(TokenizeError {
                message: "Illegal character in constant".to_string(),
                span,
            }),
        }
    }

    fn scan_string(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        let bytes = self.scan_quoted(b'"')?;
        Ok(Token::with_str(
            TokenKind::StrCon,
            String::from_utf8_lossy(&bytes).to_string(),
            self.span(start, self.cursor),
        ))
    }

    fn scan_char(&mut self) -> Result<Token, TokenizeError> {
        let start = self.cursor;
        let bytes = self.scan_quoted(b'\'')?;
        let span = self.span(start, self.cursor);
        match bytes.as_slice() {
            [c] => Ok(Token::with_int(TokenKind::IntCon, i64::from(*c), span)),
            _ => Err(TokenizeError {
                message: "Illegal character constant".to_string(),
                span,
            }),
        }
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<Vec<u8>, TokenizeError> {
        let start = self.cursor;
        self.cursor += 1;
        let mut out = Vec::new();
        while !matches!(self.current_byte(), 0 | b'\n') && self.current_byte() != quote {
            let c = self.current_byte();
            if c == b'\\' {
                self.cursor += 1;
                let esc = self.current_byte();
                let val = match esc {
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'0' => b'\0',
                    b'x' => {
                        let hi = self.peek_raw_byte(1);
                        let lo = self.peek_raw_byte(2);
                        if !hi.is_ascii_hexdigit() || !lo.is_ascii_hexdigit() {
                            self.skip_to_line_end();
                            return Err(TokenizeError {
                                message: "Bad hex escape in string".to_string(),
                                span: self.span(start, self.cursor),
                            });
                        }
                        self.cursor += 2;
                        (hex_digit(hi) << 4) | hex_digit(lo)
                    }
                    b'\n' | 0 => break,
                    _ => esc,
                };
                out.push(val);
            } else {
                out.push(c);
            }
            self.cursor += 1;
        }

        if self.current_byte() != quote {
            return Err(TokenizeError {
                message: format!("Unterminated string: {}", self.text(start, self.cursor)),
                span: self.span(start, self.cursor),
            });
        }
        self.cursor += 1;
        Ok(out)
    }

    fn skip_white(&mut self) {
        loop {
            match self.current_byte() {
                c if is_space(c) => self.cursor += 1,
                b';' => self.skip_to_line_end(),
                _ => break,
            }
        }
    }

    fn skip_to_line_end(&mut self) {
        while !matches!(self.current_byte(), 0 | b'\n') {
            self.cursor += 1;
        }
    }

    fn current_byte(&self) -> u8 {
        self.input.get(self.cursor).copied().unwrap_or(0)
    }

    fn peek_raw_byte(&self, offset: usize) -> u8 {
        self.input.get(self.cursor + offset).copied().unwrap_or(0)
    }

    fn text(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end]).to_string()
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(
            self.line_num,
            start.saturating_sub(self.line_start),
            end.saturating_sub(self.line_start),
        )
    }

    /// `%` starts a binary constant only where an operand may begin:
    /// at the start of a line, after an operator or punctuation, or after
    /// whitespace following a mnemonic (`lda %1010`).
    fn is_prefix_context(&self, start: usize) -> bool {
        let has_leading_space = start > self.line_start && is_space(self.input[start - 1]);

        match self.prev_non_space(start) {
            None => true,
            Some(
                b'(' | b',' | b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b'~' | b'!'
                | b'<' | b'>' | b'=' | b'?' | b':' | b'#',
            ) => true,
            Some(ch) if has_leading_space && is_ident_char(ch) => true,
            _ => false,
        }
    }

    fn prev_non_space(&self, start: usize) -> Option<u8> {
        (self.line_start..start)
            .rev()
            .map(|i| self.input[i])
            .find(|&c| !is_space(c))
    }
}

impl Scanner for Tokenizer {
    fn next_raw_token(&mut self) -> Result<Token, TokenizeError> {
        self.next_token()
    }
}

fn number_value(digits: &str, base: u32) -> Option<i64> {
    if digits.is_empty() {
        return None;
    }
    i64::from_str_radix(digits, base).ok()
}

fn is_num_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

fn is_bin_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'A'..=b'F' => c - b'A' + 10,
        _ => c - b'a' + 10,
    }
}
