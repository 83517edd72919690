// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Parser-facing token stream.
//!
//! [`TokenStream`] keeps the single current token the parser looks at and
//! decides, on every advance, whether the new token is passed through or
//! handed to a token function (see [`crate::core::token_functions`]).
//! Function expansion is suspended while the raw-mode depth is non-zero,
//! which is how macro bodies are captured verbatim.
//!
//! The consumption helpers at the bottom of the impl are the small grammar
//! utilities shared by the token functions and by the parser layer.

use std::ops::{Deref, DerefMut};

use crate::core::assembler::error::{Diagnostics, TokenError};
use crate::core::feed::TokenFeed;
use crate::core::symbol_table::SymbolTable;
use crate::core::token_list::TokenList;
use crate::core::tokenizer::{Scanner, Span, Token, TokenKind, Tokenizer, MAX_STR_LEN};

/// Limits applied by the token functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionLimits {
    /// Longest string a literal or `.CONCAT` result may hold, in bytes.
    pub max_string_len: usize,
    /// Upper bound for the count and start arguments of `.LEFT`, `.MID`, `.RIGHT`.
    pub argument_limit: i64,
}

impl Default for FunctionLimits {
    fn default() -> Self {
        Self {
            max_string_len: MAX_STR_LEN,
            argument_limit: 100,
        }
    }
}

pub struct TokenStream {
    feed: TokenFeed,
    current: Token,
    raw_depth: usize,
    pub(crate) limits: FunctionLimits,
    pub(crate) symbols: SymbolTable,
    diagnostics: Diagnostics,
}

impl TokenStream {
    /// Create a stream over `scanner`. The current token starts out as a
    /// separator; call [`TokenStream::next_token`] to read the first token.
    pub fn new(scanner: Box<dyn Scanner>) -> Self {
        Self {
            feed: TokenFeed::new(scanner),
            current: Token::new(TokenKind::Sep, Span::default()),
            raw_depth: 0,
            limits: FunctionLimits::default(),
            symbols: SymbolTable::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Box::new(Tokenizer::new(source)))
    }

    pub fn with_limits(mut self, limits: FunctionLimits) -> Self {
        self.feed = self.feed.with_max_string_len(limits.max_string_len);
        self.limits = limits;
        self
    }

    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn limits(&self) -> FunctionLimits {
        self.limits
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Record `error` at the current token.
    pub fn report(&mut self, error: TokenError) {
        self.diagnostics.report(self.current.span, error);
    }

    /// Advance to the next token, expanding token functions unless raw mode
    /// is active. Returns only after any expansion has been fully resolved.
    pub fn next_token(&mut self) {
        self.current = self.feed.next_raw_token(&mut self.diagnostics);
        if self.raw_depth > 0 {
            return;
        }
        if let Some(function) = self.current.kind.function() {
            self.expand_function(function);
        }
    }

    /// Install `list` to be read before the rest of the input.
    pub fn push_token_list(&mut self, list: TokenList, tag: &'static str) {
        self.feed.push_token_list(list, tag);
    }

    pub(crate) fn set_current(&mut self, token: Token) {
        self.current = token;
    }

    /// Stop expanding token functions. Calls nest and must be paired with
    /// [`TokenStream::leave_raw_mode`].
    pub fn enter_raw_mode(&mut self) {
        self.raw_depth += 1;
        tracing::trace!(depth = self.raw_depth, "enter raw token mode");
    }

    pub fn leave_raw_mode(&mut self) {
        debug_assert!(
            self.raw_depth > 0,
            "leave_raw_mode called without matching enter_raw_mode"
        );
        if self.raw_depth == 0 {
            tracing::warn!("raw token mode underflow ignored");
            return;
        }
        self.raw_depth -= 1;
        tracing::trace!(depth = self.raw_depth, "leave raw token mode");
    }

    pub fn raw_depth(&self) -> usize {
        self.raw_depth
    }

    pub fn is_raw(&self) -> bool {
        self.raw_depth > 0
    }

    /// Enter raw mode for the lifetime of the returned guard.
    pub fn raw_mode(&mut self) -> RawModeGuard<'_> {
        self.enter_raw_mode();
        RawModeGuard { stream: self }
    }

    /// Advance past the current token if it is `expected`, otherwise report
    /// `error` and leave the token in place. Returns whether it matched.
    pub fn consume(&mut self, expected: TokenKind, error: TokenError) -> bool {
        if self.current.kind == expected {
            self.next_token();
            true
        } else {
            self.report(error);
            false
        }
    }

    pub fn consume_lparen(&mut self) -> bool {
        self.consume(TokenKind::LParen, TokenError::LeftParenExpected)
    }

    pub fn consume_rparen(&mut self) -> bool {
        self.consume(TokenKind::RParen, TokenError::RightParenExpected)
    }

    pub fn consume_comma(&mut self) -> bool {
        self.consume(TokenKind::Comma, TokenError::CommaExpected)
    }

    /// Consume the end of a statement. End of input counts as a separator;
    /// anything else is trailing garbage and is skipped.
    pub fn consume_sep(&mut self) {
        match self.current.kind {
            TokenKind::Eof => {}
            TokenKind::Sep => self.next_token(),
            _ => {
                self.report(TokenError::TooManyCharacters);
                self.skip_until_sep();
            }
        }
    }

    /// Skip tokens until a line separator or end of input is current.
    pub fn skip_until_sep(&mut self) {
        while !self.current.kind.is_separator() {
            self.next_token();
        }
    }
}

/// Scoped raw mode; leaves raw mode when dropped.
pub struct RawModeGuard<'a> {
    stream: &'a mut TokenStream,
}

impl Deref for RawModeGuard<'_> {
    type Target = TokenStream;

    fn deref(&self) -> &TokenStream {
        self.stream
    }
}

impl DerefMut for RawModeGuard<'_> {
    fn deref_mut(&mut self) -> &mut TokenStream {
        self.stream
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        self.stream.leave_raw_mode();
    }
}
