// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token feed: pushed token lists stacked on top of the raw scanner.
//!
//! The most recently pushed list is drained first, then the one below it,
//! and only when every pushed list is exhausted does the scanner run again.
//! This is what lets an expansion "insert tokens as if typed here".

use std::collections::vec_deque::IntoIter;

use crate::core::assembler::error::{Diagnostics, TokenError};
use crate::core::token_list::TokenList;
use crate::core::tokenizer::{Scanner, Token, TokenKind, MAX_STR_LEN};

struct PendingList {
    tag: &'static str,
    tokens: IntoIter<Token>,
}

pub struct TokenFeed {
    scanner: Box<dyn Scanner>,
    pending: Vec<PendingList>,
    max_string_len: usize,
}

impl TokenFeed {
    pub fn new(scanner: Box<dyn Scanner>) -> Self {
        Self {
            scanner,
            pending: Vec::new(),
            max_string_len: MAX_STR_LEN,
        }
    }

    pub fn with_max_string_len(mut self, max_string_len: usize) -> Self {
        self.max_string_len = max_string_len;
        self
    }

    /// Install `list` as the nearest source of tokens. `tag` only labels
    /// the list in traces.
    pub fn push_token_list(&mut self, list: TokenList, tag: &'static str) {
        tracing::trace!(tag, len = list.count(), depth = self.pending.len() + 1, "push token list");
        self.pending.push(PendingList {
            tag,
            tokens: list.into_iter(),
        });
    }

    /// Number of pushed lists not yet exhausted.
    pub fn pending_lists(&self) -> usize {
        self.pending.len()
    }

    pub fn next_raw_token(&mut self, diagnostics: &mut Diagnostics) -> Token {
        while let Some(top) = self.pending.last_mut() {
            if let Some(token) = top.tokens.next() {
                return token;
            }
            tracing::trace!(tag = top.tag, "token list exhausted");
            self.pending.pop();
        }

        loop {
            match self.scanner.next_raw_token() {
                Ok(token) => return self.check_literal(token, diagnostics),
                Err(err) => diagnostics.report(err.span, TokenError::Syntax(err.message)),
            }
        }
    }

    fn check_literal(&self, mut token: Token, diagnostics: &mut Diagnostics) -> Token {
        if token.kind == TokenKind::StrCon && token.str_value().len() > self.max_string_len {
            diagnostics.report(token.span, TokenError::StringTooLong);
            let mut value = token.str_value().to_string();
            let mut end = self.max_string_len;
            while !value.is_char_boundary(end) {
                end -= 1;
            }
            value.truncate(end);
            token = Token::with_str(TokenKind::StrCon, value, token.span);
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::TokenFeed;
    use crate::core::assembler::error::{Diagnostics, TokenError};
    use crate::core::token_list::TokenList;
    use crate::core::tokenizer::{Span, Token, TokenKind, Tokenizer};

    fn ident(name: &str) -> Token {
        Token::with_str(TokenKind::Ident, name, Span::default())
    }

    fn list(names: &[&str]) -> TokenList {
        let mut list = TokenList::new();
        for name in names {
            list.append(&ident(name));
        }
        list
    }

    fn drain(feed: &mut TokenFeed, diags: &mut Diagnostics) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            let t = feed.next_raw_token(diags);
            if t.kind == TokenKind::Eof {
                return out;
            }
            out.push(t.to_source_text());
        }
    }

    #[test]
    fn pushed_list_drains_before_scanner() {
        let mut feed = TokenFeed::new(Box::new(Tokenizer::new("z")));
        let mut diags = Diagnostics::new();
        feed.push_token_list(list(&["a", "b"]), ".LEFT");
        assert_eq!(drain(&mut feed, &mut diags), vec!["a", "b", "z"]);
        assert_eq!(feed.pending_lists(), 0);
    }

    #[test]
    fn most_recent_list_drains_first() {
        let mut feed = TokenFeed::new(Box::new(Tokenizer::new("")));
        let mut diags = Diagnostics::new();
        feed.push_token_list(list(&["outer1", "outer2"]), ".MID");
        assert_eq!(feed.next_raw_token(&mut diags).str_value(), "outer1");
        feed.push_token_list(list(&["inner"]), ".RIGHT");
        assert_eq!(feed.pending_lists(), 2);
        assert_eq!(drain(&mut feed, &mut diags), vec!["inner", "outer2"]);
    }

    #[test]
    fn scanner_errors_are_reported_and_skipped() {
        let mut feed = TokenFeed::new(Box::new(Tokenizer::new("a ` b")));
        let mut diags = Diagnostics::new();
        assert_eq!(drain(&mut feed, &mut diags), vec!["a", "b"]);
        assert_eq!(diags.len(), 1);
        assert!(matches!(diags.entries()[0].error(), TokenError::Syntax(_)));
    }

    #[test]
    fn overlong_string_literal_is_truncated() {
        let mut feed =
            TokenFeed::new(Box::new(Tokenizer::new("\"abcdef\""))).with_max_string_len(4);
        let mut diags = Diagnostics::new();
        let t = feed.next_raw_token(&mut diags);
        assert_eq!(t.str_value(), "abcd");
        assert_eq!(diags.count_of(&TokenError::StringTooLong), 1);
    }
}
