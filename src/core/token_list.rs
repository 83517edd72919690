// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Owned sequences of captured tokens.

use std::collections::VecDeque;

use crate::core::tokenizer::Token;

/// An ordered list of tokens captured from the stream.
///
/// Lists are built by the token functions and then handed to the feed,
/// which replays them ahead of the scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: VecDeque<Token>,
}

impl TokenList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a copy of `token` (kind, value and span) at the tail.
    pub fn append(&mut self, token: &Token) {
        self.tokens.push_back(token.clone());
    }

    /// Drop tokens from the front until at most `count` remain.
    pub fn keep_last(&mut self, count: usize) {
        while self.tokens.len() > count {
            self.tokens.pop_front();
        }
    }

    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }
}

impl IntoIterator for TokenList {
    type Item = Token;
    type IntoIter = std::collections::vec_deque::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::TokenList;
    use crate::core::tokenizer::{Span, Token, TokenKind};

    fn ident(name: &str) -> Token {
        Token::with_str(TokenKind::Ident, name, Span::default())
    }

    fn names(list: &TokenList) -> Vec<&str> {
        list.iter().map(|t| t.str_value()).collect()
    }

    #[test]
    fn append_keeps_order_and_count() {
        let mut list = TokenList::new();
        assert!(list.is_empty());
        list.append(&ident("a"));
        list.append(&ident("b"));
        assert_eq!(list.count(), 2);
        assert_eq!(names(&list), vec!["a", "b"]);
    }

    #[test]
    fn keep_last_trims_from_front() {
        let mut list = TokenList::new();
        for name in ["a", "b", "c"] {
            list.append(&ident(name));
        }
        list.keep_last(2);
        assert_eq!(names(&list), vec!["b", "c"]);
        list.keep_last(5);
        assert_eq!(list.count(), 2);
    }
}
