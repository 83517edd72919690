// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token functions: `.CONCAT`, `.LEFT`, `.MID`, `.RIGHT` and `.STRING`.
//!
//! Each function parses its own argument list from the live stream and
//! resolves to an [`Expansion`]:
//!
//! - `.CONCAT` and `.STRING` produce a string literal that replaces the
//!   closing parenthesis, which is left as the current token.
//! - `.LEFT`, `.MID` and `.RIGHT` select a window out of a parenthesised
//!   token range and splice it back into the feed, ahead of the token that
//!   followed the range.
//!
//! Arguments are read through [`TokenStream::next_token`], so functions
//! nest: an inner function is fully resolved before the outer one sees
//! its result.

use crate::core::assembler::error::TokenError;
use crate::core::token_list::TokenList;
use crate::core::token_stream::TokenStream;
use crate::core::tokenizer::{Token, TokenFunction, TokenKind};

/// What a token function resolved to.
#[derive(Debug)]
enum Expansion {
    /// Relabel the current `)` as a string constant with this value.
    Literal(String),
    /// Read `window` next, followed by `resume`.
    Splice { window: TokenList, resume: Token },
    /// An error was reported; the current token stays as the handler left it.
    Abandoned,
}

impl TokenStream {
    pub(crate) fn expand_function(&mut self, function: TokenFunction) {
        tracing::debug!(
            function = function.name(),
            line = self.current().span.line,
            "expand token function"
        );
        let expansion = match function {
            TokenFunction::Concat => self.func_concat(),
            TokenFunction::Left => self.func_left(),
            TokenFunction::Mid => self.func_mid(),
            TokenFunction::Right => self.func_right(),
            TokenFunction::String => self.func_string(),
        };

        match expansion {
            Expansion::Literal(value) => {
                let span = self.current().span;
                self.set_current(Token::with_str(TokenKind::StrCon, value, span));
            }
            Expansion::Splice { mut window, resume } => {
                // The resume token keeps the pushed list non-empty.
                window.append(&resume);
                self.push_token_list(window, function.name());
                self.next_token();
            }
            Expansion::Abandoned => {}
        }
    }

    /// Read tokens up to the `)` that closes the current argument list and
    /// keep those with index in `start..start + count`. The closing paren is
    /// consumed. Reaching the end of the line first is reported and the
    /// tokens kept so far are returned.
    fn collect_tokens(&mut self, start: usize, count: usize) -> TokenList {
        let mut list = TokenList::new();
        let mut index = 0usize;
        let mut parens = 0usize;
        while parens != 0 || self.kind() != TokenKind::RParen {
            if self.kind().is_separator() {
                self.report(TokenError::UnexpectedEndOfLine);
                return list;
            }

            if index >= start && index - start < count {
                list.append(self.current());
            }

            match self.kind() {
                TokenKind::LParen => parens += 1,
                TokenKind::RParen => parens -= 1,
                _ => {}
            }

            index += 1;
            self.next_token();
        }

        self.consume_rparen();
        list
    }

    /// Count or start argument; out-of-range values are reported and
    /// replaced by `fallback`.
    fn range_argument(&mut self, fallback: usize) -> usize {
        let span = self.current().span;
        let value = self.const_expression();
        if (0..=self.limits.argument_limit).contains(&value) {
            value as usize
        } else {
            self.diagnostics_mut().report(span, TokenError::RangeError);
            fallback
        }
    }

    /// Finish a literal-producing function: the `)` must be current and is
    /// replaced rather than consumed.
    fn literal_at_rparen(&mut self, value: String) -> Expansion {
        if self.kind() == TokenKind::RParen {
            Expansion::Literal(value)
        } else {
            self.report(TokenError::RightParenExpected);
            Expansion::Abandoned
        }
    }

    fn splice_window(&self, window: TokenList) -> Expansion {
        Expansion::Splice {
            window,
            resume: self.current().clone(),
        }
    }

    fn func_concat(&mut self) -> Expansion {
        self.next_token();
        self.consume_lparen();

        let mut value = String::new();
        loop {
            if self.kind() != TokenKind::StrCon {
                self.report(TokenError::StringConstantExpected);
                self.skip_until_sep();
                return Expansion::Abandoned;
            }

            let part = self.current().str_value();
            if value.len() + part.len() > self.limits.max_string_len {
                self.report(TokenError::StringTooLong);
                self.skip_until_sep();
                return Expansion::Abandoned;
            }
            value.push_str(part);

            self.next_token();
            if self.kind() == TokenKind::Comma {
                self.next_token();
            } else {
                break;
            }
        }

        self.literal_at_rparen(value)
    }

    fn func_left(&mut self) -> Expansion {
        self.next_token();
        self.consume_lparen();

        let count = self.range_argument(1);
        self.consume_comma();

        let window = self.collect_tokens(0, count);
        self.splice_window(window)
    }

    fn func_mid(&mut self) -> Expansion {
        self.next_token();
        self.consume_lparen();

        let start = self.range_argument(0);
        self.consume_comma();
        let count = self.range_argument(1);
        self.consume_comma();

        let window = self.collect_tokens(start, count);
        self.splice_window(window)
    }

    fn func_right(&mut self) -> Expansion {
        self.next_token();
        self.consume_lparen();

        let count = self.range_argument(1);
        self.consume_comma();

        let mut window = self.collect_tokens(0, usize::MAX);
        window.keep_last(count);
        self.splice_window(window)
    }

    fn func_string(&mut self) -> Expansion {
        self.next_token();
        self.consume_lparen();

        let value = if self.kind() == TokenKind::Ident {
            let name = self.current().str_value().to_string();
            self.next_token();
            name
        } else {
            self.const_expression().to_string()
        };

        if value.len() > self.limits.max_string_len {
            self.report(TokenError::StringTooLong);
            self.skip_until_sep();
            return Expansion::Abandoned;
        }
        self.literal_at_rparen(value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::core::assembler::error::TokenError;
    use crate::core::symbol_table::SymbolTable;
    use crate::core::token_stream::{FunctionLimits, TokenStream};
    use crate::core::tokenizer::{OperatorKind, TokenKind};

    fn open(source: &str) -> TokenStream {
        let mut stream = TokenStream::from_source(source);
        stream.next_token();
        stream
    }

    /// Parser-visible tokens up to end of input, separators as `<sep>`.
    fn drain(stream: &mut TokenStream) -> Vec<String> {
        let mut out = Vec::new();
        while stream.kind() != TokenKind::Eof {
            out.push(match stream.kind() {
                TokenKind::Sep => "<sep>".to_string(),
                _ => stream.current().to_source_text(),
            });
            stream.next_token();
        }
        out
    }

    fn texts(source: &str) -> Vec<String> {
        drain(&mut open(source))
    }

    #[rstest]
    #[case::left(".left(2, a b c) z", &["a", "b", "z"])]
    #[case::mid(".mid(1, 2, a b c) z", &["b", "c", "z"])]
    #[case::right(".right(2, a b c) z", &["b", "c", "z"])]
    #[case::right_keeps_all_when_short(".right(5, a b c) z", &["a", "b", "c", "z"])]
    #[case::left_zero(".left(0, x, y, z) w", &["w"])]
    #[case::mid_past_end(".mid(5, 2, a b c) z", &["z"])]
    #[case::commas_are_tokens(".left(2, a, b) z", &["a", ",", "z"])]
    #[case::nested_parens_kept_whole(".left(4, (a b) c) z", &["(", "a", "b", ")", "z"])]
    #[case::right_after_nested_parens(".right(1, (a b) c) z", &["c", "z"])]
    #[case::inner_function_resolves_first(".left(2, .right(1, a b) c) z", &["b", "c", "z"])]
    #[case::string_inside_window(".left(1, .string(foo) x) z", &["\"foo\"", "z"])]
    fn window_functions(#[case] source: &str, #[case] expected: &[&str]) {
        let mut stream = open(source);
        assert_eq!(drain(&mut stream), expected);
        assert!(stream.diagnostics().is_empty());
    }

    #[test]
    fn left_zero_is_same_as_skipping_the_list() {
        assert_eq!(texts("lda .left(0, x, y, z) #1\nrts"), texts("lda #1\nrts"));
    }

    #[test]
    fn splice_sets_first_window_token_current() {
        let stream = open(".mid(1, 1, a b c) z");
        assert_eq!(stream.kind(), TokenKind::Ident);
        assert_eq!(stream.current().str_value(), "b");
    }

    #[test]
    fn concat_joins_left_to_right() {
        let mut stream = open(".concat(\"a\", \"b\", \"c\")");
        assert_eq!(stream.kind(), TokenKind::StrCon);
        assert_eq!(stream.current().str_value(), "abc");
        stream.next_token();
        assert_eq!(stream.kind(), TokenKind::Eof);
        assert!(stream.diagnostics().is_empty());
    }

    #[test]
    fn concat_replaces_closing_paren_in_place() {
        let stream = open(".concat(\"ab\")");
        assert_eq!(stream.current().span.col_start, 13);
    }

    #[test]
    fn concat_accepts_nested_string_function() {
        let stream = open(".concat(\"v\", .string(12))");
        assert_eq!(stream.current().str_value(), "v12");
    }

    #[test]
    fn concat_rejects_non_string_argument() {
        let mut stream = open(".concat(\"a\", foo) nop\nnext");
        assert_eq!(stream.kind(), TokenKind::Sep);
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::StringConstantExpected),
            1
        );
        stream.next_token();
        assert_eq!(stream.current().str_value(), "next");
    }

    #[test]
    fn concat_too_long_reports_once_and_skips_statement() {
        let limits = FunctionLimits {
            max_string_len: 4,
            ..FunctionLimits::default()
        };
        let mut stream = TokenStream::from_source(".concat(\"abc\", \"def\", \"g\") x\nnext")
            .with_limits(limits);
        stream.next_token();
        assert_eq!(stream.kind(), TokenKind::Sep);
        assert_eq!(stream.diagnostics().count_of(&TokenError::StringTooLong), 1);
        assert_eq!(stream.diagnostics().len(), 1);
        stream.next_token();
        assert_eq!(stream.current().str_value(), "next");
    }

    #[test]
    fn concat_at_exact_limit_is_accepted() {
        let limits = FunctionLimits {
            max_string_len: 6,
            ..FunctionLimits::default()
        };
        let mut stream =
            TokenStream::from_source(".concat(\"abc\", \"def\")").with_limits(limits);
        stream.next_token();
        assert_eq!(stream.current().str_value(), "abcdef");
        assert!(stream.diagnostics().is_empty());
    }

    #[test]
    fn concat_missing_rparen_produces_no_literal() {
        let stream = open(".concat(\"a\" \"b\")");
        assert_eq!(stream.kind(), TokenKind::StrCon);
        assert_eq!(stream.current().str_value(), "b");
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::RightParenExpected),
            1
        );
    }

    #[rstest]
    #[case::identifier(".string(MyLabel)", "MyLabel")]
    #[case::sum(".string(1+2)", "3")]
    #[case::negative(".string(-5)", "-5")]
    #[case::hex(".string($10)", "16")]
    fn string_function(#[case] source: &str, #[case] expected: &str) {
        let stream = open(source);
        assert_eq!(stream.kind(), TokenKind::StrCon);
        assert_eq!(stream.current().str_value(), expected);
        assert!(stream.diagnostics().is_empty());
    }

    #[rstest]
    #[case::identifier_over_limit(".string(abcdefgh) x\nnext", 1)]
    #[case::number_over_limit(".string(12345) x\nnext", 1)]
    #[case::identifier_at_limit(".string(abcd) x\nnext", 0)]
    fn string_result_is_bounded(#[case] source: &str, #[case] too_long: usize) {
        let limits = FunctionLimits {
            max_string_len: 4,
            ..FunctionLimits::default()
        };
        let mut stream = TokenStream::from_source(source).with_limits(limits);
        stream.next_token();
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::StringTooLong),
            too_long
        );
        assert_eq!(stream.diagnostics().len(), too_long);
        if too_long > 0 {
            assert_eq!(stream.kind(), TokenKind::Sep);
        } else {
            assert_eq!(stream.current().str_value(), "abcd");
            stream.next_token();
            assert_eq!(stream.current().str_value(), "x");
            stream.next_token();
        }
        stream.next_token();
        assert_eq!(stream.current().str_value(), "next");
    }

    #[test]
    fn string_of_expression_starting_with_identifier_wants_rparen() {
        let mut symbols = SymbolTable::new();
        let _ = symbols.add("WIDTH", 20);
        let mut stream = TokenStream::from_source(".string(WIDTH*2)").with_symbols(symbols);
        stream.next_token();
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::RightParenExpected),
            1
        );
        assert_eq!(stream.kind(), TokenKind::Operator(OperatorKind::Multiply));
    }

    #[test]
    fn string_missing_rparen_is_reported() {
        let stream = open(".string(foo bar)");
        assert_eq!(stream.current().str_value(), "bar");
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::RightParenExpected),
            1
        );
    }

    #[rstest]
    #[case::left_count_too_big(".left(101, a b c) z", &["a", "z"], 1)]
    #[case::right_count_negative(".right(-1, a b c) z", &["c", "z"], 1)]
    #[case::mid_both_out_of_range(".mid(-1, 200, a b c) z", &["a", "z"], 2)]
    #[case::mid_start_clamped_to_zero(".mid(101, 2, a b c) z", &["a", "b", "z"], 1)]
    #[case::limit_is_inclusive(".left(100, a) z", &["a", "z"], 0)]
    fn range_arguments_are_clamped(
        #[case] source: &str,
        #[case] expected: &[&str],
        #[case] range_errors: usize,
    ) {
        let mut stream = open(source);
        assert_eq!(drain(&mut stream), expected);
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::RangeError),
            range_errors
        );
        assert_eq!(stream.diagnostics().len(), range_errors);
    }

    #[test]
    fn argument_limit_is_configurable() {
        let limits = FunctionLimits {
            argument_limit: 2,
            ..FunctionLimits::default()
        };
        let mut stream = TokenStream::from_source(".left(3, a b c) z").with_limits(limits);
        stream.next_token();
        assert_eq!(drain(&mut stream), vec!["a", "z"]);
        assert_eq!(stream.diagnostics().count_of(&TokenError::RangeError), 1);
    }

    #[test]
    fn unterminated_list_at_eof_returns_partial_window() {
        let mut stream = open(".left(2, a (b c");
        assert_eq!(drain(&mut stream), vec!["a", "("]);
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::UnexpectedEndOfLine),
            1
        );
    }

    #[test]
    fn unterminated_list_at_line_end_keeps_separator() {
        let mut stream = open(".left(5, a b\nnext");
        assert_eq!(drain(&mut stream), vec!["a", "b", "<sep>", "next"]);
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::UnexpectedEndOfLine),
            1
        );
    }

    #[test]
    fn missing_comma_is_reported_but_collection_continues() {
        let mut stream = open(".left(1 a b) z");
        assert_eq!(stream.diagnostics().count_of(&TokenError::CommaExpected), 1);
        assert_eq!(drain(&mut stream), vec!["a", "z"]);
    }

    #[test]
    fn missing_lparen_is_reported() {
        let stream = open(".string 5");
        assert_eq!(
            stream.diagnostics().count_of(&TokenError::LeftParenExpected),
            1
        );
    }
}
