// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token-level engine.
//!
//! # Components
//!
//! - [`tokenizer`] - Raw scanner and token model
//! - [`token_list`] - Captured token sequences
//! - [`feed`] - Pushed token lists stacked over the scanner
//! - [`token_stream`] - Current token, function dispatch and raw mode
//! - [`token_functions`] - `.CONCAT`, `.LEFT`, `.MID`, `.RIGHT`, `.STRING`
//! - [`expr`] - Constant expressions
//! - [`assembler`] - Diagnostics and the statement listing driver

pub mod assembler;
pub mod expr;
pub mod feed;
pub mod report;
pub mod symbol_table;
pub mod text_utils;
pub mod token_functions;
pub mod token_list;
pub mod token_stream;
pub mod tokenizer;

// Re-exports for convenience
pub use assembler::error::{Diagnostic, Diagnostics, TokenError};
pub use expr::{eval_expr, parse_number, EvalContext, EvalError};
pub use symbol_table::{SymbolTable, SymbolTableResult};
pub use token_list::TokenList;
pub use token_stream::{FunctionLimits, RawModeGuard, TokenStream};
pub use tokenizer::{Scanner, Span, Token, TokenFunction, TokenKind, TokenizeError, Tokenizer};
