// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Constant expression parsing and evaluation.
//!
//! Expressions are read straight from the [`TokenStream`], so token
//! functions inside a numeric argument expand before the parser sees them.
//! Parsing builds an [`Expr`] tree which [`eval_expr`] then folds to a value
//! against an [`EvalContext`].

use crate::core::assembler::error::TokenError;
use crate::core::symbol_table::SymbolTable;
use crate::core::token_stream::TokenStream;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i64, Span),
    Identifier(String, Span),
    String(String, Span),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },
    Error(String, Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicNot,
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Mod,
    Power,
    Shl,
    Shr,
    Add,
    Subtract,
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
    BitAnd,
    BitOr,
    BitXor,
    LogicAnd,
    LogicOr,
    LogicXor,
}

/// Error returned from expression evaluation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

/// Symbol lookup for expression evaluation.
pub trait EvalContext {
    fn lookup_symbol(&self, name: &str) -> Option<i64>;
}

impl EvalContext for SymbolTable {
    fn lookup_symbol(&self, name: &str) -> Option<i64> {
        self.entry(name)
    }
}

impl TokenStream {
    /// Read a constant expression starting at the current token and return
    /// its value. Errors are reported and evaluate to zero; the token that
    /// ends the expression stays current.
    pub fn const_expression(&mut self) -> i64 {
        let expr = self.parse_expr();
        match eval_expr(&expr, &self.symbols) {
            Ok(value) => value,
            Err(err) => {
                let span = err.span.unwrap_or(self.current().span);
                self.diagnostics_mut()
                    .report(span, TokenError::Expression(err.message));
                0
            }
        }
    }

    fn parse_expr(&mut self) -> Expr {
        let op = match self.peek_operator_kind() {
            Some(OperatorKind::Lt) => UnaryOp::Low,
            Some(OperatorKind::Gt) => UnaryOp::High,
            _ => return self.parse_ternary(),
        };
        let span = self.advance_span();
        let expr = self.parse_expr();
        Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        }
    }

    fn parse_ternary(&mut self) -> Expr {
        let node = self.parse_logical_or();
        if self.kind() != TokenKind::Question {
            return node;
        }
        let span = self.advance_span();
        let then_expr = self.parse_expr();
        if self.kind() != TokenKind::Colon {
            return Expr::Error(
                "Missing ':' in conditional expression".to_string(),
                self.current().span,
            );
        }
        self.next_token();
        let else_expr = self.parse_expr();
        Expr::Ternary {
            cond: Box::new(node),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            span,
        }
    }

    fn parse_logical_or(&mut self) -> Expr {
        let mut node = self.parse_logical_and();
        loop {
            let op = match self.peek_operator_kind() {
                Some(OperatorKind::LogicOr) => BinaryOp::LogicOr,
                Some(OperatorKind::LogicXor) => BinaryOp::LogicXor,
                _ => break,
            };
            let span = self.advance_span();
            let right = self.parse_logical_and();
            node = binary(op, node, right, span);
        }
        node
    }

    fn parse_logical_and(&mut self) -> Expr {
        let mut node = self.parse_bit_or();
        while self.peek_operator_kind() == Some(OperatorKind::LogicAnd) {
            let span = self.advance_span();
            let right = self.parse_bit_or();
            node = binary(BinaryOp::LogicAnd, node, right, span);
        }
        node
    }

    fn parse_bit_or(&mut self) -> Expr {
        let mut node = self.parse_bit_xor();
        while self.peek_operator_kind() == Some(OperatorKind::BitOr) {
            let span = self.advance_span();
            let right = self.parse_bit_xor();
            node = binary(BinaryOp::BitOr, node, right, span);
        }
        node
    }

    fn parse_bit_xor(&mut self) -> Expr {
        let mut node = self.parse_bit_and();
        while self.peek_operator_kind() == Some(OperatorKind::BitXor) {
            let span = self.advance_span();
            let right = self.parse_bit_and();
            node = binary(BinaryOp::BitXor, node, right, span);
        }
        node
    }

    fn parse_bit_and(&mut self) -> Expr {
        let mut node = self.parse_compare();
        while self.peek_operator_kind() == Some(OperatorKind::BitAnd) {
            let span = self.advance_span();
            let right = self.parse_compare();
            node = binary(BinaryOp::BitAnd, node, right, span);
        }
        node
    }

    fn parse_compare(&mut self) -> Expr {
        let mut node = self.parse_shift();
        loop {
            let op = match self.peek_operator_kind() {
                Some(OperatorKind::Eq) => BinaryOp::Eq,
                Some(OperatorKind::Ne) => BinaryOp::Ne,
                Some(OperatorKind::Ge) => BinaryOp::Ge,
                Some(OperatorKind::Gt) => BinaryOp::Gt,
                Some(OperatorKind::Le) => BinaryOp::Le,
                Some(OperatorKind::Lt) => BinaryOp::Lt,
                _ => break,
            };
            let span = self.advance_span();
            let right = self.parse_shift();
            node = binary(op, node, right, span);
        }
        node
    }

    fn parse_shift(&mut self) -> Expr {
        let mut node = self.parse_sum();
        loop {
            let op = match self.peek_operator_kind() {
                Some(OperatorKind::Shl) => BinaryOp::Shl,
                Some(OperatorKind::Shr) => BinaryOp::Shr,
                _ => break,
            };
            let span = self.advance_span();
            let right = self.parse_sum();
            node = binary(op, node, right, span);
        }
        node
    }

    fn parse_sum(&mut self) -> Expr {
        let mut node = self.parse_term();
        loop {
            let op = match self.peek_operator_kind() {
                Some(OperatorKind::Plus) => BinaryOp::Add,
                Some(OperatorKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            let span = self.advance_span();
            let right = self.parse_term();
            node = binary(op, node, right, span);
        }
        node
    }

    fn parse_term(&mut self) -> Expr {
        let mut node = self.parse_power();
        loop {
            let op = match self.peek_operator_kind() {
                Some(OperatorKind::Multiply) => BinaryOp::Multiply,
                Some(OperatorKind::Divide) => BinaryOp::Divide,
                Some(OperatorKind::Mod) => BinaryOp::Mod,
                _ => break,
            };
            let span = self.advance_span();
            let right = self.parse_power();
            node = binary(op, node, right, span);
        }
        node
    }

    fn parse_power(&mut self) -> Expr {
        let node = self.parse_unary();
        if self.peek_operator_kind() == Some(OperatorKind::Power) {
            let span = self.advance_span();
            let right = self.parse_power();
            return binary(BinaryOp::Power, node, right, span);
        }
        node
    }

    fn parse_unary(&mut self) -> Expr {
        let op = match self.peek_operator_kind() {
            Some(OperatorKind::Plus) => UnaryOp::Plus,
            Some(OperatorKind::Minus) => UnaryOp::Minus,
            Some(OperatorKind::BitNot) => UnaryOp::BitNot,
            Some(OperatorKind::LogicNot) => UnaryOp::LogicNot,
            _ => return self.parse_primary(),
        };
        let span = self.advance_span();
        let expr = self.parse_unary();
        Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let token = self.current().clone();
        match token.kind {
            TokenKind::IntCon => {
                self.next_token();
                Expr::Number(token.int_value().unwrap_or(0), token.span)
            }
            TokenKind::Ident => {
                self.next_token();
                Expr::Identifier(token.str_value().to_string(), token.span)
            }
            TokenKind::StrCon => {
                self.next_token();
                Expr::String(token.str_value().to_string(), token.span)
            }
            TokenKind::LParen => {
                self.next_token();
                let expr = self.parse_expr();
                if self.kind() != TokenKind::RParen {
                    return Expr::Error("Missing ')'".to_string(), self.current().span);
                }
                self.next_token();
                expr
            }
            kind if kind.is_separator() => {
                Expr::Error("Unexpected end of expression".to_string(), token.span)
            }
            _ => Expr::Error("Unexpected token in expression".to_string(), token.span),
        }
    }

    fn peek_operator_kind(&self) -> Option<OperatorKind> {
        match self.kind() {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Span of the current token; then advance past it.
    fn advance_span(&mut self) -> Span {
        let span = self.current().span;
        self.next_token();
        span
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

/// Evaluate an expression to a numeric value.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<i64, EvalError> {
    match expr {
        Expr::Number(value, _) => Ok(*value),

        Expr::Identifier(name, span) => ctx
            .lookup_symbol(name)
            .ok_or_else(|| EvalError::with_span(format!("Undefined symbol: {name}"), *span)),

        Expr::String(text, span) => match text.as_bytes() {
            [c] => Ok(i64::from(*c)),
            [hi, lo] => Ok((i64::from(*hi) << 8) | i64::from(*lo)),
            _ => Err(EvalError::with_span(
                "Multi-character string not allowed in expression",
                *span,
            )),
        },

        Expr::Unary { op, expr, .. } => Ok(apply_unary(*op, eval_expr(expr, ctx)?)),

        Expr::Binary {
            op,
            left,
            right,
            span,
        } => {
            let l = eval_expr(left, ctx)?;
            let r = eval_expr(right, ctx)?;
            apply_binary(*op, l, r, *span)
        }

        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
            ..
        } => {
            if eval_expr(cond, ctx)? != 0 {
                eval_expr(then_expr, ctx)
            } else {
                eval_expr(else_expr, ctx)
            }
        }

        Expr::Error(msg, span) => Err(EvalError::with_span(msg.clone(), *span)),
    }
}

/// Apply a unary operator to a value.
pub fn apply_unary(op: UnaryOp, val: i64) -> i64 {
    match op {
        UnaryOp::Plus => val,
        UnaryOp::Minus => val.wrapping_neg(),
        UnaryOp::BitNot => !val,
        UnaryOp::LogicNot => (val == 0) as i64,
        UnaryOp::Low => val & 0xff,
        UnaryOp::High => (val >> 8) & 0xff,
    }
}

/// Apply a binary operator to two values.
pub fn apply_binary(op: BinaryOp, l: i64, r: i64, span: Span) -> Result<i64, EvalError> {
    Ok(match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Subtract => l.wrapping_sub(r),
        BinaryOp::Multiply => l.wrapping_mul(r),
        BinaryOp::Divide => {
            if r == 0 {
                return Err(EvalError::with_span("Division by zero", span));
            }
            l.wrapping_div(r)
        }
        BinaryOp::Mod => {
            if r == 0 {
                return Err(EvalError::with_span("Modulo by zero", span));
            }
            l.wrapping_rem(r)
        }
        BinaryOp::Power => {
            if r < 0 {
                0
            } else {
                l.wrapping_pow(r.min(u32::MAX as i64) as u32)
            }
        }
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitOr => l | r,
        BinaryOp::BitXor => l ^ r,
        BinaryOp::Shl => l << (r & 0x3f),
        BinaryOp::Shr => ((l as u64) >> (r & 0x3f)) as i64,
        BinaryOp::Eq => (l == r) as i64,
        BinaryOp::Ne => (l != r) as i64,
        BinaryOp::Lt => (l < r) as i64,
        BinaryOp::Le => (l <= r) as i64,
        BinaryOp::Gt => (l > r) as i64,
        BinaryOp::Ge => (l >= r) as i64,
        BinaryOp::LogicAnd => ((l != 0) && (r != 0)) as i64,
        BinaryOp::LogicOr => ((l != 0) || (r != 0)) as i64,
        BinaryOp::LogicXor => ((l != 0) ^ (r != 0)) as i64,
    })
}

/// Parse a number literal as written on the command line.
///
/// Supports:
/// - Decimal: `42`, `-10`
/// - Hex: `$2A`, `0x2A`, `2Ah`
/// - Binary: `%101010`, `0b101010`, `101010b`
/// - Octal: `52o`, `52q`
pub fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (is_neg, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let text: String = text.chars().filter(|&c| c != '_').collect();
    let text = text.as_str();
    let last = text.len().checked_sub(1)?;

    let val = if let Some(hex) = text.strip_prefix('$') {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = text.strip_prefix('%') {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if text.ends_with(['h', 'H']) {
        i64::from_str_radix(&text[..last], 16).ok()?
    } else if text.ends_with(['b', 'B']) && text[..last].chars().all(|c| c == '0' || c == '1') {
        i64::from_str_radix(&text[..last], 2).ok()?
    } else if text.ends_with(['o', 'O', 'q', 'Q']) {
        i64::from_str_radix(&text[..last], 8).ok()?
    } else {
        text.parse::<i64>().ok()?
    };

    Some(if is_neg { -val } else { val })
}
