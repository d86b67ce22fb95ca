//! Expression parsing: operators, calls, literals, closures.

use crate::ast::{
    AssignTarget, BinaryOp, ClosureDef, Expr, ExprId, ExprKind, UnaryOp,
};
use crate::error::SyntaxError;
use crate::lexer::TokenKind;

use super::{ParseResult, Parser};

impl Parser<'_> {
    /// Parse any expression, including assignment.
    pub(super) fn expression(&mut self) -> ParseResult<ExprId> {
        let left = self.binary(u8::MAX)?;
        if !self.check(&TokenKind::Eq) {
            return Ok(left);
        }

        let target = self.assign_target(left)?;
        self.advance();
        self.skip_newlines();
        let value = self.expression()?;
        let span = self.arena.get(left).span.merge(self.arena.get(value).span);
        Ok(self
            .arena
            .alloc(Expr::new(ExprKind::Assign { target, value }, span)))
    }

    fn assign_target(&self, target: ExprId) -> ParseResult<AssignTarget> {
        let expr = self.arena.get(target);
        match &expr.kind {
            ExprKind::Ident(name) => Ok(AssignTarget::Name(name.clone())),
            ExprKind::Index { receiver, index } => match &self.arena.get(*receiver).kind {
                ExprKind::Ident(name) => Ok(AssignTarget::Index {
                    name: name.clone(),
                    index: *index,
                }),
                _ => Err(SyntaxError::new(
                    "only a variable can be indexed on the left of '='",
                    expr.span,
                )),
            },
            _ => Err(SyntaxError::new("invalid assignment target", expr.span)),
        }
    }

    /// Precedence climbing over left-associative binary operators.
    fn binary(&mut self, max_prec: u8) -> ParseResult<ExprId> {
        let mut left = self.unary()?;

        while let Some(op) = self.binary_op() {
            let prec = op.precedence();
            if prec > max_prec {
                break;
            }
            self.advance();
            self.skip_newlines();

            let right = self.binary(prec - 1)?;
            let span = self.arena.get(left).span.merge(self.arena.get(right).span);
            left = self
                .arena
                .alloc(Expr::new(ExprKind::Binary { op, left, right }, span));
        }

        Ok(left)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    fn unary(&mut self) -> ParseResult<ExprId> {
        let start = self.current_span();
        let op = match self.current_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.unary()?;
        let span = start.merge(self.arena.get(operand).span);
        Ok(self
            .arena
            .alloc(Expr::new(ExprKind::Unary { op, operand }, span)))
    }

    fn postfix(&mut self) -> ParseResult<ExprId> {
        let mut expr = self.primary()?;

        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    self.skip_newlines();
                    let name = self.member_name()?;
                    let kind = if self.check(&TokenKind::LParen) || self.check(&TokenKind::LBrace)
                    {
                        let args = self.call_args()?;
                        ExprKind::MethodCall {
                            receiver: expr,
                            method: name,
                            args,
                        }
                    } else {
                        ExprKind::Property {
                            receiver: expr,
                            name,
                        }
                    };
                    expr = self.alloc_from(expr, kind);
                }
                TokenKind::LParen => {
                    let args = self.call_args()?;
                    let kind = match &self.arena.get(expr).kind {
                        ExprKind::Ident(name) => ExprKind::Call {
                            name: name.clone(),
                            args,
                        },
                        _ => ExprKind::CallValue { callee: expr, args },
                    };
                    expr = self.alloc_from(expr, kind);
                }
                // `name { ... }` calls `name` with a single closure.
                TokenKind::LBrace
                    if matches!(self.arena.get(expr).kind, ExprKind::Ident(_)) =>
                {
                    let args = self.call_args()?;
                    let ExprKind::Ident(name) = &self.arena.get(expr).kind else {
                        break;
                    };
                    let kind = ExprKind::Call {
                        name: name.clone(),
                        args,
                    };
                    expr = self.alloc_from(expr, kind);
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.skip_newlines();
                    let index = self.expression()?;
                    self.skip_newlines();
                    self.consume(&TokenKind::RBracket, "']'")?;
                    expr = self.alloc_from(
                        expr,
                        ExprKind::Index {
                            receiver: expr,
                            index,
                        },
                    );
                }
                // A line that starts with `.` continues the chain.
                TokenKind::Newline if self.continues_chain() => self.skip_newlines(),
                _ => break,
            }
        }

        Ok(expr)
    }

    fn continues_chain(&self) -> bool {
        let mut offset = 0;
        while matches!(self.peek_kind(offset), TokenKind::Newline) {
            offset += 1;
        }
        matches!(self.peek_kind(offset), TokenKind::Dot)
    }

    /// Allocate `kind` spanning from `start` to the previous token.
    fn alloc_from(&mut self, start: ExprId, kind: ExprKind) -> ExprId {
        let span = self.arena.get(start).span.merge(self.previous_span());
        self.arena.alloc(Expr::new(kind, span))
    }

    /// Method and property names may be keywords (`g.V().in("knows")`).
    fn member_name(&mut self) -> ParseResult<String> {
        let name = match self.current_kind() {
            TokenKind::Ident(name) => name.clone(),
            kind @ (TokenKind::Def
            | TokenKind::Var
            | TokenKind::Return
            | TokenKind::If
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::For
            | TokenKind::In
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null) => kind.to_string(),
            _ => return Err(self.expected("method or property name")),
        };
        self.advance();
        Ok(name)
    }

    /// `(args)` followed by an optional trailing closure, or a lone closure.
    fn call_args(&mut self) -> ParseResult<Vec<ExprId>> {
        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            self.skip_newlines();
            while !self.check(&TokenKind::RParen) {
                args.push(self.expression()?);
                self.skip_newlines();
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
                self.skip_newlines();
            }
            self.consume(&TokenKind::RParen, "')' after arguments")?;
        }
        if self.check(&TokenKind::LBrace) {
            args.push(self.closure()?);
        }
        Ok(args)
    }

    fn primary(&mut self) -> ParseResult<ExprId> {
        let span = self.current_span();
        let kind = match self.current_kind() {
            TokenKind::Int(n) => ExprKind::Int(*n),
            TokenKind::Float(x) => ExprKind::Float(*x),
            TokenKind::Str(s) => ExprKind::Str(s.as_str().into()),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Null => ExprKind::Null,
            TokenKind::Ident(name) => ExprKind::Ident(name.clone()),
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.expression()?;
                self.skip_newlines();
                self.consume(&TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.list_or_map(),
            TokenKind::LBrace => return self.closure(),
            _ => return Err(self.expected("expression")),
        };
        self.advance();
        Ok(self.arena.alloc(Expr::new(kind, span)))
    }

    /// `[a, b]`, `[]`, `[k: v]` or `[:]`.
    fn list_or_map(&mut self) -> ParseResult<ExprId> {
        let start = self.consume(&TokenKind::LBracket, "'['")?;
        self.skip_newlines();

        if self.check(&TokenKind::Colon) && matches!(self.peek_kind(1), TokenKind::RBracket) {
            self.advance();
            self.advance();
            let span = start.merge(self.previous_span());
            return Ok(self.arena.alloc(Expr::new(ExprKind::Map(Vec::new()), span)));
        }

        let mut items = Vec::new();
        let mut entries = Vec::new();
        let mut is_map = None;

        while !self.check(&TokenKind::RBracket) {
            let first = self.expression()?;
            let entry_is_map = self.check(&TokenKind::Colon);
            match is_map {
                None => is_map = Some(entry_is_map),
                Some(expected) if expected != entry_is_map => {
                    return Err(SyntaxError::new(
                        "cannot mix map entries and list items",
                        self.arena.get(first).span,
                    ));
                }
                Some(_) => {}
            }

            if entry_is_map {
                self.advance();
                self.skip_newlines();
                let key = self.map_key(first);
                let value = self.expression()?;
                entries.push((key, value));
            } else {
                items.push(first);
            }

            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }

        self.consume(&TokenKind::RBracket, "']'")?;
        let span = start.merge(self.previous_span());
        let kind = if is_map == Some(true) {
            ExprKind::Map(entries)
        } else {
            ExprKind::List(items)
        };
        Ok(self.arena.alloc(Expr::new(kind, span)))
    }

    /// Bare identifier keys name themselves.
    fn map_key(&mut self, key: ExprId) -> ExprId {
        let expr = self.arena.get(key);
        match &expr.kind {
            ExprKind::Ident(name) => {
                let kind = ExprKind::Str(name.as_str().into());
                let span = expr.span;
                self.arena.alloc(Expr::new(kind, span))
            }
            _ => key,
        }
    }

    /// `{ a, b -> body }` or `{ body }` (binds `it`).
    fn closure(&mut self) -> ParseResult<ExprId> {
        let start = self.consume(&TokenKind::LBrace, "'{'")?;
        let params = self.closure_params()?;
        let body = self.statements_until_brace()?;
        self.consume(&TokenKind::RBrace, "'}' to close the closure")?;
        let span = start.merge(self.previous_span());
        let id = self.arena.alloc_closure(ClosureDef { params, body, span });
        Ok(self.arena.alloc(Expr::new(ExprKind::Closure(id), span)))
    }

    /// Parameters before `->`, or `None` (with the position restored) when
    /// the closure has no parameter list.
    fn closure_params(&mut self) -> ParseResult<Option<Vec<String>>> {
        let saved = self.pos;
        self.skip_newlines();
        if self.eat(&TokenKind::Arrow) {
            return Ok(Some(Vec::new()));
        }

        let mut params: Vec<String> = Vec::new();
        while let TokenKind::Ident(name) = self.current_kind() {
            let (name, span) = (name.clone(), self.current_span());
            self.advance();
            if params.contains(&name) {
                return Err(SyntaxError::new(
                    format!("duplicate parameter '{name}'"),
                    span,
                ));
            }
            params.push(name);
            if self.eat(&TokenKind::Arrow) {
                return Ok(Some(params));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.pos = saved;
        Ok(None)
    }
}
