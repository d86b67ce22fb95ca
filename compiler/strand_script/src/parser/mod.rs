//! Recursive descent parser for the Strand dialect.
//!
//! - Allocates all expressions in an arena
//! - Newlines and `;` terminate statements; newlines are skipped inside
//!   brackets, after binary operators, and before a `.` that continues a
//!   method chain
//! - Stops at the first error

mod expr;

use rustc_hash::FxHashSet;
use strand_ir::Span;

use crate::ast::{Block, ExprArena, ExprId, FunctionDef, Script, Stmt};
use crate::error::SyntaxError;
use crate::lexer::{Token, TokenKind};

type ParseResult<T> = Result<T, SyntaxError>;

/// Parser state.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    arena: ExprArena,
}

impl<'t> Parser<'t> {
    /// `tokens` must end with `Eof`, as produced by [`crate::lexer::lex`].
    pub fn new(tokens: &'t [Token]) -> Self {
        Parser {
            tokens,
            pos: 0,
            arena: ExprArena::new(),
        }
    }

    /// Parse a complete script.
    pub fn parse_script(mut self) -> ParseResult<Script> {
        let mut body = Vec::new();
        let mut functions: Vec<FunctionDef> = Vec::new();
        let mut names = FxHashSet::default();

        self.skip_separators();
        while !self.at_end() {
            if self.check(&TokenKind::Def) {
                let function = self.function()?;
                if !names.insert(function.name.clone()) {
                    return Err(SyntaxError::new(
                        format!("function '{}' is already defined", function.name),
                        function.span,
                    ));
                }
                functions.push(function);
            } else {
                body.push(self.statement()?);
            }
            self.end_of_statement()?;
            self.skip_separators();
        }

        Ok(Script {
            arena: self.arena,
            body,
            functions,
        })
    }

    // ===== Token access =====

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1) {
            Some(prev) => self.tokens[prev].span,
            None => self.current_span(),
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn peek_kind(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> &Token {
        if !self.at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos - 1]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, what: &str) -> ParseResult<Span> {
        if self.check(kind) {
            Ok(self.advance().span)
        } else {
            Err(self.expected(what))
        }
    }

    fn ident(&mut self, what: &str) -> ParseResult<String> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected(what)),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.current_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.advance();
        }
    }

    fn expected(&self, what: &str) -> SyntaxError {
        SyntaxError::new(
            format!("expected {what}, found {}", self.current_kind()),
            self.current_span(),
        )
    }

    fn end_of_statement(&self) -> ParseResult<()> {
        match self.current_kind() {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof | TokenKind::RBrace => {
                Ok(())
            }
            _ => Err(self.expected("newline or ';' after statement")),
        }
    }

    // ===== Declarations =====

    fn function(&mut self) -> ParseResult<FunctionDef> {
        let start = self.consume(&TokenKind::Def, "'def'")?;
        let name = self.ident("function name")?;
        self.consume(&TokenKind::LParen, "'(' after function name")?;
        let params = self.params(&TokenKind::RParen)?;
        self.consume(&TokenKind::RParen, "')' after parameters")?;
        let body = self.block()?;
        Ok(FunctionDef {
            name,
            params,
            body,
            span: start.merge(self.previous_span()),
        })
    }

    /// Comma-separated parameter names up to (not including) `close`.
    fn params(&mut self, close: &TokenKind) -> ParseResult<Vec<String>> {
        let mut params: Vec<String> = Vec::new();
        self.skip_newlines();
        while !self.check(close) {
            let span = self.current_span();
            let name = self.ident("parameter name")?;
            if params.contains(&name) {
                return Err(SyntaxError::new(
                    format!("duplicate parameter '{name}'"),
                    span,
                ));
            }
            params.push(name);
            self.skip_newlines();
            if !self.eat(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        Ok(params)
    }

    // ===== Statements =====

    fn block(&mut self) -> ParseResult<Block> {
        self.consume(&TokenKind::LBrace, "'{'")?;
        let body = self.statements_until_brace()?;
        self.consume(&TokenKind::RBrace, "'}'")?;
        Ok(body)
    }

    /// Statements up to a closing `}`, which is left in place.
    fn statements_until_brace(&mut self) -> ParseResult<Block> {
        let mut body = Vec::new();
        self.skip_separators();
        while !self.check(&TokenKind::RBrace) {
            if self.at_end() {
                return Err(self.expected("'}'"));
            }
            if self.check(&TokenKind::Def) {
                return Err(SyntaxError::new(
                    "functions may only be defined at the top level",
                    self.current_span(),
                ));
            }
            body.push(self.statement()?);
            self.end_of_statement()?;
            self.skip_separators();
        }
        Ok(body)
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        match self.current_kind() {
            TokenKind::Var => {
                self.advance();
                let name = self.ident("variable name")?;
                self.consume(&TokenKind::Eq, "'=' in variable declaration")?;
                self.skip_newlines();
                let init = self.expression()?;
                Ok(Stmt::Var { name, init })
            }
            TokenKind::Return => {
                self.advance();
                let value = match self.current_kind() {
                    TokenKind::Newline
                    | TokenKind::Semicolon
                    | TokenKind::Eof
                    | TokenKind::RBrace => None,
                    _ => Some(self.expression()?),
                };
                Ok(Stmt::Return(value))
            }
            TokenKind::If => self.if_statement(),
            TokenKind::While => {
                self.advance();
                let cond = self.condition()?;
                let body = self.block()?;
                Ok(Stmt::While { cond, body })
            }
            TokenKind::For => {
                self.advance();
                self.consume(&TokenKind::LParen, "'(' after 'for'")?;
                let var = self.ident("loop variable")?;
                self.consume(&TokenKind::In, "'in'")?;
                let iterable = self.expression()?;
                self.consume(&TokenKind::RParen, "')'")?;
                let body = self.block()?;
                Ok(Stmt::For {
                    var,
                    iterable,
                    body,
                })
            }
            _ => Ok(Stmt::Expr(self.expression()?)),
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(&TokenKind::If, "'if'")?;
        let cond = self.condition()?;
        let then_block = self.block()?;

        // `else` may sit on the line after the closing brace.
        let mut lookahead = 0;
        while matches!(self.peek_kind(lookahead), TokenKind::Newline) {
            lookahead += 1;
        }
        let else_block = if matches!(self.peek_kind(lookahead), TokenKind::Else) {
            self.skip_newlines();
            self.advance();
            if self.check(&TokenKind::If) {
                Some(vec![self.if_statement()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn condition(&mut self) -> ParseResult<ExprId> {
        self.consume(&TokenKind::LParen, "'('")?;
        self.skip_newlines();
        let cond = self.expression()?;
        self.skip_newlines();
        self.consume(&TokenKind::RParen, "')'")?;
        Ok(cond)
    }
}
