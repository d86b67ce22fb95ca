//! Strand dialect backend.
//!
//! A small dynamically typed scripting language used as the reference
//! [`CompilerBackend`](strand_runtime::CompilerBackend):
//! - [`lexer`]: logos-based tokenizer
//! - [`ast`]: arena-allocated syntax tree
//! - recursive descent parser
//! - tree-walking evaluator over [`strand_runtime`] values
//!
//! Traversal steps are ordinary method calls; a traversal source is any host
//! object the embedder binds (conventionally to `g`).

pub mod ast;
mod error;
mod eval;
pub mod lexer;
mod parser;
mod unit;

pub use error::SyntaxError;
pub use parser::Parser;
pub use unit::{StrandBackend, StrandUnit, LANGUAGE};

/// Lex and parse a complete script.
pub fn parse(source: &str) -> Result<ast::Script, SyntaxError> {
    let tokens = lexer::lex(source)?;
    Parser::new(&tokens).parse_script()
}
