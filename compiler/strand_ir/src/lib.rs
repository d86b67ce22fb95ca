//! Strand IR - language-neutral program representation
//!
//! This crate holds the data shared by every layer of the engine:
//! - Spans and line/column lookup for diagnostics
//! - Qualified names for imported types, static functions and enum constants
//! - Literals and the structural program model (instructions + bindings)
//! - The symbol table describing the default import universe
//!
//! # Design Philosophy
//!
//! - **Plain data**: everything here is `Clone + Debug + PartialEq`, no behavior
//!   beyond construction and lookup.
//! - **Acyclic by ownership**: nested programs are owned values, so a program
//!   can never contain itself.
//! - **Serializable**: programs and symbol tables round-trip through JSON so
//!   the CLI and configuration files can carry them.

mod literal;
mod name;
mod program;
mod span;
mod symbols;

pub use literal::Literal;
pub use name::{NameError, QualifiedName};
pub use program::{BindingValue, Bindings, Instruction, ProgramError, StructuralProgram};
pub use span::{LineCol, LineIndex, Span, SpanError};
pub use symbols::{core_imports, SymbolTable, ANONYMOUS_TRAVERSAL};
