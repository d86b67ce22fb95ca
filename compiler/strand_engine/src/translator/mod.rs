//! Structural program translation.
//!
//! Renders a [`StructuralProgram`] as source text in a target [`Dialect`],
//! rooted at a caller-chosen variable: `g.V().has("name","marko")`.
//! Translation is pure; the same program, dialect and symbol table always
//! produce the same text, so translated programs share cache entries.

mod dialect;

use std::fmt::Write as _;

use strand_ir::{
    BindingValue, Bindings, Literal, ProgramError, QualifiedName, StructuralProgram, SymbolTable,
    ANONYMOUS_TRAVERSAL,
};

pub use dialect::{Dialect, ParseDialectError};

/// Root used when a program does not name exactly one traversal source.
pub const DEFAULT_ROOT: &str = "g";

/// Failure to render a program.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TranslationError {
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error("enum constant '{0}' is not imported")]
    UnknownEnum(QualifiedName),
    #[error("binding '{0}' is not defined")]
    UnresolvedBinding(String),
    #[error("{0} cannot be represented in the strand dialect")]
    NonFiniteNumber(String),
    #[error("a {language} lambda cannot be embedded in {dialect}")]
    UnsupportedLambda { language: String, dialect: Dialect },
}

/// Root variable for `program`: the single traversal-source binding, or
/// [`DEFAULT_ROOT`].
pub fn root_variable(program: &StructuralProgram) -> &str {
    let mut sources = program.traversal_sources();
    match (sources.next(), sources.next()) {
        (Some(root), None) => root,
        _ => DEFAULT_ROOT,
    }
}

/// Bindings visible to a program: its own table, then the enclosing ones.
struct Frame<'a> {
    bindings: &'a Bindings,
    parent: Option<&'a Frame<'a>>,
}

impl<'a> Frame<'a> {
    fn lookup(&self, name: &str) -> Option<&'a BindingValue> {
        match self.bindings.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.lookup(name)),
        }
    }
}

/// Renders programs for one dialect against one import universe.
pub struct Translator<'s> {
    dialect: Dialect,
    symbols: &'s SymbolTable,
}

impl<'s> Translator<'s> {
    pub fn new(dialect: Dialect, symbols: &'s SymbolTable) -> Self {
        Translator { dialect, symbols }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render `program` with `root` as the receiver of its first instruction.
    pub fn translate(
        &self,
        program: &StructuralProgram,
        root: &str,
    ) -> Result<String, TranslationError> {
        program.validate()?;
        let frame = Frame {
            bindings: &program.bindings,
            parent: None,
        };
        let mut out = String::new();
        self.write_program(&mut out, program, root, &frame)?;
        Ok(out)
    }

    fn write_program(
        &self,
        out: &mut String,
        program: &StructuralProgram,
        root: &str,
        frame: &Frame<'_>,
    ) -> Result<(), TranslationError> {
        out.push_str(root);
        for instruction in &program.instructions {
            out.push('.');
            out.push_str(&self.dialect.escape_name(&instruction.operator));
            out.push('(');
            for (i, argument) in instruction.arguments.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.write_literal(out, argument, Some(frame))?;
            }
            out.push(')');
        }
        Ok(())
    }

    fn write_literal(
        &self,
        out: &mut String,
        literal: &Literal,
        frame: Option<&Frame<'_>>,
    ) -> Result<(), TranslationError> {
        let python = self.dialect == Dialect::Python;
        match literal {
            Literal::Null => out.push_str(if python { "None" } else { "null" }),
            Literal::Bool(b) => out.push_str(match (python, b) {
                (true, true) => "True",
                (true, false) => "False",
                (false, true) => "true",
                (false, false) => "false",
            }),
            Literal::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Literal::Long(n) => {
                let _ = match *n {
                    n if python => write!(out, "long({n})"),
                    // Negative literals lex as a negated magnitude, and the
                    // magnitude of the minimum does not fit.
                    i64::MIN => write!(out, "({}L-1L)", i64::MIN + 1),
                    n => write!(out, "{n}L"),
                };
            }
            Literal::Float(x) => self.write_float(out, f64::from(*x), &format!("{x:?}"), 'f')?,
            Literal::Double(x) => self.write_float(out, *x, &format!("{x:?}"), 'd')?,
            Literal::Str(s) => write_string(out, s),
            Literal::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_literal(out, item, frame)?;
                }
                out.push(']');
            }
            Literal::Map(entries) => self.write_map(out, entries, frame)?,
            Literal::Enum(name) => {
                if !self.symbols.has_enum_constant(name) {
                    return Err(TranslationError::UnknownEnum(name.clone()));
                }
                out.push_str(name.simple_owner());
                out.push('.');
                out.push_str(&self.dialect.escape_name(name.member()));
            }
            Literal::Program(nested) => {
                let nested_frame = Frame {
                    bindings: &nested.bindings,
                    parent: frame,
                };
                self.write_program(out, nested, ANONYMOUS_TRAVERSAL, &nested_frame)?;
            }
            Literal::Lambda { language, script } => self.write_lambda(out, language, script)?,
            Literal::Binding(name) => {
                let value = frame
                    .and_then(|frame| frame.lookup(name))
                    .ok_or_else(|| TranslationError::UnresolvedBinding(name.clone()))?;
                match value {
                    BindingValue::TraversalSource => out.push_str(name),
                    // Bound values cannot refer to other bindings.
                    BindingValue::Value(bound) => self.write_literal(out, bound, None)?,
                }
            }
        }
        Ok(())
    }

    fn write_float(
        &self,
        out: &mut String,
        value: f64,
        text: &str,
        suffix: char,
    ) -> Result<(), TranslationError> {
        match self.dialect {
            Dialect::Strand => {
                if !value.is_finite() {
                    return Err(TranslationError::NonFiniteNumber(text.to_string()));
                }
                out.push_str(text);
                out.push(suffix);
            }
            Dialect::Python => {
                let rendered = if value.is_nan() {
                    "float('nan')".to_string()
                } else if value.is_infinite() {
                    let sign = if value < 0.0 { "-" } else { "" };
                    format!("float('{sign}inf')")
                } else if suffix == 'f' {
                    format!("float({text})")
                } else {
                    text.to_string()
                };
                out.push_str(&rendered);
            }
        }
        Ok(())
    }

    fn write_map(
        &self,
        out: &mut String,
        entries: &[(Literal, Literal)],
        frame: Option<&Frame<'_>>,
    ) -> Result<(), TranslationError> {
        let (open, close) = match self.dialect {
            Dialect::Strand => ('[', ']'),
            Dialect::Python => ('{', '}'),
        };
        out.push(open);
        if entries.is_empty() && self.dialect == Dialect::Strand {
            out.push(':');
        }
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.write_literal(out, key, frame)?;
            out.push(':');
            self.write_literal(out, value, frame)?;
        }
        out.push(close);
        Ok(())
    }

    fn write_lambda(
        &self,
        out: &mut String,
        language: &str,
        script: &str,
    ) -> Result<(), TranslationError> {
        if !self.dialect.hosts_language(language) {
            return Err(TranslationError::UnsupportedLambda {
                language: language.to_string(),
                dialect: self.dialect,
            });
        }
        let script = script.trim();
        match self.dialect {
            Dialect::Strand if script.starts_with('{') => out.push_str(script),
            Dialect::Strand => {
                out.push('{');
                out.push_str(script);
                out.push('}');
            }
            Dialect::Python if script.starts_with("lambda") => out.push_str(script),
            Dialect::Python => {
                out.push_str("lambda ");
                out.push_str(script);
            }
        }
        Ok(())
    }
}

/// Double-quoted string literal, valid in both dialects.
fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < ' ' || c == '\u{7f}' => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
