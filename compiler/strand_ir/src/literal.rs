//! Literal arguments of structural program instructions.

use serde::{Deserialize, Serialize};

use crate::{QualifiedName, StructuralProgram};

/// An argument value in a structural program.
///
/// Scalars keep their declared width so translation can emit the matching
/// suffix (`5L`, `1.5f`) and the target dialect sees the same numeric type.
///
/// In JSON, plain values map directly (`null`, booleans, integers, floats,
/// strings, arrays). Integers outside `i32` become `Long`. Everything else
/// uses a single-key object: `{"long": 5}`, `{"float": 1.5}`,
/// `{"map": [["k", 1]]}`, `{"enum": "Order.desc"}`, `{"program": {...}}`,
/// `{"lambda": {"language": "strand", "script": "it + 1"}}`,
/// `{"binding": "x"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "LiteralRepr", into = "LiteralRepr")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    List(Vec<Literal>),
    /// Ordered key/value pairs.
    Map(Vec<(Literal, Literal)>),
    Enum(QualifiedName),
    /// Anonymous child traversal.
    Program(StructuralProgram),
    /// Code fragment in a named dialect, emitted verbatim when the dialect matches.
    Lambda {
        language: String,
        script: String,
    },
    /// Reference into the enclosing program's bindings table.
    Binding(String),
}

impl Literal {
    pub fn enum_constant(owner: &str, member: &str) -> Self {
        Literal::Enum(QualifiedName::new(owner, member))
    }

    pub fn lambda(language: impl Into<String>, script: impl Into<String>) -> Self {
        Literal::Lambda {
            language: language.into(),
            script: script.into(),
        }
    }

    pub fn binding(name: impl Into<String>) -> Self {
        Literal::Binding(name.into())
    }

    /// Short description of the literal's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Long(_) => "long",
            Literal::Float(_) => "float",
            Literal::Double(_) => "double",
            Literal::Str(_) => "string",
            Literal::List(_) => "list",
            Literal::Map(_) => "map",
            Literal::Enum(_) => "enum",
            Literal::Program(_) => "program",
            Literal::Lambda { .. } => "lambda",
            Literal::Binding(_) => "binding",
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Long(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Float(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Double(value)
    }
}

impl From<StructuralProgram> for Literal {
    fn from(value: StructuralProgram) -> Self {
        Literal::Program(value)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(values: Vec<T>) -> Self {
        Literal::List(values.into_iter().map(Into::into).collect())
    }
}

// JSON shape

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LiteralRepr {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    List(Vec<LiteralRepr>),
    Tagged(Tagged),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Tagged {
    Long(i64),
    Float(f32),
    Double(f64),
    Map(Vec<(LiteralRepr, LiteralRepr)>),
    Enum(QualifiedName),
    Program(StructuralProgram),
    Lambda { language: String, script: String },
    Binding(String),
}

impl From<LiteralRepr> for Literal {
    fn from(repr: LiteralRepr) -> Self {
        match repr {
            LiteralRepr::Null => Literal::Null,
            LiteralRepr::Bool(b) => Literal::Bool(b),
            LiteralRepr::Int(n) => i32::try_from(n).map_or(Literal::Long(n), Literal::Int),
            LiteralRepr::Double(d) => Literal::Double(d),
            LiteralRepr::Str(s) => Literal::Str(s),
            LiteralRepr::List(items) => Literal::List(items.into_iter().map(Into::into).collect()),
            LiteralRepr::Tagged(tagged) => match tagged {
                Tagged::Long(n) => Literal::Long(n),
                Tagged::Float(f) => Literal::Float(f),
                Tagged::Double(d) => Literal::Double(d),
                Tagged::Map(entries) => Literal::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.into(), v.into()))
                        .collect(),
                ),
                Tagged::Enum(name) => Literal::Enum(name),
                Tagged::Program(program) => Literal::Program(program),
                Tagged::Lambda { language, script } => Literal::Lambda { language, script },
                Tagged::Binding(name) => Literal::Binding(name),
            },
        }
    }
}

impl From<Literal> for LiteralRepr {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Null => LiteralRepr::Null,
            Literal::Bool(b) => LiteralRepr::Bool(b),
            Literal::Int(n) => LiteralRepr::Int(i64::from(n)),
            Literal::Long(n) => LiteralRepr::Tagged(Tagged::Long(n)),
            Literal::Float(f) => LiteralRepr::Tagged(Tagged::Float(f)),
            Literal::Double(d) => LiteralRepr::Double(d),
            Literal::Str(s) => LiteralRepr::Str(s),
            Literal::List(items) => LiteralRepr::List(items.into_iter().map(Into::into).collect()),
            Literal::Map(entries) => LiteralRepr::Tagged(Tagged::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            )),
            Literal::Enum(name) => LiteralRepr::Tagged(Tagged::Enum(name)),
            Literal::Program(program) => LiteralRepr::Tagged(Tagged::Program(program)),
            Literal::Lambda { language, script } => {
                LiteralRepr::Tagged(Tagged::Lambda { language, script })
            }
            Literal::Binding(name) => LiteralRepr::Tagged(Tagged::Binding(name)),
        }
    }
}
