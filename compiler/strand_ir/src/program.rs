//! Structural programs: instruction streams plus a bindings side table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Literal;

/// One traversal step: an operator name and its arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    #[serde(rename = "op")]
    pub operator: String,
    #[serde(rename = "args", default)]
    pub arguments: Vec<Literal>,
}

impl Instruction {
    pub fn new(operator: impl Into<String>, arguments: Vec<Literal>) -> Self {
        Instruction {
            operator: operator.into(),
            arguments,
        }
    }
}

/// Value of a named binding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingValue {
    /// Marks the name as a traversal source; it renders as the bare name.
    TraversalSource,
    Value(Literal),
}

/// Bindings table, ordered by name so translation is deterministic.
pub type Bindings = BTreeMap<String, BindingValue>;

/// Invalid program structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramError {
    /// Instruction at `index` (depth-first order) has an empty operator.
    EmptyOperator { index: usize },
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::EmptyOperator { index } => {
                write!(f, "instruction {index} has an empty operator name")
            }
        }
    }
}

impl std::error::Error for ProgramError {}

/// Language-neutral traversal: ordered instructions and the bindings they
/// may reference.
///
/// JSON accepts either the full object form
/// (`{"instructions": [...], "bindings": {...}}`) or a bare instruction array.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProgramRepr")]
pub struct StructuralProgram {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: Bindings,
}

impl StructuralProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`StructuralProgram::push`].
    #[must_use]
    pub fn with_step(mut self, operator: impl Into<String>, arguments: Vec<Literal>) -> Self {
        self.push(operator, arguments);
        self
    }

    /// Builder form of [`StructuralProgram::bind`].
    #[must_use]
    pub fn with_binding(mut self, name: impl Into<String>, value: BindingValue) -> Self {
        self.bind(name, value);
        self
    }

    pub fn push(&mut self, operator: impl Into<String>, arguments: Vec<Literal>) {
        self.instructions.push(Instruction::new(operator, arguments));
    }

    pub fn bind(&mut self, name: impl Into<String>, value: BindingValue) {
        self.bindings.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn binding(&self, name: &str) -> Option<&BindingValue> {
        self.bindings.get(name)
    }

    /// Names bound to a traversal source, in name order.
    pub fn traversal_sources(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().filter_map(|(name, value)| match value {
            BindingValue::TraversalSource => Some(name.as_str()),
            BindingValue::Value(_) => None,
        })
    }

    /// Check that every operator, including those of nested programs, is
    /// non-empty.
    pub fn validate(&self) -> Result<(), ProgramError> {
        let mut index = 0;
        self.validate_from(&mut index)
    }

    fn validate_from(&self, index: &mut usize) -> Result<(), ProgramError> {
        for instruction in &self.instructions {
            if instruction.operator.is_empty() {
                return Err(ProgramError::EmptyOperator { index: *index });
            }
            *index += 1;
            for argument in &instruction.arguments {
                validate_literal(argument, index)?;
            }
        }
        Ok(())
    }
}

fn validate_literal(literal: &Literal, index: &mut usize) -> Result<(), ProgramError> {
    match literal {
        Literal::Program(program) => program.validate_from(index),
        Literal::List(items) => items.iter().try_for_each(|item| validate_literal(item, index)),
        Literal::Map(entries) => entries.iter().try_for_each(|(k, v)| {
            validate_literal(k, index)?;
            validate_literal(v, index)
        }),
        _ => Ok(()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProgramRepr {
    Steps(Vec<Instruction>),
    Full {
        #[serde(default)]
        instructions: Vec<Instruction>,
        #[serde(default)]
        bindings: Bindings,
    },
}

impl From<ProgramRepr> for StructuralProgram {
    fn from(repr: ProgramRepr) -> Self {
        match repr {
            ProgramRepr::Steps(instructions) => StructuralProgram {
                instructions,
                bindings: Bindings::new(),
            },
            ProgramRepr::Full {
                instructions,
                bindings,
            } => StructuralProgram {
                instructions,
                bindings,
            },
        }
    }
}
