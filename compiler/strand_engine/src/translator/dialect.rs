//! Target dialects and their lexical rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Words that cannot be used as Python attribute names.
const PYTHON_RESERVED: &[&str] = &["and", "as", "from", "global", "in", "is", "not", "or"];

/// A scripting language structural programs can be translated into.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Strand,
    Python,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Strand => "strand",
            Dialect::Python => "python",
        }
    }

    /// Rename `name` if it collides with a reserved word of this dialect.
    pub(crate) fn escape_name(self, name: &str) -> String {
        match self {
            Dialect::Python if PYTHON_RESERVED.contains(&name) => format!("{name}_"),
            _ => name.to_string(),
        }
    }

    /// Whether a lambda tagged with `language` can be embedded.
    pub(crate) fn hosts_language(self, language: &str) -> bool {
        language.eq_ignore_ascii_case(self.name())
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown dialect name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect '{0}' (expected strand or python)")]
pub struct ParseDialectError(String);

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strand" => Ok(Dialect::Strand),
            "python" | "py" => Ok(Dialect::Python),
            _ => Err(ParseDialectError(s.to_string())),
        }
    }
}
