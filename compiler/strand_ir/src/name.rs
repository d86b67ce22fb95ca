//! Namespace-qualified names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error parsing a qualified name from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    pub input: String,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a qualified name (expected Owner.member)",
            self.input
        )
    }
}

impl std::error::Error for NameError {}

/// A member qualified by its owner, such as `Order.desc` or `P.gt`.
///
/// The owner may itself carry a package path (`strand.process.Order`);
/// [`QualifiedName::simple_owner`] strips it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QualifiedName {
    owner: String,
    member: String,
}

impl QualifiedName {
    pub fn new(owner: impl Into<String>, member: impl Into<String>) -> Self {
        QualifiedName {
            owner: owner.into(),
            member: member.into(),
        }
    }

    /// Parse `owner.member`, splitting on the last dot.
    pub fn parse(text: &str) -> Result<Self, NameError> {
        match text.rsplit_once('.') {
            Some((owner, member)) if !owner.is_empty() && !member.is_empty() => {
                Ok(QualifiedName::new(owner, member))
            }
            _ => Err(NameError {
                input: text.to_string(),
            }),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    /// Owner without its package path.
    pub fn simple_owner(&self) -> &str {
        self.owner
            .rsplit_once('.')
            .map_or(self.owner.as_str(), |(_, simple)| simple)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.member)
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedName({self})")
    }
}

impl TryFrom<String> for QualifiedName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        QualifiedName::parse(&value)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> String {
        name.to_string()
    }
}
