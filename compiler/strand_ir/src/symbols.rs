//! Symbol tables: the imported types, static functions and enum constants a
//! script can reference without qualification.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::QualifiedName;

/// Simple name of the anonymous traversal type used to root nested programs.
pub const ANONYMOUS_TRAVERSAL: &str = "__";

/// Read-only import universe consumed by translators and backends.
///
/// Types are keyed by simple name; functions and enum constants are keyed by
/// the simple name of their owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SymbolTableRepr", into = "SymbolTableRepr")]
pub struct SymbolTable {
    types: BTreeMap<String, String>,
    functions: BTreeSet<QualifiedName>,
    enum_constants: BTreeSet<QualifiedName>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a type by its package-qualified path (`strand.process.Order`).
    /// A path without a package imports a bare type.
    pub fn add_type(&mut self, qualified: &str) {
        let simple = qualified
            .rsplit_once('.')
            .map_or(qualified, |(_, simple)| simple);
        self.types.insert(simple.to_string(), qualified.to_string());
    }

    /// Import a static function. Also imports its owner type.
    pub fn add_function(&mut self, owner: &str, name: &str) {
        self.import_owner(owner);
        let name = QualifiedName::new(owner, name);
        self.functions
            .insert(QualifiedName::new(name.simple_owner(), name.member()));
    }

    /// Import an enum constant. Also imports its owner type.
    pub fn add_enum_constant(&mut self, owner: &str, constant: &str) {
        self.import_owner(owner);
        let name = QualifiedName::new(owner, constant);
        self.enum_constants
            .insert(QualifiedName::new(name.simple_owner(), name.member()));
    }

    // A bare owner never replaces an already imported package path.
    fn import_owner(&mut self, owner: &str) {
        if owner.contains('.') || !self.types.contains_key(owner) {
            self.add_type(owner);
        }
    }

    #[must_use]
    pub fn with_type(mut self, qualified: &str) -> Self {
        self.add_type(qualified);
        self
    }

    #[must_use]
    pub fn with_function(mut self, owner: &str, name: &str) -> Self {
        self.add_function(owner, name);
        self
    }

    #[must_use]
    pub fn with_enum_constants(mut self, owner: &str, constants: &[&str]) -> Self {
        for constant in constants {
            self.add_enum_constant(owner, constant);
        }
        self
    }

    /// Package-qualified path of an imported type.
    pub fn resolve_type(&self, simple: &str) -> Option<&str> {
        self.types.get(simple).map(String::as_str)
    }

    pub fn has_type(&self, simple: &str) -> bool {
        self.types.contains_key(simple)
    }

    pub fn has_function(&self, owner: &str, name: &str) -> bool {
        self.functions.contains(&QualifiedName::new(owner, name))
    }

    /// Whether `name` is an imported constant. The owner may be given with or
    /// without its package path, as long as the type itself is imported.
    pub fn has_enum_constant(&self, name: &QualifiedName) -> bool {
        let simple = name.simple_owner();
        let owner_matches = match self.resolve_type(simple) {
            Some(qualified) => name.owner() == simple || name.owner() == qualified,
            None => false,
        };
        owner_matches
            && self
                .enum_constants
                .contains(&QualifiedName::new(simple, name.member()))
    }

    /// Owner of a bare constant name, if exactly one imported enum declares it.
    pub fn enum_owner_of(&self, constant: &str) -> Option<&str> {
        let mut owners = self
            .enum_constants
            .iter()
            .filter(|name| name.member() == constant)
            .map(QualifiedName::owner);
        let first = owners.next()?;
        owners.next().is_none().then_some(first)
    }

    /// Simple names of every imported type.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Static functions declared on `owner`.
    pub fn functions_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.functions
            .iter()
            .filter(move |name| name.owner() == owner)
            .map(QualifiedName::member)
    }

    /// Union with another table; entries from `other` win on simple-name
    /// collisions.
    pub fn merge(&mut self, other: &SymbolTable) {
        for (simple, qualified) in &other.types {
            self.types.insert(simple.clone(), qualified.clone());
        }
        self.functions.extend(other.functions.iter().cloned());
        self.enum_constants
            .extend(other.enum_constants.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// The default import universe: traversal enums, predicates and the
/// anonymous traversal type.
pub fn core_imports() -> SymbolTable {
    const PREDICATES: &[&str] = &[
        "eq", "neq", "lt", "lte", "gt", "gte", "inside", "outside", "between", "within",
        "without", "not",
    ];

    let mut table = SymbolTable::new()
        .with_enum_constants("strand.process.traversal.Order", &["asc", "desc", "shuffle"])
        .with_enum_constants("strand.structure.Direction", &["OUT", "IN", "BOTH"])
        .with_enum_constants("strand.structure.T", &["id", "label", "key", "value"])
        .with_enum_constants("strand.process.traversal.Scope", &["global", "local"])
        .with_enum_constants("strand.structure.Column", &["keys", "values"])
        .with_enum_constants("strand.process.traversal.Pop", &["first", "last", "all", "mixed"])
        .with_enum_constants(
            "strand.process.traversal.Operator",
            &["sum", "minus", "mult", "div", "min", "max", "assign", "addAll", "and", "or"],
        )
        .with_enum_constants("strand.structure.Cardinality", &["single", "list", "set"])
        .with_enum_constants("strand.process.traversal.Barrier", &["normSack"])
        .with_enum_constants("strand.process.traversal.Pick", &["any", "none"])
        .with_type("strand.process.traversal.__");
    for predicate in PREDICATES {
        table.add_function("strand.process.traversal.P", predicate);
    }
    table
}

#[derive(Serialize, Deserialize)]
struct SymbolTableRepr {
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    functions: Vec<QualifiedName>,
    #[serde(default)]
    enum_constants: Vec<QualifiedName>,
}

impl From<SymbolTableRepr> for SymbolTable {
    fn from(repr: SymbolTableRepr) -> Self {
        let mut table = SymbolTable::new();
        for qualified in &repr.types {
            table.add_type(qualified);
        }
        for name in &repr.functions {
            table.add_function(name.owner(), name.member());
        }
        for name in &repr.enum_constants {
            table.add_enum_constant(name.owner(), name.member());
        }
        table
    }
}

impl From<SymbolTable> for SymbolTableRepr {
    fn from(table: SymbolTable) -> Self {
        SymbolTableRepr {
            types: table.types.into_values().collect(),
            functions: table.functions.into_iter().collect(),
            enum_constants: table.enum_constants.into_iter().collect(),
        }
    }
}
