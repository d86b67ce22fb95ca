//! Dependency fetcher boundary.
//!
//! Resolving artifact coordinates into plugins is the embedder's business;
//! the engine only sees [`DependencyFetcher`]. A plugin contributes imports,
//! native static-function handlers for imported types, and init scripts.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use strand_ir::SymbolTable;
use strand_runtime::HostObject;

/// `group:name:version` coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Artifact {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Artifact {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Artifact {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for Artifact {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Artifact::new(*group, *name, *version))
            }
            _ => Err(FetchError::InvalidCoordinates(s.to_string())),
        }
    }
}

/// What a fetched artifact contributes to an engine.
#[derive(Clone, Default)]
pub struct PluginDescriptor {
    pub name: String,
    pub imports: SymbolTable,
    /// Static-function handlers keyed by the simple type name they serve.
    pub natives: Vec<(String, Arc<dyn HostObject>)>,
    pub init_scripts: Vec<String>,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        PluginDescriptor {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_imports(mut self, imports: SymbolTable) -> Self {
        self.imports.merge(&imports);
        self
    }

    #[must_use]
    pub fn with_native(mut self, type_name: impl Into<String>, handler: Arc<dyn HostObject>) -> Self {
        self.natives.push((type_name.into(), handler));
        self
    }

    #[must_use]
    pub fn with_init_script(mut self, script: impl Into<String>) -> Self {
        self.init_scripts.push(script.into());
        self
    }
}

impl fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let natives: Vec<&str> = self.natives.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("PluginDescriptor")
            .field("name", &self.name)
            .field("imports", &self.imports)
            .field("natives", &natives)
            .field("init_scripts", &self.init_scripts.len())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("no dependency fetcher is configured")]
    NoFetcher,
    #[error("invalid artifact coordinates '{0}' (expected group:name:version)")]
    InvalidCoordinates(String),
    #[error("cannot fetch {artifact}: {message}")]
    Unavailable { artifact: Artifact, message: String },
}

/// Resolves artifact coordinates into plugins.
pub trait DependencyFetcher: Send + Sync {
    fn fetch(&self, artifact: &Artifact) -> Result<Vec<PluginDescriptor>, FetchError>;
}

/// In-memory fetcher backed by a fixed registry.
#[derive(Default)]
pub struct StaticFetcher {
    registry: RwLock<HashMap<Artifact, Vec<PluginDescriptor>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, artifact: Artifact, plugins: Vec<PluginDescriptor>) {
        self.registry.write().insert(artifact, plugins);
    }

    #[must_use]
    pub fn with(self, artifact: Artifact, plugins: Vec<PluginDescriptor>) -> Self {
        self.publish(artifact, plugins);
        self
    }
}

impl DependencyFetcher for StaticFetcher {
    fn fetch(&self, artifact: &Artifact) -> Result<Vec<PluginDescriptor>, FetchError> {
        self.registry
            .read()
            .get(artifact)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable {
                artifact: artifact.clone(),
                message: "not published".to_string(),
            })
    }
}

impl fmt::Debug for StaticFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut artifacts: Vec<String> =
            self.registry.read().keys().map(ToString::to_string).collect();
        artifacts.sort();
        f.debug_struct("StaticFetcher")
            .field("artifacts", &artifacts)
            .finish()
    }
}
