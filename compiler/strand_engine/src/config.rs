//! Engine configuration.
//!
//! Loaded from JSON or built in code. Unknown keys are rejected so a typo in
//! a configuration file fails loudly instead of silently using a default.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strand_ir::SymbolTable;
use strand_runtime::DEFAULT_MAX_CALL_DEPTH;

use crate::cache::{RetentionPolicy, DEFAULT_SOFT_CAPACITY};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Promote top-level locals into session bindings after each evaluation.
    pub interpreter_mode: bool,
    /// Retention for evaluations that do not ask for one.
    pub default_retention: RetentionPolicy,
    /// Bound on soft cache entries.
    pub soft_capacity: usize,
    /// Imports merged over the core import universe.
    pub imports: SymbolTable,
    /// Scripts evaluated at construction and after every reset.
    pub init_scripts: Vec<String>,
    /// Script files evaluated after `init_scripts`.
    pub init_script_files: Vec<PathBuf>,
    pub max_call_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            interpreter_mode: false,
            default_retention: RetentionPolicy::default(),
            soft_capacity: DEFAULT_SOFT_CAPACITY,
            imports: SymbolTable::new(),
            init_scripts: Vec::new(),
            init_script_files: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_interpreter_mode(mut self, enabled: bool) -> Self {
        self.interpreter_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_default_retention(mut self, policy: RetentionPolicy) -> Self {
        self.default_retention = policy;
        self
    }

    #[must_use]
    pub fn with_soft_capacity(mut self, capacity: usize) -> Self {
        self.soft_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_imports(mut self, imports: SymbolTable) -> Self {
        self.imports.merge(&imports);
        self
    }

    #[must_use]
    pub fn with_init_script(mut self, script: impl Into<String>) -> Self {
        self.init_scripts.push(script.into());
        self
    }

    #[must_use]
    pub fn with_init_script_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_script_files.push(path.into());
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.soft_capacity == 0 {
            return Err(ConfigError::Invalid(
                "soft_capacity must be greater than zero".to_string(),
            ));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Every init script in evaluation order: inline scripts first, then
    /// the contents of each file.
    pub fn load_init_scripts(&self) -> Result<Vec<String>, ConfigError> {
        let mut scripts = self.init_scripts.clone();
        for path in &self.init_script_files {
            scripts.push(read_script(path)?);
        }
        Ok(scripts)
    }
}

fn read_script(path: &Path) -> Result<String, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests;
