use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};

/// Name of the project descriptor looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "tether.toml";

/// Contents of `tether.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Project information
    pub project: ProjectInfo,

    /// Code generation settings
    #[serde(default)]
    pub codegen: CodegenSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfo {
    /// Name of the project
    pub name: String,

    /// Directory scanned recursively for schema files, relative to the project root
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodegenSettings {
    /// Directory of the implementation crate, relative to the project root
    #[serde(default = "default_crate_dir")]
    pub crate_dir: PathBuf,

    /// File-name prefix marking a schema file
    #[serde(default = "default_schema_prefix")]
    pub schema_prefix: String,

    /// Directory of the tether-rt crate the implementation crate depends on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<PathBuf>,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            crate_dir: default_crate_dir(),
            schema_prefix: default_schema_prefix(),
            runtime: None,
        }
    }
}

pub fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

pub fn default_crate_dir() -> PathBuf {
    PathBuf::from("crates/lib")
}

pub fn default_schema_prefix() -> String {
    "Native".to_string()
}

impl TetherConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: ProjectInfo {
                name: name.into(),
                source_dir: default_source_dir(),
            },
            codegen: CodegenSettings::default(),
        }
    }

    /// Parse and validate configuration text. `path` is only used for error reporting.
    pub fn parse(text: &str, path: &Path) -> SourceResult<Self> {
        let config: TetherConfig = toml::from_str(text).map_err(|err| SourceError::ConfigParse {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read `tether.toml` from a project root.
    pub fn load(root: &Path) -> SourceResult<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Err(SourceError::ConfigNotFound(root.to_path_buf()));
        }
        let text = fs::read_to_string(&path).map_err(|source| SourceError::ConfigRead {
            path: path.clone(),
            source,
        })?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::parse(&text, &path)
    }

    pub fn to_toml_string(&self) -> SourceResult<String> {
        toml::to_string(self).map_err(|err| SourceError::InvalidConfig(err.to_string()))
    }

    fn validate(&self) -> SourceResult<()> {
        if self.project.name.trim().is_empty() {
            return Err(SourceError::InvalidConfig("project name must not be empty".into()));
        }
        if self.codegen.schema_prefix.is_empty() {
            return Err(SourceError::InvalidConfig("codegen.schema_prefix must not be empty".into()));
        }
        for (key, dir) in [("project.source_dir", &self.project.source_dir), ("codegen.crate_dir", &self.codegen.crate_dir)] {
            if dir.is_absolute() {
                return Err(SourceError::InvalidConfig(format!(
                    "{key} must be relative to the project root, got {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Finds the project root by searching upwards for `tether.toml`.
pub fn find_project_root(start: &Path) -> SourceResult<PathBuf> {
    let mut current = if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent().map_or_else(|| start.to_path_buf(), Path::to_path_buf)
    };

    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return current
                .canonicalize()
                .map_err(|err| SourceError::io(&current, "canonicalizing", err));
        }
        if !current.pop() {
            return Err(SourceError::ConfigNotFound(start.to_path_buf()));
        }
    }
}
