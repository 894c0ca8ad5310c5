use std::path::{Path, PathBuf};

use crate::config::TetherConfig;
use crate::discover::discover_schemas;
use crate::error::SourceResult;
use crate::file::SourceFile;

/// Directory, relative to the project root, holding tether's own state.
pub const STATE_DIR: &str = ".tether";

/// A project root together with its configuration.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: TetherConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: TetherConfig) -> Self {
        Self { root: root.into(), config }
    }

    /// Load `tether.toml` from `root`.
    pub fn load(root: impl Into<PathBuf>) -> SourceResult<Self> {
        let root = root.into();
        let config = TetherConfig::load(&root)?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.project.name
    }

    pub fn source_root(&self) -> PathBuf {
        self.root.join(&self.config.project.source_dir)
    }

    /// Root of the implementation crate generated code is written into.
    pub fn crate_dir(&self) -> PathBuf {
        self.root.join(&self.config.codegen.crate_dir)
    }

    /// The runtime crate the implementation crate builds against, if pinned.
    pub fn runtime_dir(&self) -> Option<PathBuf> {
        self.config.codegen.runtime.as_ref().map(|dir| self.root.join(dir))
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Scan the source root for schema files.
    pub fn discover(&self) -> SourceResult<Vec<SourceFile>> {
        discover_schemas(&self.root, &self.source_root(), &self.config.codegen.schema_prefix)
    }
}
