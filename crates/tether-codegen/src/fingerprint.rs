//! Content fingerprints of the resolved model, used to detect bindings that
//! are older than their schema.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tether_resolve::{ProjectModel, ResolvedModule};

use crate::error::{CodegenError, CodegenResult};

/// File name inside the project's state directory.
pub const FINGERPRINT_FILE: &str = "fingerprint.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fingerprint {
    /// Hash over every module's fingerprint.
    pub project: String,
    /// Module name to hex SHA-256 of its resolved form.
    pub modules: BTreeMap<String, String>,
}

impl Fingerprint {
    pub fn of(model: &ProjectModel) -> CodegenResult<Self> {
        let mut modules = BTreeMap::new();
        for module in &model.modules {
            modules.insert(module.name.source.clone(), module_hash(module)?);
        }

        let mut hasher = Sha256::new();
        for (name, hash) in &modules {
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(hash.as_bytes());
            hasher.update(b"\n");
        }
        Ok(Fingerprint { project: hex::encode(hasher.finalize()), modules })
    }

    /// Read a fingerprint file, or `None` when it does not exist.
    pub fn load(path: &Path) -> CodegenResult<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let text =
            fs::read_to_string(path).map_err(|source| CodegenError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&text)
            .map(Some)
            .map_err(|e| CodegenError::Fingerprint { path: path.to_path_buf(), message: e.message().to_string() })
    }

    pub fn to_toml(&self) -> CodegenResult<String> {
        let body = toml::to_string(self).map_err(|e| CodegenError::Fingerprint {
            path: FINGERPRINT_FILE.into(),
            message: e.to_string(),
        })?;
        Ok(format!("# @generated by tether. Do not edit.\n{body}"))
    }

    /// Everything that differs between this stored fingerprint and
    /// `current`, ordered by module name.
    pub fn drift(&self, current: &Fingerprint) -> Vec<Drift> {
        let mut drift = Vec::new();
        for (name, hash) in &current.modules {
            match self.modules.get(name) {
                None => drift.push(Drift::Added(name.clone())),
                Some(stored) if stored != hash => drift.push(Drift::Changed(name.clone())),
                Some(_) => {}
            }
        }
        for name in self.modules.keys() {
            if !current.modules.contains_key(name) {
                drift.push(Drift::Removed(name.clone()));
            }
        }
        drift.sort_by(|a, b| a.module().cmp(b.module()));
        drift
    }
}

fn module_hash(module: &ResolvedModule) -> CodegenResult<String> {
    let json = serde_json::to_vec(module)?;
    Ok(hex::encode(Sha256::digest(&json)))
}

/// One way the schema moved on since bindings were generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    Changed(String),
    Added(String),
    Removed(String),
}

impl Drift {
    pub fn module(&self) -> &str {
        match self {
            Drift::Changed(name) | Drift::Added(name) | Drift::Removed(name) => name,
        }
    }
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drift::Changed(name) => write!(f, "module `{name}` changed since bindings were generated"),
            Drift::Added(name) => write!(f, "module `{name}` has no generated bindings"),
            Drift::Removed(name) => write!(f, "module `{name}` was removed but its bindings remain"),
        }
    }
}
