use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tether_codegen::generators::required_mods;
use tether_codegen::{emit, write_artifacts, Drift, Fingerprint, WriteOutcome, WriteReport, FINGERPRINT_FILE};
use tether_resolve::{resolve, ProjectModel};
use tether_source::{find_project_root, Project, SourceFile, STATE_DIR};
use tether_syntax::{parse_files, ModuleSpec};

use crate::error::{DriverError, DriverResult};

/// Files `clean` removes from the implementation crate's `src/`.
const GENERATED_FILES: &[&str] = &["generated.rs", "bridging.rs", "host.rs"];

/// Outcome of one `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub files: Vec<WriteReport>,
    pub fingerprint: Fingerprint,
    /// Modules a preserved `lib.rs` does not declare.
    pub missing_mods: Vec<String>,
}

impl GenerateReport {
    pub fn written(&self) -> usize {
        self.files.iter().filter(|f| f.outcome == WriteOutcome::Written).count()
    }
}

/// How the bindings on disk relate to the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale(Vec<Drift>),
    NeverGenerated,
}

/// Drives a project through discovery, parsing, resolution and emission.
#[derive(Debug, Clone)]
pub struct Compiler {
    project: Project,
}

impl Compiler {
    pub fn new(project: Project) -> Self {
        Compiler { project }
    }

    /// Open the project containing `start`, searching upwards for `tether.toml`.
    pub fn open(start: &Path) -> DriverResult<Self> {
        let root = find_project_root(start)?;
        Ok(Compiler::new(Project::load(root)?))
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn discover(&self) -> DriverResult<Vec<SourceFile>> {
        let files = self.project.discover()?;
        if files.is_empty() {
            warn!(
                "No schema files starting with `{}` under {}",
                self.project.config().codegen.schema_prefix,
                self.project.source_root().display()
            );
        }
        Ok(files)
    }

    pub fn parse(&self) -> DriverResult<Vec<ModuleSpec>> {
        let files = self.discover()?;
        Ok(parse_files(&files)?)
    }

    pub fn resolve(&self) -> DriverResult<ProjectModel> {
        let modules = self.parse()?;
        let model = resolve(&modules)?;
        info!("Resolved {} module(s)", model.modules.len());
        Ok(model)
    }

    /// Run the whole pipeline and write every artifact.
    pub fn generate(&self) -> DriverResult<GenerateReport> {
        let model = self.resolve()?;
        let fingerprint = Fingerprint::of(&model)?;
        let artifacts = emit(&model, &self.project.config().codegen.crate_dir, Path::new(STATE_DIR))?;
        let files = write_artifacts(self.project.root(), &artifacts)?;

        let missing_mods = self.missing_mods(&model)?;
        for name in &missing_mods {
            warn!("src/lib.rs does not declare `mod {name};`");
        }
        let report = GenerateReport { files, fingerprint, missing_mods };
        info!("Generated bindings ({} file(s) written)", report.written());
        Ok(report)
    }

    fn missing_mods(&self, model: &ProjectModel) -> DriverResult<Vec<String>> {
        let path = self.project.crate_dir().join("src").join("lib.rs");
        let text = fs::read_to_string(&path)
            .map_err(|source| tether_codegen::CodegenError::Read { path: path.clone(), source })?;
        Ok(required_mods(&model.modules).into_iter().filter(|name| !declares_mod(&text, name)).collect())
    }

    fn fingerprint_path(&self) -> PathBuf {
        self.project.state_dir().join(FINGERPRINT_FILE)
    }

    /// Compare the schema on disk with the one the bindings were generated from.
    pub fn freshness(&self) -> DriverResult<Freshness> {
        let Some(stored) = Fingerprint::load(&self.fingerprint_path())? else {
            return Ok(Freshness::NeverGenerated);
        };
        let current = Fingerprint::of(&self.resolve()?)?;
        let drift = stored.drift(&current);
        if drift.is_empty() {
            Ok(Freshness::Fresh)
        } else {
            Ok(Freshness::Stale(drift))
        }
    }

    /// Fail unless the bindings match the schema. Run before every native build.
    pub fn check_drift(&self) -> DriverResult<()> {
        match self.freshness()? {
            Freshness::Fresh => {
                debug!("Bindings match the schema");
                Ok(())
            }
            Freshness::Stale(drift) => Err(DriverError::Drift(drift)),
            Freshness::NeverGenerated => Err(DriverError::NeverGenerated),
        }
    }

    /// Remove generated files, tether's state and the implementation crate's
    /// build output. Skeletons and `lib.rs` stay.
    pub fn clean(&self) -> DriverResult<Vec<PathBuf>> {
        let src = self.project.crate_dir().join("src");
        let mut targets: Vec<PathBuf> = GENERATED_FILES.iter().map(|f| src.join(f)).collect();
        targets.push(self.project.state_dir());
        targets.push(self.project.crate_dir().join("target"));

        let mut removed = Vec::new();
        for path in targets {
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    debug!("Removed {}", path.display());
                    removed.push(path);
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(DriverError::Remove { path, source }),
            }
        }
        Ok(removed)
    }
}

/// Whether a crate root declares `mod name;`, public or not.
fn declares_mod(text: &str, name: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim();
        let line = line.strip_prefix("pub(crate) ").or_else(|| line.strip_prefix("pub ")).unwrap_or(line);
        line.strip_prefix("mod ")
            .and_then(|rest| rest.strip_suffix(';'))
            .is_some_and(|declared| declared.trim() == name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_mod() {
        let text = "pub mod generated;\nmod host;\npub(crate) mod bridging;\n// mod calc_impl;\n";
        assert!(declares_mod(text, "generated"));
        assert!(declares_mod(text, "host"));
        assert!(declares_mod(text, "bridging"));
        assert!(!declares_mod(text, "calc_impl"));
        assert!(!declares_mod(text, "gen"));
    }
}
