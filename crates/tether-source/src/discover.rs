use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SourceError, SourceResult};
use crate::file::SourceFile;

/// File extensions recognised as schema files.
pub const SCHEMA_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

/// Recursively collect every schema file under `source_root` whose file name
/// starts with `prefix`. Results are sorted by path.
///
/// `project_root` is used to compute the display name of each file.
pub fn discover_schemas(project_root: &Path, source_root: &Path, prefix: &str) -> SourceResult<Vec<SourceFile>> {
    if !source_root.is_dir() {
        return Err(SourceError::SourceRootMissing(source_root.to_path_buf()));
    }

    let mut paths = Vec::new();
    walk(source_root, prefix, &mut paths)?;
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = fs::read_to_string(&path).map_err(|err| SourceError::io(&path, "reading", err))?;
        let name = display_name(project_root, &path);
        log::debug!("Discovered schema file {name}");
        files.push(SourceFile::new(path, name, contents));
    }
    Ok(files)
}

/// Whether a file name marks a schema file.
pub fn is_schema_file(file_name: &str, prefix: &str) -> bool {
    if !file_name.starts_with(prefix) || file_name.ends_with(".d.ts") {
        return false;
    }
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCHEMA_EXTENSIONS.iter().any(|e| *e == ext))
}

fn walk(dir: &Path, prefix: &str, out: &mut Vec<PathBuf>) -> SourceResult<()> {
    let entries = fs::read_dir(dir).map_err(|err| SourceError::io(dir, "scanning", err))?;
    for entry in entries {
        let entry = entry.map_err(|err| SourceError::io(dir, "scanning", err))?;
        let path = entry.path();
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            log::warn!("Skipping non UTF-8 path {}", path.display());
            continue;
        };
        let file_type = entry.file_type().map_err(|err| SourceError::io(&path, "inspecting", err))?;

        if file_type.is_dir() {
            if file_name.starts_with('.') || SKIPPED_DIRS.iter().any(|d| *d == file_name) {
                continue;
            }
            walk(&path, prefix, out)?;
        } else if file_type.is_file() && is_schema_file(file_name, prefix) {
            out.push(path);
        }
    }
    Ok(())
}

fn display_name(project_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(project_root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// schema").unwrap();
    }

    #[test]
    fn test_is_schema_file() {
        assert!(is_schema_file("NativeCalculator.ts", "Native"));
        assert!(is_schema_file("NativeCalculator.tsx", "Native"));
        assert!(!is_schema_file("Calculator.ts", "Native"));
        assert!(!is_schema_file("NativeCalculator.js", "Native"));
        assert!(!is_schema_file("NativeCalculator.d.ts", "Native"));
    }

    #[test]
    fn test_discovery_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/NativeZeta.ts");
        touch(root, "src/nested/deeper/NativeAlpha.ts");
        touch(root, "src/nested/helpers.ts");
        touch(root, "src/node_modules/pkg/NativeIgnored.ts");
        touch(root, "src/.cache/NativeHidden.ts");

        let files = discover_schemas(root, &root.join("src"), "Native").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["src/NativeZeta.ts", "src/nested/deeper/NativeAlpha.ts"]);
        assert_eq!(files[0].contents(), "// schema");
    }

    #[test]
    fn test_missing_source_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_schemas(dir.path(), &dir.path().join("missing"), "Native").unwrap_err();
        assert!(matches!(err, SourceError::SourceRootMissing(_)));
    }
}
