use std::fmt::Write;
use std::path::PathBuf;

use tether_resolve::{ProjectModel, ResolvedModule};

use super::open_compiler;
use crate::error::CliResult;

pub fn handle_show(project: Option<PathBuf>, json: bool) -> CliResult<()> {
    let model = open_compiler(project)?.resolve()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&model)?);
    } else {
        print!("{}", render_tree(&model));
    }
    Ok(())
}

fn render_tree(model: &ProjectModel) -> String {
    let total = model.modules.len();
    let mut out = String::new();
    for (i, module) in model.modules.iter().enumerate() {
        let _ = writeln!(out, "{} ({}/{total})", module.name.source, i + 1);
        render_module(&mut out, module);
        out.push('\n');
    }
    out
}

fn render_module(out: &mut String, module: &ResolvedModule) {
    if !module.methods.is_empty() {
        out.push_str("  methods\n");
    }
    for method in &module.methods {
        let params: Vec<String> =
            method.params.iter().map(|p| format!("{}: {}", p.name.source, p.ty)).collect();
        let _ = write!(out, "    {}({}) -> {}", method.name.source, params.join(", "), method.returns);
        out.push_str(if method.is_async { "  [async]\n" } else { "\n" });
    }

    if !module.notifications.is_empty() {
        out.push_str("  notifications\n");
    }
    for notification in &module.notifications {
        match &notification.payload {
            Some(ty) => {
                let _ = writeln!(out, "    {}: {ty} ({:?})", notification.name.source, notification.channel);
            }
            None => {
                let _ = writeln!(out, "    {}", notification.name.source);
            }
        }
    }

    if !module.records.is_empty() {
        out.push_str("  records\n");
    }
    for record in &module.records {
        let fields: Vec<String> =
            record.fields.iter().map(|f| format!("{}: {}", f.name.source, f.ty)).collect();
        let _ = writeln!(out, "    {} {{ {} }}", record.name.source, fields.join(", "));
    }

    if !module.enums.is_empty() {
        out.push_str("  enums\n");
    }
    for enum_ in &module.enums {
        let values: Vec<String> =
            enum_.variants.iter().map(|v| format!("{} = {}", v.name.source, v.value)).collect();
        let _ = writeln!(out, "    {} {{ {} }}", enum_.name.source, values.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tether.toml"), "[project]\nname = \"files\"\n").unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(
            dir.path().join("src/NativeFiles.ts"),
            "import type { NativeModule, Signal } from 'tether-modules';
import { NativeModuleRegistry } from 'tether-modules';

export interface Entry { path: string; size: number }
export enum Kind { File = 'file', Dir = 'dir' }

export interface Spec extends NativeModule {
  stat(path: string, kind: Kind): Entry | null;
  list(dir: string): Promise<Entry[]>;
  onReset: Signal;
}

export default NativeModuleRegistry.getEnforcing<Spec>('Files');
",
        )
        .unwrap();

        let model = tether_driver::Compiler::open(dir.path()).unwrap().resolve().unwrap();
        let tree = render_tree(&model);
        assert_eq!(
            tree,
            "Files (1/1)
  methods
    stat(path: String, kind: Kind) -> tether_rt::Nullable<Entry>
    list(dir: String) -> tether_rt::Promise<Vec<Entry>>  [async]
  notifications
    onReset
  records
    Entry { path: String, size: f64 }
  enums
    Kind { File = \"file\", Dir = \"dir\" }

"
        );
    }
}
