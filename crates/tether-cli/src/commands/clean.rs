use std::path::PathBuf;

use super::open_compiler;
use crate::error::CliResult;

pub fn handle_clean(project: Option<PathBuf>) -> CliResult<()> {
    let compiler = open_compiler(project)?;
    let removed = compiler.clean()?;
    if removed.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }
    for path in &removed {
        let shown = path.strip_prefix(compiler.project().root()).unwrap_or(path);
        println!("   removed {}", shown.display());
    }
    Ok(())
}
