//! Project handling for the tether interface compiler.
//!
//! This crate knows where things live: it reads `tether.toml`, finds the
//! project root, and discovers schema files under the configured source root.
//! It does not look inside the files.

pub mod config;
pub mod discover;
pub mod error;
pub mod file;
pub mod project;

pub use config::{find_project_root, CodegenSettings, ProjectInfo, TetherConfig, CONFIG_FILE_NAME};
pub use discover::{discover_schemas, is_schema_file};
pub use error::{SourceError, SourceResult};
pub use file::SourceFile;
pub use project::{Project, STATE_DIR};
