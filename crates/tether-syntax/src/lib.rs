//! Schema model and parser for the tether interface compiler.
//!
//! A schema file is a TypeScript declaration file that describes one or more
//! native modules:
//!
//! ```ts
//! import type { NativeModule, Signal } from 'tether-modules';
//! import { NativeModuleRegistry } from 'tether-modules';
//!
//! export interface Point { x: number; y: number }
//!
//! export interface Spec extends NativeModule {
//!   distance(a: Point, b: Point): number;
//!   load(path: string): Promise<Point[]>;
//!   onMoved: Signal<Point>;
//! }
//!
//! export default NativeModuleRegistry.getEnforcing<Spec>('Geometry');
//! ```
//!
//! Parsing goes source text → tokens ([`lexer`]) → syntax tree ([`ast`],
//! [`parser`]) → [`schema::ModuleSpec`] ([`lower`]). Problems from every
//! stage are collected into one [`SchemaErrors`].

pub mod ast;
pub mod error;
pub mod lexer;
pub mod lower;
pub mod parser;
pub mod schema;

use miette::NamedSource;
use tether_source::SourceFile;

pub use error::{LineIndex, SchemaErrors, SyntaxError, SyntaxErrorKind, SyntaxResult};
pub use lower::MODULE_PACKAGE;
pub use schema::*;

/// Parse one file, returning whatever modules could be built alongside every
/// problem found. Errors are ordered by position.
pub fn parse_source(file: &SourceFile) -> (Vec<ModuleSpec>, Vec<SyntaxError>) {
    let text = file.contents();
    let (tokens, mut raw) = lexer::lex(text);
    let mut parser = parser::Parser::new(&tokens, text.len());
    let ast = parser.parse_file();
    raw.extend(parser.into_errors());

    let (modules, lower_errors) = lower::lower(file.name(), text, &ast, !raw.is_empty());
    raw.extend(lower_errors);

    // An alias used in several places reports its problems once.
    let mut seen = fxhash::FxHashSet::default();
    raw.retain(|(kind, span)| seen.insert((span.offset(), span.len(), kind.clone())));
    raw.sort_by_key(|(_, span)| span.offset());

    let index = LineIndex::new(text);
    let errors = raw
        .into_iter()
        .map(|(kind, span)| {
            let (line, column) = index.line_col(text, span.offset());
            let location = Location {
                file: file.name().to_string(),
                line,
                column,
            };
            SyntaxError::new(kind, location, NamedSource::new(file.name(), text.to_string()), span)
        })
        .collect();

    log::debug!("Parsed {} module(s) from {}", modules.len(), file.name());
    (modules, errors)
}

/// Parse a single schema file.
pub fn parse_file(file: &SourceFile) -> SyntaxResult<Vec<ModuleSpec>> {
    parse_files(std::slice::from_ref(file))
}

/// Parse every file, failing with all problems from all files if any file has one.
pub fn parse_files(files: &[SourceFile]) -> SyntaxResult<Vec<ModuleSpec>> {
    let mut modules = Vec::new();
    let mut errors = Vec::new();
    for file in files {
        let (file_modules, file_errors) = parse_source(file);
        if file_modules.is_empty() && file_errors.is_empty() {
            log::warn!("{} declares no module", file.name());
        }
        modules.extend(file_modules);
        errors.extend(file_errors);
    }
    if errors.is_empty() {
        Ok(modules)
    } else {
        Err(SchemaErrors { errors })
    }
}
