use miette::Diagnostic;
use thiserror::Error;
use tether_syntax::Location;

/// Problems found while mapping a parsed schema onto generated Rust.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Two different source names normalize to the same identifier.
    #[error("{location}: `{first}` and `{second}` both become `{canonical}` in {scope}")]
    #[diagnostic(
        code(tether_resolve::name_collision),
        help("generated identifiers ignore casing; rename one of them")
    )]
    NameCollision {
        scope: String,
        first: String,
        second: String,
        canonical: String,
        location: Location,
    },

    #[error("{location}: `{name}` is declared more than once in {scope}")]
    #[diagnostic(code(tether_resolve::duplicate_name))]
    DuplicateName {
        scope: String,
        name: String,
        location: Location,
    },

    /// The name would clash with an item the generator or the runtime defines.
    #[error("{location}: `{name}` is reserved in {scope}")]
    #[diagnostic(code(tether_resolve::reserved_name), help("{reason}"))]
    ReservedName {
        scope: String,
        name: String,
        reason: String,
        location: Location,
    },

    #[error("{location}: `{name}` does not produce a usable identifier")]
    #[diagnostic(
        code(tether_resolve::invalid_identifier),
        help("names need at least one letter, and must not start with a digit")
    )]
    InvalidIdentifier { name: String, location: Location },

    /// Records that contain each other have no finite representation.
    #[error("{location}: records contain each other: {}", .cycle.join(" -> "))]
    #[diagnostic(
        code(tether_resolve::record_cycle),
        help("neither arrays nor nullable fields break a containment cycle")
    )]
    RecordCycle { cycle: Vec<String>, location: Location },

    /// Two modules declare different types under the same name.
    #[error("{location}: type `{name}` in module `{module}` differs from the `{name}` of module `{other}`")]
    #[diagnostic(
        code(tether_resolve::type_conflict),
        help("generated types share one namespace; give one of them another name")
    )]
    TypeConflict {
        name: String,
        module: String,
        other: String,
        location: Location,
    },

    #[error("{location}: module `{name}` is already registered at {previous}")]
    #[diagnostic(code(tether_resolve::duplicate_module))]
    DuplicateModule {
        name: String,
        previous: Location,
        location: Location,
    },

    #[error("{location}: `{name}` is not a record or enum of module `{module}`")]
    #[diagnostic(code(tether_resolve::unknown_type))]
    UnknownType {
        name: String,
        module: String,
        location: Location,
    },

    #[error("{location}: a `Signal` can only declare a module notification")]
    #[diagnostic(code(tether_resolve::misplaced_notification))]
    MisplacedNotification { location: Location },
}

impl ResolveError {
    pub fn location(&self) -> &Location {
        match self {
            ResolveError::NameCollision { location, .. }
            | ResolveError::DuplicateName { location, .. }
            | ResolveError::ReservedName { location, .. }
            | ResolveError::InvalidIdentifier { location, .. }
            | ResolveError::RecordCycle { location, .. }
            | ResolveError::TypeConflict { location, .. }
            | ResolveError::DuplicateModule { location, .. }
            | ResolveError::UnknownType { location, .. }
            | ResolveError::MisplacedNotification { location } => location,
        }
    }
}

/// All problems from one resolution pass.
#[derive(Debug, Error, Diagnostic)]
#[error("schema resolution failed with {} error(s)", .errors.len())]
#[diagnostic(code(tether_resolve::schema))]
pub struct ResolveErrors {
    #[related]
    pub errors: Vec<ResolveError>,
}

pub type ResolveResult<T> = std::result::Result<T, ResolveErrors>;
