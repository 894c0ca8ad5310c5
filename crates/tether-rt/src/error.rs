use thiserror::Error;

use crate::instance::InstanceId;
use crate::notify::PayloadKind;

/// A host value that could not be converted to or from its declared type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarshalError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("missing argument {index} (`{name}`)")]
    MissingArgument { index: usize, name: &'static str },

    #[error("expected {expected} argument(s), found {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("{value} is not a member of enum {name}")]
    InvalidEnumValue { name: &'static str, value: String },

    #[error("expected an integer, found {0}")]
    NotIntegral(f64),

    #[error("in argument `{name}`: {source}")]
    InArgument { name: &'static str, source: Box<MarshalError> },

    #[error("in field `{name}`: {source}")]
    InField { name: &'static str, source: Box<MarshalError> },

    #[error("at index {index}: {source}")]
    AtIndex { index: usize, source: Box<MarshalError> },
}

impl MarshalError {
    pub fn mismatch(expected: &'static str, found: &crate::HostValue) -> Self {
        MarshalError::TypeMismatch { expected, found: found.kind() }
    }

    pub fn invalid_enum(name: &'static str, value: impl std::fmt::Debug) -> Self {
        MarshalError::InvalidEnumValue { name, value: format!("{value:?}") }
    }

    pub fn in_argument(self, name: &'static str) -> Self {
        MarshalError::InArgument { name, source: Box::new(self) }
    }

    pub fn in_field(self, name: &'static str) -> Self {
        MarshalError::InField { name, source: Box::new(self) }
    }

    pub fn at_index(self, index: usize) -> Self {
        MarshalError::AtIndex { index, source: Box::new(self) }
    }
}

/// Errors surfaced to the host by the bridge.
#[derive(Error, Debug, Clone)]
pub enum BridgeError {
    #[error("invalid arguments for `{method}`: {source}")]
    Marshal { method: String, source: MarshalError },

    #[error("`{method}` threw: {message}")]
    Exception { method: String, message: String },

    #[error("module `{name}` is not registered (registered: {registered})")]
    ModuleNotFound { name: String, registered: String },

    #[error("module instance {0} no longer exists")]
    UnknownInstance(InstanceId),

    #[error("module `{module}` has no method `{method}`")]
    UnknownMethod { module: &'static str, method: String },

    #[error("module `{module}` has no notification `{notification}`")]
    UnknownNotification { module: &'static str, notification: String },

    #[error("notification `{notification}` carries {expected} payloads, not {found}")]
    ChannelMismatch { notification: String, expected: PayloadKind, found: PayloadKind },

    #[error("`{method}` is {}", convention_hint(.is_async))]
    WrongConvention { method: String, is_async: bool },
}

fn convention_hint(is_async: &bool) -> &'static str {
    if *is_async {
        "asynchronous; invoke it with `call_async`"
    } else {
        "synchronous; invoke it with `call`"
    }
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
