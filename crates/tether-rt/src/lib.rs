//! Runtime bridge for modules produced by the tether interface compiler.
//!
//! Generated glue registers each module type with a [`Bridge`]. The host
//! acquires a [`ModuleHandle`] by name and talks to the instance through
//! [`HostValue`]s:
//!
//! - synchronous methods run on the calling thread and return directly;
//! - asynchronous methods decode their arguments immediately, run on the
//!   bridge's worker pool and settle on the host's [`Scheduler`];
//! - notifications fan out to subscribed [`Listener`]s, again on the
//!   scheduler.
//!
//! Faults raised with [`throw!`] never cross the boundary as panics.

pub mod bridge;
pub mod decl;
pub mod dispatch;
pub mod error;
pub mod fault;
pub mod instance;
pub mod marshal;
pub mod module;
pub mod notify;
pub mod value;

pub use bridge::{global, install_global, Bridge, BridgeBuilder, ModuleHandle};
pub use decl::{EnumDecl, EnumValues, FieldDecl, MethodDecl, ModuleDecl, NotificationDecl, ParamDecl, RecordDecl, TypeDecl};
pub use dispatch::{CallId, CallState, EventLoop, Scheduler, Settlement, Task};
pub use error::{BridgeError, BridgeResult, MarshalError};
pub use fault::{catch_fault, promise, Fault, Promise, Rejection};
pub use instance::InstanceId;
pub use marshal::{integral, Args, Fields, FromHost, IntoHost};
pub use module::{BridgedModule, Context, Convention, DeferredCall, MethodEntry, NotificationEntry};
pub use notify::{Disposer, Listener, Payload, PayloadKind};
pub use value::{ArrayBuffer, HostValue, Nullable};
