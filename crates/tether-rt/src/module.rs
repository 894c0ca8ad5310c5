use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use log::warn;
use parking_lot::Mutex;

use crate::bridge::BridgeInner;
use crate::decl::ModuleDecl;
use crate::dispatch::Work;
use crate::error::{BridgeError, BridgeResult, MarshalError};
use crate::fault::{catch_fault, Promise};
use crate::instance::InstanceId;
use crate::notify::{Payload, PayloadKind};
use crate::value::HostValue;

/// What a module instance gets at construction.
#[derive(Clone, Debug)]
pub struct Context {
    instance: InstanceId,
    module: &'static str,
    data_path: Option<PathBuf>,
    bridge: Weak<BridgeInner>,
}

impl Context {
    pub(crate) fn new(
        instance: InstanceId,
        module: &'static str,
        data_path: Option<PathBuf>,
        bridge: Weak<BridgeInner>,
    ) -> Self {
        Context { instance, module, data_path, bridge }
    }

    /// A context attached to no bridge. Emitting through it is a no-op.
    pub fn detached(module: &'static str) -> Self {
        let id = crate::instance::InstanceTable::<()>::new().reserve();
        Context { instance: id, module, data_path: None, bridge: Weak::new() }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    pub fn module_name(&self) -> &'static str {
        self.module
    }

    /// Per-application writable directory, when the host configured one.
    pub fn data_path(&self) -> Option<&Path> {
        self.data_path.as_deref()
    }

    /// Emit a notification to this instance's listeners, returning how
    /// many were invoked.
    pub fn try_emit(&self, name: &str, payload: Payload) -> BridgeResult<usize> {
        match self.bridge.upgrade() {
            Some(bridge) => bridge.emit(self.instance, name, payload),
            None => Ok(0),
        }
    }

    /// Like [`try_emit`](Self::try_emit), logging failures instead of
    /// returning them.
    pub fn emit(&self, name: &str, payload: Payload) {
        if let Err(e) = self.try_emit(name, payload) {
            warn!("{}: failed to emit `{name}`: {e}", self.module);
        }
    }
}

/// Deferred body of an asynchronous call, with its arguments already
/// decoded.
pub type DeferredCall<M> = Box<dyn FnOnce(&mut M) -> Promise<HostValue> + Send>;

pub type SyncGlue<M> = fn(&mut M, Vec<HostValue>) -> Result<HostValue, MarshalError>;
pub type AsyncGlue<M> = fn(Vec<HostValue>) -> Result<DeferredCall<M>, MarshalError>;

/// How a method is invoked.
pub enum Convention<M> {
    /// Runs on the calling thread and returns its value directly.
    Sync(SyncGlue<M>),
    /// Decodes on the calling thread, runs on a worker.
    Async(AsyncGlue<M>),
}

/// One row of a module's method table.
pub struct MethodEntry<M> {
    pub name: &'static str,
    pub convention: Convention<M>,
}

/// One row of a module's notification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationEntry {
    pub name: &'static str,
    pub kind: PayloadKind,
}

/// A module type the bridge can instantiate and call.
pub trait BridgedModule: Sized + Send + 'static {
    const NAME: &'static str;

    fn create(ctx: Context) -> Self;

    fn methods() -> &'static [MethodEntry<Self>];

    fn notifications() -> &'static [NotificationEntry];

    fn declaration() -> &'static ModuleDecl;
}

/// Type-erased view of a live instance.
pub(crate) trait InstanceObject: Send + Sync {
    fn module_name(&self) -> &'static str;

    fn call(&self, method: &str, args: Vec<HostValue>) -> BridgeResult<HostValue>;

    fn prepare_async(self: Arc<Self>, method: &str, args: Vec<HostValue>) -> BridgeResult<Work>;

    fn notification(&self, name: &str) -> Option<PayloadKind>;

    fn declaration(&self) -> &'static ModuleDecl;
}

pub(crate) struct Instance<M> {
    state: Mutex<M>,
}

impl<M: BridgedModule> Instance<M> {
    pub(crate) fn new(module: M) -> Self {
        Instance { state: Mutex::new(module) }
    }

    fn entry(&self, method: &str) -> BridgeResult<&'static MethodEntry<M>> {
        M::methods().iter().find(|m| m.name == method).ok_or_else(|| BridgeError::UnknownMethod {
            module: M::NAME,
            method: method.to_string(),
        })
    }
}

impl<M: BridgedModule> InstanceObject for Instance<M> {
    fn module_name(&self) -> &'static str {
        M::NAME
    }

    fn call(&self, method: &str, args: Vec<HostValue>) -> BridgeResult<HostValue> {
        let glue = match self.entry(method)?.convention {
            Convention::Sync(glue) => glue,
            Convention::Async(_) => {
                return Err(BridgeError::WrongConvention { method: method.to_string(), is_async: true })
            }
        };
        let mut state = self.state.lock();
        match catch_fault(|| glue(&mut *state, args)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(BridgeError::Marshal { method: method.to_string(), source }),
            Err(message) => Err(BridgeError::Exception { method: method.to_string(), message }),
        }
    }

    fn prepare_async(self: Arc<Self>, method: &str, args: Vec<HostValue>) -> BridgeResult<Work> {
        let glue = match self.entry(method)?.convention {
            Convention::Async(glue) => glue,
            Convention::Sync(_) => {
                return Err(BridgeError::WrongConvention { method: method.to_string(), is_async: false })
            }
        };
        let deferred = match catch_fault(|| glue(args)) {
            Ok(Ok(deferred)) => deferred,
            Ok(Err(source)) => return Err(BridgeError::Marshal { method: method.to_string(), source }),
            Err(message) => return Err(BridgeError::Exception { method: method.to_string(), message }),
        };
        Ok(Box::new(move || {
            let mut state = self.state.lock();
            deferred(&mut *state)
        }))
    }

    fn notification(&self, name: &str) -> Option<PayloadKind> {
        M::notifications().iter().find(|n| n.name == name).map(|n| n.kind)
    }

    fn declaration(&self) -> &'static ModuleDecl {
        M::declaration()
    }
}
