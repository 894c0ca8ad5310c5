use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use fxhash::FxHashMap;
use log::{debug, error, info, trace, warn};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::decl::ModuleDecl;
use crate::dispatch::{CallId, CallState, Dispatcher, EventLoop, Scheduler, Settlement};
use crate::error::{BridgeError, BridgeResult};
use crate::fault::catch_fault;
use crate::instance::{InstanceId, InstanceTable};
use crate::module::{BridgedModule, Context, Instance, InstanceObject};
use crate::notify::{Disposer, Listener, NotificationRegistry, Payload};
use crate::value::HostValue;

type Factory = fn(Context) -> Arc<dyn InstanceObject>;

fn factory<M: BridgedModule>(ctx: Context) -> Arc<dyn InstanceObject> {
    Arc::new(Instance::new(M::create(ctx)))
}

pub(crate) struct BridgeInner {
    factories: RwLock<FxHashMap<&'static str, Factory>>,
    handles: Mutex<FxHashMap<&'static str, Weak<HandleInner>>>,
    instances: InstanceTable<Arc<dyn InstanceObject>>,
    notifications: Arc<NotificationRegistry>,
    dispatcher: Dispatcher,
    scheduler: Arc<dyn Scheduler>,
    event_loop: Option<Arc<EventLoop>>,
    data_path: Option<PathBuf>,
}

impl BridgeInner {
    pub(crate) fn emit(&self, id: InstanceId, name: &str, payload: Payload) -> BridgeResult<usize> {
        if !self.instances.contains(id) {
            return Err(BridgeError::UnknownInstance(id));
        }
        // Still under construction: nobody can be listening yet.
        let Some(object) = self.instances.get(id) else { return Ok(0) };
        let expected = object.notification(name).ok_or_else(|| BridgeError::UnknownNotification {
            module: object.module_name(),
            notification: name.to_string(),
        })?;
        if expected != payload.kind() {
            return Err(BridgeError::ChannelMismatch {
                notification: name.to_string(),
                expected,
                found: payload.kind(),
            });
        }
        trace!("{id} emits `{name}`");
        Ok(self.notifications.emit(id, name, &payload))
    }

    fn release(&self, id: InstanceId) {
        self.notifications.remove_instance(id);
        if let Some(object) = self.instances.remove(id) {
            debug!("released {} instance {id}", object.module_name());
        }
    }
}

/// Host-side entry point: registers module types and hands out handles
/// to their instances.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    /// Make `M` available under [`BridgedModule::NAME`].
    pub fn register<M: BridgedModule>(&self) -> &Self {
        let previous = self.inner.factories.write().insert(M::NAME, factory::<M>);
        if previous.is_some() {
            warn!("module `{}` registered again; the new registration replaces the old one", M::NAME);
        } else {
            debug!("registered module `{}`", M::NAME);
        }
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.factories.read().contains_key(name)
    }

    /// Registered module names, sorted.
    pub fn registered(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.inner.factories.read().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Handle to the live instance of `name`, creating it on first use.
    /// Returns `None` when no such module is registered.
    pub fn get(&self, name: &str) -> Option<ModuleHandle> {
        match self.acquire(name) {
            Ok(handle) => Some(handle),
            Err(BridgeError::ModuleNotFound { .. }) => None,
            Err(e) => {
                error!("{e}");
                None
            }
        }
    }

    /// Like [`get`](Self::get), failing loudly when the module is missing.
    pub fn get_enforcing(&self, name: &str) -> BridgeResult<ModuleHandle> {
        self.acquire(name)
    }

    fn acquire(&self, name: &str) -> BridgeResult<ModuleHandle> {
        if let Some(inner) = self.inner.handles.lock().get(name).and_then(Weak::upgrade) {
            return Ok(ModuleHandle { inner });
        }

        let found = self.inner.factories.read().get_key_value(name).map(|(k, v)| (*k, *v));
        let Some((module, factory)) = found else {
            return Err(BridgeError::ModuleNotFound { name: name.to_string(), registered: self.registered().join(", ") });
        };

        let id = self.inner.instances.reserve();
        let ctx = Context::new(id, module, self.inner.data_path.clone(), Arc::downgrade(&self.inner));
        let object = match catch_fault(|| factory(ctx)) {
            Ok(object) => object,
            Err(message) => {
                self.inner.instances.remove(id);
                return Err(BridgeError::Exception { method: format!("{module}.new"), message });
            }
        };
        self.inner.instances.fill(id, object.clone());
        info!("created {module} instance {id}");

        let handle = ModuleHandle {
            inner: Arc::new(HandleInner { id, module, object, bridge: self.inner.clone() }),
        };
        let mut handles = self.inner.handles.lock();
        if let Some(existing) = handles.get(module).and_then(Weak::upgrade) {
            // Another thread created the module first; ours is released on drop.
            drop(handles);
            return Ok(ModuleHandle { inner: existing });
        }
        handles.insert(module, Arc::downgrade(&handle.inner));
        Ok(handle)
    }

    /// The event loop completions are posted to, unless the host supplied
    /// its own scheduler.
    pub fn event_loop(&self) -> Option<&Arc<EventLoop>> {
        self.inner.event_loop.as_ref()
    }

    pub fn live_instances(&self) -> usize {
        self.inner.instances.len()
    }

    pub fn pending_calls(&self) -> usize {
        self.inner.dispatcher.pending()
    }

    pub fn workers(&self) -> usize {
        self.inner.dispatcher.workers()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("registered", &self.registered())
            .field("live_instances", &self.live_instances())
            .finish()
    }
}

#[derive(Default)]
pub struct BridgeBuilder {
    workers: Option<usize>,
    data_path: Option<PathBuf>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl BridgeBuilder {
    /// Size of the asynchronous worker pool. Defaults to the CPU count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Deliver completions and notifications through `scheduler` instead
    /// of a bridge-owned [`EventLoop`].
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Bridge {
        let (scheduler, event_loop) = match self.scheduler {
            Some(scheduler) => (scheduler, None),
            None => {
                let event_loop = EventLoop::new();
                (event_loop.clone() as Arc<dyn Scheduler>, Some(event_loop))
            }
        };
        let workers = self.workers.unwrap_or_else(num_cpus::get);
        let dispatcher = Dispatcher::new(workers, scheduler.clone());
        Bridge {
            inner: Arc::new(BridgeInner {
                factories: RwLock::new(FxHashMap::default()),
                handles: Mutex::new(FxHashMap::default()),
                instances: InstanceTable::new(),
                notifications: NotificationRegistry::new(),
                dispatcher,
                scheduler,
                event_loop,
                data_path: self.data_path,
            }),
        }
    }
}

static GLOBAL: OnceCell<Bridge> = OnceCell::new();

/// The process-wide bridge, created with defaults on first use.
pub fn global() -> &'static Bridge {
    GLOBAL.get_or_init(Bridge::new)
}

/// Install `bridge` as the process-wide bridge. Fails if one exists.
pub fn install_global(bridge: Bridge) -> Result<(), Bridge> {
    GLOBAL.set(bridge)
}

struct HandleInner {
    id: InstanceId,
    module: &'static str,
    object: Arc<dyn InstanceObject>,
    bridge: Arc<BridgeInner>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        self.bridge.release(self.id);
    }
}

/// A host reference to one module instance. The instance is released when
/// the last clone is dropped.
#[derive(Clone)]
pub struct ModuleHandle {
    inner: Arc<HandleInner>,
}

impl ModuleHandle {
    pub fn name(&self) -> &'static str {
        self.inner.module
    }

    pub fn instance_id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn declaration(&self) -> &'static ModuleDecl {
        self.inner.object.declaration()
    }

    /// Invoke a synchronous method on the calling thread.
    pub fn call(&self, method: &str, args: Vec<HostValue>) -> BridgeResult<HostValue> {
        trace!("{}.{method}({} arg(s))", self.inner.module, args.len());
        self.inner.object.call(method, args)
    }

    /// Invoke an asynchronous method. Arguments are decoded before this
    /// returns; `on_settle` later runs once on the bridge's scheduler.
    pub fn call_async(
        &self,
        method: &str,
        args: Vec<HostValue>,
        on_settle: impl FnOnce(Settlement) + Send + 'static,
    ) -> BridgeResult<CallId> {
        let work = self.inner.object.clone().prepare_async(method, args)?;
        let id = self.inner.bridge.dispatcher.dispatch(work, Box::new(on_settle));
        trace!("{}.{method} issued as call {id}", self.inner.module);
        Ok(id)
    }

    /// State of an asynchronous call that has not been delivered yet.
    pub fn call_state(&self, id: CallId) -> Option<CallState> {
        self.inner.bridge.dispatcher.state(id)
    }

    /// Listen for `notification`. The listener runs on the bridge's
    /// scheduler.
    pub fn subscribe(&self, notification: &str, listener: Listener) -> BridgeResult<Disposer> {
        let expected = self.inner.object.notification(notification).ok_or_else(|| {
            BridgeError::UnknownNotification { module: self.inner.module, notification: notification.to_string() }
        })?;
        if listener.kind() != expected {
            return Err(BridgeError::ChannelMismatch {
                notification: notification.to_string(),
                expected,
                found: listener.kind(),
            });
        }
        let listener = listener.scheduled_on(self.inner.bridge.scheduler.clone());
        Ok(self.inner.bridge.notifications.subscribe(self.inner.id, notification, listener))
    }

    pub fn listener_count(&self, notification: &str) -> usize {
        self.inner.bridge.notifications.listener_count(self.inner.id, notification)
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle").field("module", &self.inner.module).field("instance", &self.inner.id).finish()
    }
}
