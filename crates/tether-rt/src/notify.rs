//! Notifications: named, typed events a module instance pushes to host
//! listeners.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use fxhash::FxHashMap;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::dispatch::Scheduler;
use crate::fault::catch_fault;
use crate::instance::InstanceId;
use crate::value::HostValue;

/// The shape a notification's payload travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Unit,
    Value,
    NumberArray,
    StringArray,
    Bytes,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayloadKind::Unit => "empty",
            PayloadKind::Value => "value",
            PayloadKind::NumberArray => "number array",
            PayloadKind::StringArray => "string array",
            PayloadKind::Bytes => "byte buffer",
        })
    }
}

/// One emitted payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Unit,
    Value(HostValue),
    NumberArray(Vec<f64>),
    StringArray(Vec<String>),
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Unit => PayloadKind::Unit,
            Payload::Value(_) => PayloadKind::Value,
            Payload::NumberArray(_) => PayloadKind::NumberArray,
            Payload::StringArray(_) => PayloadKind::StringArray,
            Payload::Bytes(_) => PayloadKind::Bytes,
        }
    }
}

/// A host callback, typed by the payload it accepts.
#[derive(Clone)]
pub enum Listener {
    Unit(Arc<dyn Fn() + Send + Sync>),
    Value(Arc<dyn Fn(&HostValue) + Send + Sync>),
    NumberArray(Arc<dyn Fn(&[f64]) + Send + Sync>),
    StringArray(Arc<dyn Fn(&[String]) + Send + Sync>),
    Bytes(Arc<dyn Fn(&[u8]) + Send + Sync>),
}

impl Listener {
    pub fn unit(f: impl Fn() + Send + Sync + 'static) -> Self {
        Listener::Unit(Arc::new(f))
    }

    pub fn value(f: impl Fn(&HostValue) + Send + Sync + 'static) -> Self {
        Listener::Value(Arc::new(f))
    }

    pub fn number_array(f: impl Fn(&[f64]) + Send + Sync + 'static) -> Self {
        Listener::NumberArray(Arc::new(f))
    }

    pub fn string_array(f: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        Listener::StringArray(Arc::new(f))
    }

    pub fn bytes(f: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        Listener::Bytes(Arc::new(f))
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            Listener::Unit(_) => PayloadKind::Unit,
            Listener::Value(_) => PayloadKind::Value,
            Listener::NumberArray(_) => PayloadKind::NumberArray,
            Listener::StringArray(_) => PayloadKind::StringArray,
            Listener::Bytes(_) => PayloadKind::Bytes,
        }
    }

    /// Invoke with `payload`. Returns false when the shapes differ.
    pub fn deliver(&self, payload: &Payload) -> bool {
        match (self, payload) {
            (Listener::Unit(f), Payload::Unit) => f(),
            (Listener::Value(f), Payload::Value(v)) => f(v),
            (Listener::NumberArray(f), Payload::NumberArray(v)) => f(v),
            (Listener::StringArray(f), Payload::StringArray(v)) => f(v),
            (Listener::Bytes(f), Payload::Bytes(v)) => f(v),
            _ => return false,
        }
        true
    }

    /// Wrap so each delivery is posted to `scheduler` instead of running
    /// on the emitting thread.
    pub fn scheduled_on(self, scheduler: Arc<dyn Scheduler>) -> Self {
        match self {
            Listener::Unit(f) => Listener::unit(move || {
                let f = f.clone();
                scheduler.schedule(Box::new(move || f()));
            }),
            Listener::Value(f) => Listener::value(move |v| {
                let (f, v) = (f.clone(), v.clone());
                scheduler.schedule(Box::new(move || f(&v)));
            }),
            Listener::NumberArray(f) => Listener::number_array(move |v| {
                let (f, v) = (f.clone(), v.to_vec());
                scheduler.schedule(Box::new(move || f(&v)));
            }),
            Listener::StringArray(f) => Listener::string_array(move |v| {
                let (f, v) = (f.clone(), v.to_vec());
                scheduler.schedule(Box::new(move || f(&v)));
            }),
            Listener::Bytes(f) => Listener::bytes(move |v| {
                let (f, v) = (f.clone(), v.to_vec());
                scheduler.schedule(Box::new(move || f(&v)));
            }),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:?})", self.kind())
    }
}

struct Subscription {
    id: u64,
    listener: Listener,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    rows: FxHashMap<InstanceId, FxHashMap<String, Vec<Subscription>>>,
}

/// Listeners per (instance, notification name), in registration order.
#[derive(Default)]
pub struct NotificationRegistry {
    inner: Mutex<RegistryInner>,
}

impl NotificationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, instance: InstanceId, name: &str, listener: Listener) -> Disposer {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner
            .rows
            .entry(instance)
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(Subscription { id, listener });
        debug!("subscribed listener {id} to `{name}` on {instance}");
        Disposer {
            registry: Arc::downgrade(self),
            instance,
            name: name.to_string(),
            id,
            disposed: AtomicBool::new(false),
        }
    }

    fn unsubscribe(&self, instance: InstanceId, name: &str, id: u64) {
        let mut inner = self.inner.lock();
        let Some(row) = inner.rows.get_mut(&instance) else { return };
        if let Some(listeners) = row.get_mut(name) {
            listeners.retain(|s| s.id != id);
            if listeners.is_empty() {
                row.remove(name);
            }
        }
        if row.is_empty() {
            inner.rows.remove(&instance);
        }
    }

    /// Deliver `payload` to every listener of `name` on `instance`.
    ///
    /// Listeners are snapshotted and invoked with the lock released, so a
    /// listener may subscribe or dispose without deadlocking. Returns the
    /// number of listeners invoked.
    pub fn emit(&self, instance: InstanceId, name: &str, payload: &Payload) -> usize {
        let snapshot: Vec<Listener> = {
            let inner = self.inner.lock();
            inner
                .rows
                .get(&instance)
                .and_then(|row| row.get(name))
                .map(|subs| subs.iter().map(|s| s.listener.clone()).collect())
                .unwrap_or_default()
        };

        let mut delivered = 0;
        for listener in &snapshot {
            match catch_fault(|| listener.deliver(payload)) {
                Ok(true) => delivered += 1,
                Ok(false) => warn!(
                    "skipped a {} listener of `{name}` on {instance}: payload is {}",
                    listener.kind(),
                    payload.kind()
                ),
                Err(message) => warn!("listener of `{name}` on {instance} faulted: {message}"),
            }
        }
        delivered
    }

    pub fn listener_count(&self, instance: InstanceId, name: &str) -> usize {
        let inner = self.inner.lock();
        inner.rows.get(&instance).and_then(|row| row.get(name)).map_or(0, Vec::len)
    }

    /// Drop every listener registered against `instance`.
    pub fn remove_instance(&self, instance: InstanceId) {
        let removed = self.inner.lock().rows.remove(&instance);
        if let Some(row) = removed {
            debug!("dropped {} notification row(s) of {instance}", row.len());
        }
    }
}

/// Handle returned by a subscription. Disposing twice is a no-op.
#[derive(Debug)]
pub struct Disposer {
    registry: Weak<NotificationRegistry>,
    instance: InstanceId,
    name: String,
    id: u64,
    disposed: AtomicBool,
}

impl Disposer {
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.instance, &self.name, self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for NotificationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRegistry").field("instances", &self.inner.lock().rows.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceTable;

    fn instance() -> InstanceId {
        InstanceTable::<()>::new().reserve()
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let registry = NotificationRegistry::new();
        let id = instance();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let disposers: Vec<Disposer> = (0..3)
            .map(|n| {
                let seen = seen.clone();
                registry.subscribe(id, "onTick", Listener::number_array(move |v| seen.lock().push((n, v.to_vec()))))
            })
            .collect();

        let delivered = registry.emit(id, "onTick", &Payload::NumberArray(vec![1.0, 2.0]));
        assert_eq!(delivered, 3);
        assert_eq!(
            *seen.lock(),
            vec![(0, vec![1.0, 2.0]), (1, vec![1.0, 2.0]), (2, vec![1.0, 2.0])]
        );
        assert_eq!(disposers.len(), 3);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let registry = NotificationRegistry::new();
        let id = instance();
        let first = registry.subscribe(id, "onDone", Listener::unit(|| {}));
        let _second = registry.subscribe(id, "onDone", Listener::unit(|| {}));
        assert_eq!(registry.listener_count(id, "onDone"), 2);

        first.dispose();
        first.dispose();
        assert!(first.is_disposed());
        assert_eq!(registry.listener_count(id, "onDone"), 1);
        assert_eq!(registry.emit(id, "onDone", &Payload::Unit), 1);
    }

    #[test]
    fn test_listener_may_dispose_itself_during_emit() {
        let registry = NotificationRegistry::new();
        let id = instance();
        let slot: Arc<Mutex<Option<Disposer>>> = Arc::new(Mutex::new(None));
        let inner = slot.clone();
        let disposer = registry.subscribe(
            id,
            "onDone",
            Listener::unit(move || {
                if let Some(d) = inner.lock().as_ref() {
                    d.dispose();
                }
            }),
        );
        *slot.lock() = Some(disposer);

        assert_eq!(registry.emit(id, "onDone", &Payload::Unit), 1);
        assert_eq!(registry.listener_count(id, "onDone"), 0);
    }

    #[test]
    fn test_mismatched_and_faulting_listeners_are_skipped() {
        let registry = NotificationRegistry::new();
        let id = instance();
        let _a = registry.subscribe(id, "onValue", Listener::bytes(|_| {}));
        let _b = registry.subscribe(id, "onValue", Listener::value(|_| panic!("listener bug")));
        let _c = registry.subscribe(id, "onValue", Listener::value(|_| {}));
        assert_eq!(registry.emit(id, "onValue", &Payload::Value(HostValue::Null)), 1);
    }

    #[test]
    fn test_remove_instance() {
        let registry = NotificationRegistry::new();
        let id = instance();
        let disposer = registry.subscribe(id, "onDone", Listener::unit(|| {}));
        registry.remove_instance(id);
        assert_eq!(registry.emit(id, "onDone", &Payload::Unit), 0);
        disposer.dispose();
    }
}
