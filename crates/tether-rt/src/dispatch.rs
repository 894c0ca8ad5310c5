//! Asynchronous calls: a fixed pool of worker threads runs deferred work,
//! and each result is handed back to the caller's [`Scheduler`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use fxhash::FxHashMap;
use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::fault::{catch_fault, Promise};
use crate::value::HostValue;

/// A unit of work posted to a scheduler.
pub type Task = Box<dyn FnOnce() + Send>;

/// Work a worker thread runs for one asynchronous call.
pub type Work = Box<dyn FnOnce() -> Promise<HostValue> + Send>;

/// Receives a call's settlement on the caller's side.
pub type Completion = Box<dyn FnOnce(Settlement) + Send>;

/// Where completions and notifications are delivered: the host's thread.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, task: Task);
}

/// Final outcome of an asynchronous call.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Resolved(HostValue),
    Rejected(String),
}

impl Settlement {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Settlement::Resolved(_))
    }
}

pub type CallId = u64;

/// Lifecycle of a pending call. `Resolved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Issued,
    Running,
    Resolved,
    Rejected,
}

struct PendingCall {
    state: CallState,
    completion: Option<Completion>,
}

/// Calls that have been issued and whose result has not been delivered.
#[derive(Default)]
struct PendingCalls {
    calls: Mutex<FxHashMap<CallId, PendingCall>>,
}

impl PendingCalls {
    fn insert(&self, id: CallId, completion: Completion) {
        self.calls.lock().insert(id, PendingCall { state: CallState::Issued, completion: Some(completion) });
    }

    fn mark_running(&self, id: CallId) {
        if let Some(call) = self.calls.lock().get_mut(&id) {
            call.state = CallState::Running;
        }
    }

    /// Move the call to its terminal state and take its completion. Only
    /// the first settlement of a call gets the completion.
    fn settle(&self, id: CallId, settlement: &Settlement) -> Option<Completion> {
        let mut calls = self.calls.lock();
        let call = calls.get_mut(&id)?;
        let completion = call.completion.take()?;
        call.state = match settlement {
            Settlement::Resolved(_) => CallState::Resolved,
            Settlement::Rejected(_) => CallState::Rejected,
        };
        Some(completion)
    }

    fn remove(&self, id: CallId) {
        self.calls.lock().remove(&id);
    }

    fn state(&self, id: CallId) -> Option<CallState> {
        self.calls.lock().get(&id).map(|call| call.state)
    }

    fn len(&self) -> usize {
        self.calls.lock().len()
    }
}

struct Job {
    id: CallId,
    work: Work,
}

/// Bounded worker pool for asynchronous method bodies.
pub struct Dispatcher {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<PendingCalls>,
    scheduler: Arc<dyn Scheduler>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new(workers: usize, scheduler: Arc<dyn Scheduler>) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = channel::unbounded::<Job>();
        let pending = Arc::new(PendingCalls::default());

        let handles = (0..workers)
            .filter_map(|n| {
                let receiver = receiver.clone();
                let pending = pending.clone();
                let scheduler = scheduler.clone();
                thread::Builder::new()
                    .name(format!("tether-worker-{n}"))
                    .spawn(move || run_worker(n, receiver, pending, scheduler))
                    .map_err(|e| warn!("failed to spawn worker {n}: {e}"))
                    .ok()
            })
            .collect::<Vec<_>>();
        debug!("dispatcher started with {} worker(s)", handles.len());

        Dispatcher { sender: Some(sender), workers: handles, pending, scheduler, next_id: AtomicU64::new(1) }
    }

    /// Queue `work` and return immediately. `completion` runs exactly once,
    /// on the scheduler, with the call's settlement.
    pub fn dispatch(&self, work: Work, completion: Completion) -> CallId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(id, completion);

        let queued = match &self.sender {
            Some(sender) if !self.workers.is_empty() => sender.send(Job { id, work }).is_ok(),
            _ => false,
        };
        if !queued {
            complete(&self.pending, &self.scheduler, id, Settlement::Rejected("dispatcher is shut down".to_string()));
        }
        trace!("issued call {id}");
        id
    }

    /// State of a call whose result has not been delivered yet.
    pub fn state(&self, id: CallId) -> Option<CallState> {
        self.pending.state(id)
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.sender.take();
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() != current {
                let _ = handle.join();
            }
        }
    }
}

fn run_worker(n: usize, receiver: Receiver<Job>, pending: Arc<PendingCalls>, scheduler: Arc<dyn Scheduler>) {
    debug!("worker {n} started");
    for Job { id, work } in receiver.iter() {
        pending.mark_running(id);
        let settlement = match catch_fault(work) {
            Ok(Ok(value)) => Settlement::Resolved(value),
            Ok(Err(rejection)) => Settlement::Rejected(rejection.message),
            Err(fault) => Settlement::Rejected(fault),
        };
        trace!("worker {n} settled call {id}: {}", if settlement.is_resolved() { "resolved" } else { "rejected" });
        complete(&pending, &scheduler, id, settlement);
    }
    debug!("worker {n} exiting");
}

fn complete(pending: &Arc<PendingCalls>, scheduler: &Arc<dyn Scheduler>, id: CallId, settlement: Settlement) {
    let Some(completion) = pending.settle(id, &settlement) else {
        warn!("call {id} settled twice; dropping the second result");
        return;
    };
    let pending = pending.clone();
    scheduler.schedule(Box::new(move || {
        completion(settlement);
        pending.remove(id);
    }));
}

/// A queue of tasks drained by the host thread.
pub struct EventLoop {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
}

impl EventLoop {
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = channel::unbounded();
        Arc::new(EventLoop { sender, receiver })
    }

    /// Run every task queued so far. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for a task, then drain the queue.
    pub fn turn(&self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                1 + self.run_pending()
            }
            Err(_) => 0,
        }
    }

    pub fn queued(&self) -> usize {
        self.receiver.len()
    }
}

impl Scheduler for EventLoop {
    fn schedule(&self, task: Task) {
        if self.sender.send(task).is_err() {
            warn!("event loop is closed; dropping task");
        }
    }
}
