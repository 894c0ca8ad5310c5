use std::fmt;

use parking_lot::Mutex;
use slab::Slab;

/// Identifies one live module instance. Ids are never reused: a slot that
/// is freed and filled again gets a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl InstanceId {
    pub fn as_u64(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    /// Empty between reservation and construction.
    value: Option<T>,
}

struct TableInner<T> {
    slots: Slab<Slot<T>>,
    generation: u32,
}

/// Live instances, keyed by [`InstanceId`].
pub struct InstanceTable<T> {
    inner: Mutex<TableInner<T>>,
}

impl<T: Clone> InstanceTable<T> {
    pub fn new() -> Self {
        InstanceTable { inner: Mutex::new(TableInner { slots: Slab::new(), generation: 0 }) }
    }

    /// Allocate an id before the instance exists, so its constructor can
    /// be handed its own id.
    pub fn reserve(&self) -> InstanceId {
        let mut inner = self.inner.lock();
        inner.generation = inner.generation.wrapping_add(1);
        let generation = inner.generation;
        let index = inner.slots.insert(Slot { generation, value: None });
        InstanceId { index: index as u32, generation }
    }

    /// Store the instance for a reserved id. Returns false if the id was
    /// released in the meantime.
    pub fn fill(&self, id: InstanceId, value: T) -> bool {
        let mut inner = self.inner.lock();
        match inner.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation => {
                slot.value = Some(value);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<T> {
        let inner = self.inner.lock();
        inner
            .slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.clone())
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        let inner = self.inner.lock();
        inner.slots.get(id.index as usize).is_some_and(|slot| slot.generation == id.generation)
    }

    /// Release an id. The stored instance is dropped outside the lock.
    pub fn remove(&self, id: InstanceId) -> Option<T> {
        let removed = {
            let mut inner = self.inner.lock();
            let live = inner.slots.get(id.index as usize).is_some_and(|slot| slot.generation == id.generation);
            if !live {
                return None;
            }
            inner.slots.remove(id.index as usize)
        };
        removed.value
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for InstanceTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
