use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use novelly_core::Entity;

/// Keyed entity store abstraction.
pub trait EntityStore<V: Entity>: Send + Sync {
    fn get(&self, id: V::Id) -> Option<V>;
    fn upsert(&self, value: V);
    fn remove(&self, id: V::Id) -> Option<V>;
    fn list(&self) -> Vec<V>;
    /// Remove every record matching `pred`, returning how many were removed.
    fn remove_where(&self, pred: &dyn Fn(&V) -> bool) -> usize;
}

impl<V, S> EntityStore<V> for Arc<S>
where
    V: Entity,
    S: EntityStore<V> + ?Sized,
{
    fn get(&self, id: V::Id) -> Option<V> {
        (**self).get(id)
    }

    fn upsert(&self, value: V) {
        (**self).upsert(value)
    }

    fn remove(&self, id: V::Id) -> Option<V> {
        (**self).remove(id)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }

    fn remove_where(&self, pred: &dyn Fn(&V) -> bool) -> usize {
        (**self).remove_where(pred)
    }
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryStore<V: Entity> {
    inner: RwLock<HashMap<V::Id, V>>,
}

impl<V: Entity> InMemoryStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// First record matching `pred` (linear scan).
    pub fn find(&self, pred: impl Fn(&V) -> bool) -> Option<V>
    where
        V: Clone,
    {
        let map = self.inner.read().ok()?;
        map.values().find(|v| pred(v)).cloned()
    }

    /// All records matching `pred`, in no particular order.
    pub fn filter(&self, pred: impl Fn(&V) -> bool) -> Vec<V>
    where
        V: Clone,
    {
        match self.inner.read() {
            Ok(map) => map.values().filter(|v| pred(v)).cloned().collect(),
            Err(_) => vec![],
        }
    }
}

impl<V: Entity> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EntityStore<V> for InMemoryStore<V>
where
    V: Entity + Clone + Send + Sync + 'static,
    V::Id: Send + Sync,
{
    fn get(&self, id: V::Id) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn upsert(&self, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(value.id(), value);
        }
    }

    fn remove(&self, id: V::Id) -> Option<V> {
        let mut map = self.inner.write().ok()?;
        map.remove(&id)
    }

    fn list(&self) -> Vec<V> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn remove_where(&self, pred: &dyn Fn(&V) -> bool) -> usize {
        let Ok(mut map) = self.inner.write() else {
            return 0;
        };
        let before = map.len();
        map.retain(|_, v| !pred(v));
        before - map.len()
    }
}

/// Monotonic numeric id source starting at 1.
#[derive(Debug)]
pub struct IdSequence(AtomicI64);

impl IdSequence {
    pub fn new() -> Self {
        Self(AtomicI64::new(1))
    }

    pub fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
