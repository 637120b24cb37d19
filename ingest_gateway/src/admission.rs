//! Admission control bounding the number of concurrent in-flight writes.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use data_types::NamespaceName;
use hashbrown::HashMap;
use parking_lot::RwLock;

/// A single in-flight counter and its configured ceiling.
#[derive(Debug)]
struct Counter {
    in_flight: AtomicUsize,
    limit: usize,
}

impl Counter {
    fn new(limit: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            limit,
        }
    }

    /// Atomically claim one slot, returning false when the ceiling has been
    /// reached.
    fn try_claim(&self) -> bool {
        self.in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                (v < self.limit).then_some(v + 1)
            })
            .is_ok()
    }

    fn release(&self) {
        let prev = self.in_flight.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0);
    }
}

/// Grants [`AdmissionToken`]s for writes, bounding the number of concurrent
/// in-flight requests per namespace (and optionally across the gateway as a
/// whole).
///
/// [`AdmissionGate::try_admit()`] never blocks and never queues: a saturated
/// namespace yields an immediate `None`, giving the caller a fast, explicit
/// "try again" signal instead of unbounded queueing delay and memory growth.
///
/// Counters are created lazily on the first admission attempt for a
/// namespace and live for the process lifetime. Admission for one namespace
/// never contends with another beyond a short read lock locating the
/// counter - the counters themselves are updated lock-free.
#[derive(Debug)]
pub struct AdmissionGate {
    namespace_limit: usize,
    global: Option<Arc<Counter>>,
    namespaces: RwLock<HashMap<String, Arc<Counter>>>,
}

impl AdmissionGate {
    /// Initialise a gate admitting at most `namespace_limit` concurrent
    /// writes per namespace, and at most `global_limit` across all
    /// namespaces when set.
    pub fn new(namespace_limit: NonZeroUsize, global_limit: Option<NonZeroUsize>) -> Self {
        Self {
            namespace_limit: namespace_limit.get(),
            global: global_limit.map(|limit| Arc::new(Counter::new(limit.get()))),
            namespaces: Default::default(),
        }
    }

    /// Attempt to claim one unit of in-flight capacity for `namespace`.
    ///
    /// Returns `None` when the namespace (or the gateway as a whole) is at
    /// its concurrency ceiling. Dropping the returned token releases the
    /// claimed capacity.
    pub fn try_admit(&self, namespace: &NamespaceName<'_>) -> Option<AdmissionToken> {
        let counter = self.namespace_counter(namespace);

        if !counter.try_claim() {
            return None;
        }

        if let Some(global) = &self.global {
            if !global.try_claim() {
                // Roll back the namespace claim taken above.
                counter.release();
                return None;
            }
        }

        Some(AdmissionToken {
            namespace: counter,
            global: self.global.as_ref().map(Arc::clone),
        })
    }

    /// The number of writes currently in flight for `namespace`.
    pub fn in_flight(&self, namespace: &NamespaceName<'_>) -> usize {
        self.namespaces
            .read()
            .get(namespace.as_str())
            .map(|counter| counter.in_flight.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    fn namespace_counter(&self, namespace: &NamespaceName<'_>) -> Arc<Counter> {
        if let Some(counter) = self.namespaces.read().get(namespace.as_str()) {
            return Arc::clone(counter);
        }

        // First admission attempt for this namespace - initialise its
        // counter, racing any other request for the same namespace.
        Arc::clone(
            self.namespaces
                .write()
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(Counter::new(self.namespace_limit))),
        )
    }
}

/// One unit of in-flight write capacity for a namespace.
///
/// Dropping the token is what releases the capacity, so release happens
/// exactly once on every exit path of the dispatch - success, failure and
/// timeout alike.
#[derive(Debug)]
#[must_use = "dropping the token is what releases the admission slot"]
pub struct AdmissionToken {
    namespace: Arc<Counter>,
    global: Option<Arc<Counter>>,
}

impl Drop for AdmissionToken {
    fn drop(&mut self) {
        self.namespace.release();
        if let Some(global) = &self.global {
            global.release();
        }
    }
}
