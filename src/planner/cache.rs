//! Plan cache keyed by plan structure
//!
//! Two independently built plans that are structurally equal hit the same
//! entry. Entries are evicted in insertion order once the cache is full.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::planner::node::PlanNode;

/// Default maximum number of cached plans
pub const DEFAULT_CAPACITY: usize = 1024;

/// Configuration for the plan cache
#[derive(Debug, Clone)]
pub struct PlanCacheConfig {
    /// Maximum number of entries; 0 disables caching
    pub capacity: usize,
}

impl Default for PlanCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PlanCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Inner<V> {
    entries: HashMap<Arc<PlanNode>, V>,
    order: VecDeque<Arc<PlanNode>>,
}

/// Thread-safe cache from plan trees to values
pub struct PlanCache<V> {
    config: PlanCacheConfig,
    inner: Mutex<Inner<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> PlanCache<V> {
    pub fn new(config: PlanCacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PlanCacheConfig {
        &self.config
    }

    /// Look up a structurally equal plan
    pub fn get(&self, plan: &PlanNode) -> Option<V> {
        let found = self.inner.lock().entries.get(plan).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(plan_hash = plan.plan_hash(), "Plan cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(plan_hash = plan.plan_hash(), "Plan cache miss");
        }
        found
    }

    pub fn contains(&self, plan: &PlanNode) -> bool {
        self.inner.lock().entries.contains_key(plan)
    }

    /// Insert or replace an entry, returning the previous value
    pub fn insert(&self, plan: impl Into<Arc<PlanNode>>, value: V) -> Option<V> {
        if self.config.capacity == 0 {
            return None;
        }
        let plan = plan.into();
        let mut inner = self.inner.lock();

        if let Some(slot) = inner.entries.get_mut(plan.as_ref()) {
            return Some(std::mem::replace(slot, value));
        }

        while inner.entries.len() >= self.config.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(oldest.as_ref());
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(plan_hash = oldest.plan_hash(), "Evicted cached plan");
        }

        inner.order.push_back(Arc::clone(&plan));
        inner.entries.insert(plan, value);
        None
    }

    /// Return the cached value or compute and cache it
    pub fn get_or_insert_with<F>(&self, plan: &PlanNode, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(v) = self.get(plan) {
            return v;
        }
        let value = make();
        self.insert(plan.clone(), value.clone());
        value
    }

    pub fn remove(&self, plan: &PlanNode) -> Option<V> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(plan);
        if removed.is_some() {
            inner.order.retain(|p| p.as_ref() != plan);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone> Default for PlanCache<V> {
    fn default() -> Self {
        Self::new(PlanCacheConfig::default())
    }
}
