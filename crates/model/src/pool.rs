//! Interning pools for descriptors shared across analyzer results

use crate::descriptors::{PluginDescriptor, TaskDescriptor};
use indexmap::IndexMap;
use std::sync::Arc;

/// A value that can live in a [`Pool`], keyed by a stable identity
pub trait PoolEntity {
    /// Identity key; two entities with the same key are the same entity
    fn identity_key(&self) -> String;
}

impl PoolEntity for PluginDescriptor {
    fn identity_key(&self) -> String {
        self.id_name.clone()
    }
}

impl PoolEntity for TaskDescriptor {
    fn identity_key(&self) -> String {
        self.task_path()
    }
}

/// Canonical registry de-duplicating descriptors within one build session
///
/// The first interning of a key wins; later descriptors with the same key
/// resolve to the already stored copy. Insertion order is preserved so that
/// anything derived from a pool (most importantly the encoded descriptor
/// tables) is deterministic.
#[derive(Debug, Clone)]
pub struct Pool<T: PoolEntity> {
    entries: IndexMap<String, Arc<T>>,
}

impl<T: PoolEntity + PartialEq> PartialEq for Pool<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: PoolEntity> Default for Pool<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: PoolEntity> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical copy of `entity`, inserting it on first sight
    pub fn intern(&mut self, entity: T) -> Arc<T> {
        let key = entity.identity_key();
        self.entries
            .entry(key)
            .or_insert_with(|| Arc::new(entity))
            .clone()
    }

    /// Intern an already shared descriptor without copying its contents
    pub fn intern_arc(&mut self, entity: Arc<T>) -> Arc<T> {
        self.entries
            .entry(entity.identity_key())
            .or_insert(entity)
            .clone()
    }

    /// Look up the canonical copy for `key`
    ///
    /// Partial by design: during decode a missing key signals a corrupted
    /// record unless the category is one of the documented lenient ones.
    pub fn resolve(&self, key: &str) -> Option<Arc<T>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }
}

/// Task and plugin pools scoped to a single build's results
///
/// Pools are never shared across builds: descriptor identity is only stable
/// within one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorPools {
    pub tasks: Pool<TaskDescriptor>,
    pub plugins: Pool<PluginDescriptor>,
}

impl DescriptorPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a task together with its origin plugin
    ///
    /// The task's plugin reference is rewritten to the canonical pooled copy
    /// before the task itself is interned.
    pub fn intern_task(&mut self, mut task: TaskDescriptor) -> Arc<TaskDescriptor> {
        task.origin_plugin = self.plugins.intern_arc(task.origin_plugin);
        self.tasks.intern(task)
    }

    pub fn intern_plugin(&mut self, plugin: PluginDescriptor) -> Arc<PluginDescriptor> {
        self.plugins.intern(plugin)
    }
}
