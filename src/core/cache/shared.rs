//! 线程安全的 [`BoundedCache`] 句柄
//!
//! 所有读写（包括 generation swap）都在同一把锁内完成，
//! 读方不会看到交换到一半的状态。返回值均为克隆。

use super::bounded::{BoundedCache, CacheConfig};
use super::error::CacheError;
use indexmap::Equivalent;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SharedBoundedCache<K, V, S = RandomState> {
    inner: Arc<Mutex<BoundedCache<K, V, S>>>,
}

impl<K, V, S> Clone for SharedBoundedCache<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedBoundedCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Ok(Self::from_cache(BoundedCache::new(capacity)?))
    }

    pub fn from_config(config: CacheConfig) -> Result<Self, CacheError> {
        Ok(Self::from_cache(BoundedCache::from_config(config)?))
    }
}

impl<K, V, S> SharedBoundedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    pub fn from_cache(cache: BoundedCache<K, V, S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn add(&self, key: K, value: V) -> Result<(), CacheError> {
        self.lock().add(key, value)
    }

    pub fn set(&self, key: K, value: V) {
        self.lock().set(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Result<V, CacheError>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.lock().get(key).cloned()
    }

    pub fn try_get<Q>(&self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.lock().try_get(key).cloned()
    }

    /// `compute` 在锁内执行，同一键不会被并发重复计算
    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        self.lock().get_or_insert_with(key, compute)
    }

    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.lock().remove(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn set_capacity(&self, capacity: usize) -> Result<(), CacheError> {
        self.lock().set_capacity(capacity)
    }

    pub fn backup_threshold_ratio(&self) -> usize {
        self.lock().backup_threshold_ratio()
    }

    pub fn set_backup_threshold_ratio(&self, ratio: usize) -> Result<(), CacheError> {
        self.lock().set_backup_threshold_ratio(ratio)
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    pub fn keys(&self) -> Vec<K> {
        self.lock().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.lock().values().cloned().collect()
    }

    /// `main` 的有序快照
    pub fn entries(&self) -> Vec<(K, V)> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// 在锁内对缓存执行一组操作
    pub fn with_cache<R>(&self, f: impl FnOnce(&mut BoundedCache<K, V, S>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, BoundedCache<K, V, S>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
