//! 双缓冲淘汰的定容缓存
//!
//! `main` 是权威存储，`backup` 预先接收一代中后段的插入。
//! `main` 装满时整体丢弃，`backup` 直接顶上成为新一代，
//! 淘汰是一次 map 句柄交换而不是逐条扫描，均摊 O(1)。

use super::error::CacheError;
use indexmap::map::{Iter, Keys, Values};
use indexmap::{Equivalent, IndexMap};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::mem;

pub const DEFAULT_BACKUP_THRESHOLD_RATIO: usize = 2;

fn default_backup_threshold_ratio() -> usize {
    DEFAULT_BACKUP_THRESHOLD_RATIO
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
    #[serde(default = "default_backup_threshold_ratio")]
    pub backup_threshold_ratio: usize,
}

impl CacheConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            backup_threshold_ratio: DEFAULT_BACKUP_THRESHOLD_RATIO,
        }
    }
}

/// 定容键值缓存
///
/// 键的相等/哈希策略由 `S: BuildHasher` 与查询端的 [`Equivalent`] 决定，
/// 两个 map 共用同一策略。只读视图（`len`、`keys`、迭代）只看 `main`。
///
/// 本类型不加锁；多线程场景使用 [`SharedBoundedCache`](super::SharedBoundedCache)
/// 或由调用方串行化访问。
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V, S = RandomState> {
    main: IndexMap<K, V, S>,
    backup: IndexMap<K, V, S>,
    capacity: usize,
    backup_threshold_ratio: usize,
    hash_builder: S,
}

impl<K, V> BoundedCache<K, V, RandomState>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Self::with_hasher(capacity, RandomState::new())
    }

    pub fn from_config(config: CacheConfig) -> Result<Self, CacheError> {
        let mut cache = Self::new(config.capacity)?;
        cache.set_backup_threshold_ratio(config.backup_threshold_ratio)?;
        Ok(cache)
    }
}

impl<K, V, S> BoundedCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    pub fn with_hasher(capacity: usize, hash_builder: S) -> Result<Self, CacheError> {
        validate_capacity(capacity)?;
        Ok(Self {
            main: IndexMap::with_hasher(hash_builder.clone()),
            backup: IndexMap::with_hasher(hash_builder.clone()),
            capacity,
            backup_threshold_ratio: DEFAULT_BACKUP_THRESHOLD_RATIO,
            hash_builder,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 修改容量会使当前一代失效，清空全部条目
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), CacheError> {
        validate_capacity(capacity)?;
        self.capacity = capacity;
        self.clear();
        Ok(())
    }

    pub fn backup_threshold_ratio(&self) -> usize {
        self.backup_threshold_ratio
    }

    pub fn set_backup_threshold_ratio(&mut self, ratio: usize) -> Result<(), CacheError> {
        if ratio == 0 {
            return Err(CacheError::InvalidConfiguration(
                "backup_threshold_ratio must be at least 1".to_string(),
            ));
        }
        self.backup_threshold_ratio = ratio;
        Ok(())
    }

    /// 插入新键；键已存在于 `main` 时返回 `DuplicateKey` 且不修改任何状态
    pub fn add(&mut self, key: K, value: V) -> Result<(), CacheError> {
        if self.main.contains_key(&key) {
            return Err(CacheError::DuplicateKey);
        }
        self.insert_new(key, value);
        Ok(())
    }

    /// 幂等写入：已存在则原地更新（同步更新 backup 中的副本），否则等同 `add`
    pub fn set(&mut self, key: K, value: V) {
        if let Some(slot) = self.main.get_mut(&key) {
            if let Some(staged) = self.backup.get_mut(&key) {
                *staged = value.clone();
            }
            *slot = value;
            return;
        }
        self.insert_new(key, value);
    }

    /// 先查 `main` 再查 `backup`；命中 backup 不会提升到 main
    pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.main.get(key).or_else(|| self.backup.get(key))
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V, CacheError>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.try_get(key).ok_or(CacheError::KeyNotFound)
    }

    /// 记忆化查询：未命中时调用 `compute` 并写入
    pub fn get_or_insert_with<F>(&mut self, key: K, compute: F) -> V
    where
        F: FnOnce(&K) -> V,
    {
        if let Some(value) = self.try_get(&key) {
            return value.clone();
        }
        let value = compute(&key);
        self.set(key, value.clone());
        value
    }

    /// 从两个 map 中删除，返回是否删除了任何条目
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let in_main = self.main.shift_remove(key).is_some();
        let in_backup = self.backup.shift_remove(key).is_some();
        in_main || in_backup
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.main.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.main.len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }

    pub fn backup_len(&self) -> usize {
        self.backup.len()
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        self.main.keys()
    }

    pub fn values(&self) -> Values<'_, K, V> {
        self.main.values()
    }

    /// 按插入顺序遍历 `main`
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.main.iter()
    }

    pub fn clear(&mut self) {
        self.main.clear();
        self.backup.clear();
    }

    fn insert_new(&mut self, key: K, value: V) {
        if self.main.len() >= self.capacity {
            self.swap_generations();
        }
        if self.main.len() > self.staging_threshold() {
            self.backup.insert(key.clone(), value.clone());
        }
        self.main.insert(key, value);
    }

    /// main 中条目数超过该值后，新插入同时写入 backup
    ///
    /// ratio 为 1 时从第二条开始写 backup；ratio 越大越晚开始。
    fn staging_threshold(&self) -> usize {
        self.capacity - self.capacity / self.backup_threshold_ratio
    }

    fn swap_generations(&mut self) {
        let fresh = IndexMap::with_hasher(self.hash_builder.clone());
        let staged = mem::replace(&mut self.backup, fresh);
        let evicted = mem::replace(&mut self.main, staged);
        debug!(
            "BoundedCache: generation swap, evicted {} entries, kept {}",
            evicted.len().saturating_sub(self.main.len()),
            self.main.len()
        );
    }
}

impl<'a, K, V, S> IntoIterator for &'a BoundedCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.main.iter()
    }
}

fn validate_capacity(capacity: usize) -> Result<(), CacheError> {
    if capacity == 0 {
        return Err(CacheError::InvalidConfiguration(
            "capacity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
