// Copyright (c) 2025 - Cowboy AI, Inc.
//! Session Cache
//!
//! Run-scoped memoisation of natural-key lookups. A lookup that found
//! nothing is cached too, so repeated misses cost one round trip.
//!
//! The cache is write-through: the orchestrator records every create,
//! update and delete it performs, and later lookups in the same run see the
//! result without asking the CMDB again.
//!
//! One cache belongs to one run. It takes `&mut self` everywhere and is never
//! shared between concurrent runs.

use std::collections::HashMap;
use tracing::{debug, info};

use crate::cmdb::{CmdbClient, LookupKey, RemoteObject};
use crate::errors::CmdbResult;
use crate::model::Attributes;

/// Lookup accounting for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub stores: usize,
}

impl CacheStats {
    /// Fraction of lookups answered without a round trip
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Natural-key cache for one reconciliation run
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<LookupKey, Option<RemoteObject>>,
    stats: CacheStats,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, or a remote lookup whose result (found or not) is kept
    pub async fn get_or_fetch<C>(
        &mut self,
        client: &C,
        key: &LookupKey,
    ) -> CmdbResult<Option<RemoteObject>>
    where
        C: CmdbClient + ?Sized,
    {
        if let Some(cached) = self.entries.get(key) {
            self.stats.hits += 1;
            return Ok(cached.clone());
        }

        self.stats.misses += 1;
        let fetched = client.find_by_key(key).await?;
        debug!(
            "cache miss for {}: {}",
            key,
            if fetched.is_some() { "found" } else { "absent" }
        );
        self.entries.insert(key.clone(), fetched.clone());
        Ok(fetched)
    }

    /// Record an object that now exists under `key`
    pub fn store(&mut self, key: LookupKey, object: RemoteObject) {
        self.stats.stores += 1;
        self.entries.insert(key, Some(object));
    }

    /// Merge changed attributes into a cached object. A key that is not
    /// cached stays uncached.
    pub fn apply_update(&mut self, key: &LookupKey, changes: &Attributes) {
        if let Some(Some(object)) = self.entries.get_mut(key) {
            object.apply(changes);
            self.stats.stores += 1;
        }
    }

    /// Record that `key` no longer exists
    pub fn mark_deleted(&mut self, key: LookupKey) {
        self.stats.stores += 1;
        self.entries.insert(key, None);
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// End of run: log accounting and drop every entry
    pub fn finish(&mut self) -> CacheStats {
        let stats = self.stats;
        info!(
            "Session cache: {} hits, {} misses, {} stores ({:.0}% hit rate)",
            stats.hits,
            stats.misses,
            stats.stores,
            stats.hit_rate() * 100.0
        );
        self.entries.clear();
        self.stats = CacheStats::default();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdb::{InMemoryCmdb, ObjectId};
    use crate::model::EntityKind;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_not_found_is_cached() {
        let cmdb = InMemoryCmdb::new();
        let mut cache = SessionCache::new();
        let key = LookupKey::device("sw1");

        assert!(cache.get_or_fetch(&cmdb, &key).await.unwrap().is_none());
        assert!(cache.get_or_fetch(&cmdb, &key).await.unwrap().is_none());

        assert_eq!(cmdb.calls().find, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_store_is_visible_without_round_trip() {
        let cmdb = InMemoryCmdb::new();
        let mut cache = SessionCache::new();
        let key = LookupKey::device("sw1");

        assert!(cache.get_or_fetch(&cmdb, &key).await.unwrap().is_none());
        cache.store(
            key.clone(),
            RemoteObject::new(ObjectId(7), attrs(json!({"name": "sw1"}))),
        );

        let found = cache.get_or_fetch(&cmdb, &key).await.unwrap();
        assert_eq!(found.map(|o| o.id), Some(ObjectId(7)));
        assert_eq!(cmdb.calls().find, 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_are_written_through() {
        let cmdb = InMemoryCmdb::new();
        let id = cmdb.seed(EntityKind::Device, attrs(json!({"name": "sw1", "site": "dc1"})));
        let mut cache = SessionCache::new();
        let key = LookupKey::device("sw1");

        cache.get_or_fetch(&cmdb, &key).await.unwrap();
        cache.apply_update(&key, &attrs(json!({"site": "dc2"})));
        let updated = cache.get_or_fetch(&cmdb, &key).await.unwrap().unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.attrs["site"], "dc2");

        cache.mark_deleted(key.clone());
        assert!(cache.get_or_fetch(&cmdb, &key).await.unwrap().is_none());
        assert_eq!(cmdb.calls().find, 1);
    }

    #[tokio::test]
    async fn test_finish_clears_entries() {
        let cmdb = InMemoryCmdb::new();
        let mut cache = SessionCache::new();
        cache
            .get_or_fetch(&cmdb, &LookupKey::device("sw1"))
            .await
            .unwrap();

        let stats = cache.finish();
        assert_eq!(stats.misses, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
