// Copyright (c) 2025 - Cowboy AI, Inc.
//! Batch Executor
//!
//! Applies a list of same-kind operations against a CMDB client with
//! resilience to partial failure.
//!
//! # Architecture
//!
//! ```text
//! pending ops ──chunk──▶ bulk call ──ok──────────────▶ all applied
//!                            │
//!                            └─err──▶ per-item calls ──▶ applied / failed
//!                                     (each failure recorded, never aborts)
//! ```
//!
//! Authentication and permission errors are never absorbed: they abort the
//! batch immediately, on the bulk path and the per-item path alike.
//!
//! A bulk call is one logical request carrying many items. Chunks are
//! applied one after another, items within a chunk in the order given.

use futures::FutureExt;
use std::future::Future;
use tracing::{debug, error, warn};

use crate::cmdb::{CmdbClient, ObjectId};
use crate::diff::ChangeCategory;
use crate::errors::CmdbResult;
use crate::model::{Attributes, EntityKind};
use crate::stats::{FailureRecord, SyncOutcome};

/// Object to create
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCreate {
    /// Natural key, for logs and failure records
    pub identity: String,
    pub attrs: Attributes,
}

/// Changed attributes for an existing object
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub identity: String,
    pub id: ObjectId,
    pub attrs: Attributes,
}

/// Object to delete
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub identity: String,
    pub id: ObjectId,
}

/// Result of one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<O> {
    /// Applied items as (index into the input, result)
    pub applied: Vec<(usize, O)>,
    pub failures: Vec<FailureRecord>,
    /// At least one chunk degraded to per-item calls
    pub used_fallback: bool,
}

impl<O> Default for BatchOutcome<O> {
    fn default() -> Self {
        Self {
            applied: Vec::new(),
            failures: Vec::new(),
            used_fallback: false,
        }
    }
}

impl<O> BatchOutcome<O> {
    /// Fold into a call outcome, counting applied items under `category`
    pub fn record_into(&self, outcome: &mut SyncOutcome, category: ChangeCategory) {
        let applied = self.applied.len();
        match category {
            ChangeCategory::Create => outcome.stats.created += applied,
            ChangeCategory::Update => outcome.stats.updated += applied,
            ChangeCategory::Delete => outcome.stats.deleted += applied,
            ChangeCategory::Skip => outcome.stats.skipped += applied,
        }
        outcome.stats.failed += self.failures.len();
        outcome.failures.extend(self.failures.iter().cloned());
    }

    fn absorb(&mut self, other: BatchOutcome<O>) {
        self.applied.extend(other.applied);
        self.failures.extend(other.failures);
        self.used_fallback |= other.used_fallback;
    }
}

/// Apply `items` with one bulk call, degrading to one call per item when the
/// bulk call fails with a recoverable error.
///
/// `offset` is added to the reported indexes so chunks report positions in
/// the caller's list.
pub async fn run_with_fallback<'a, T, O, B, BF, S, SF>(
    kind: EntityKind,
    operation: &'static str,
    items: &'a [T],
    offset: usize,
    identity: impl Fn(&T) -> &str,
    bulk: B,
    single: S,
) -> CmdbResult<BatchOutcome<O>>
where
    B: FnOnce(&'a [T]) -> BF,
    BF: Future<Output = CmdbResult<Vec<O>>>,
    S: Fn(&'a T) -> SF,
    SF: Future<Output = CmdbResult<O>>,
{
    let mut outcome = BatchOutcome::default();
    if items.is_empty() {
        return Ok(outcome);
    }

    match bulk(items).await {
        Ok(results) => {
            let returned = results.len();
            for (index, result) in results.into_iter().enumerate().take(items.len()) {
                outcome.applied.push((offset + index, result));
            }
            for item in items.iter().skip(returned) {
                outcome.failures.push(FailureRecord::new(
                    identity(item),
                    "bulk response carried no result for this item",
                ));
            }
            debug!("Bulk {} of {} {} succeeded", operation, items.len(), kind);
            Ok(outcome)
        }
        Err(e) if e.is_fatal() => {
            error!("Bulk {} of {} aborted: {}", operation, kind, e);
            Err(e)
        }
        Err(e) => {
            warn!(
                "Bulk {} of {} {} failed, falling back to per-item calls: {}",
                operation,
                items.len(),
                kind,
                e
            );
            outcome.used_fallback = true;

            for (index, item) in items.iter().enumerate() {
                match single(item).await {
                    Ok(result) => outcome.applied.push((offset + index, result)),
                    Err(e) if e.is_fatal() => {
                        error!("{} of {} {} aborted: {}", operation, kind, identity(item), e);
                        return Err(e);
                    }
                    Err(e) => {
                        error!("Failed to {} {} {}: {}", operation, kind, identity(item), e);
                        outcome.failures.push(FailureRecord::new(identity(item), &e));
                    }
                }
            }
            Ok(outcome)
        }
    }
}

/// Chunked batch execution for one entity kind
pub struct BatchExecutor<'c, C: ?Sized> {
    client: &'c C,
    kind: EntityKind,
    chunk_size: usize,
}

impl<'c, C> BatchExecutor<'c, C>
where
    C: CmdbClient + ?Sized,
{
    pub fn new(client: &'c C, kind: EntityKind, chunk_size: usize) -> Self {
        Self {
            client,
            kind,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Create every item; results carry the new object ids
    pub async fn create(&self, items: &[PendingCreate]) -> CmdbResult<BatchOutcome<ObjectId>> {
        let client = self.client;
        let kind = self.kind;
        let mut total = BatchOutcome::default();

        for (n, chunk) in items.chunks(self.chunk_size).enumerate() {
            let outcome = run_with_fallback(
                kind,
                "create",
                chunk,
                n * self.chunk_size,
                |item| item.identity.as_str(),
                |chunk| {
                    client.bulk_create(kind, chunk.iter().map(|p| p.attrs.clone()).collect())
                },
                |item| client.create(kind, item.attrs.clone()),
            )
            .await?;
            total.absorb(outcome);
        }

        Ok(total)
    }

    /// Apply every update
    pub async fn update(&self, items: &[PendingUpdate]) -> CmdbResult<BatchOutcome<()>> {
        let client = self.client;
        let kind = self.kind;
        let mut total = BatchOutcome::default();

        for (n, chunk) in items.chunks(self.chunk_size).enumerate() {
            let outcome = run_with_fallback(
                kind,
                "update",
                chunk,
                n * self.chunk_size,
                |item| item.identity.as_str(),
                |chunk| {
                    let count = chunk.len();
                    let payload = chunk.iter().map(|p| (p.id, p.attrs.clone())).collect();
                    client
                        .bulk_update(kind, payload)
                        .map(move |result| result.map(|_| vec![(); count]))
                },
                |item| client.update(kind, item.id, item.attrs.clone()),
            )
            .await?;
            total.absorb(outcome);
        }

        Ok(total)
    }

    /// Delete every item
    pub async fn delete(&self, items: &[PendingDelete]) -> CmdbResult<BatchOutcome<()>> {
        let client = self.client;
        let kind = self.kind;
        let mut total = BatchOutcome::default();

        for (n, chunk) in items.chunks(self.chunk_size).enumerate() {
            let outcome = run_with_fallback(
                kind,
                "delete",
                chunk,
                n * self.chunk_size,
                |item| item.identity.as_str(),
                |chunk| {
                    let count = chunk.len();
                    let ids = chunk.iter().map(|p| p.id).collect();
                    client
                        .bulk_delete(kind, ids)
                        .map(move |result| result.map(|_| vec![(); count]))
                },
                |item| client.delete(kind, item.id),
            )
            .await?;
            total.absorb(outcome);
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmdb::InMemoryCmdb;
    use serde_json::json;

    fn device(name: &str) -> PendingCreate {
        PendingCreate {
            identity: name.to_string(),
            attrs: json!({ "name": name }).as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_bulk_path_applies_everything() {
        let cmdb = InMemoryCmdb::new();
        let executor = BatchExecutor::new(&cmdb, EntityKind::Device, 100);

        let outcome = executor
            .create(&[device("sw1"), device("sw2"), device("sw3")])
            .await
            .unwrap();

        assert_eq!(outcome.applied.len(), 3);
        assert!(outcome.failures.is_empty());
        assert!(!outcome.used_fallback);
        assert_eq!(cmdb.calls().bulk_create, 1);
        assert_eq!(cmdb.calls().create, 0);
    }

    #[tokio::test]
    async fn test_fallback_counts_each_item_once() {
        let cmdb = InMemoryCmdb::new();
        cmdb.reject(EntityKind::Device, "sw2");
        cmdb.reject(EntityKind::Device, "sw4");
        let executor = BatchExecutor::new(&cmdb, EntityKind::Device, 100);

        let items = vec![device("sw1"), device("sw2"), device("sw3"), device("sw4")];
        let outcome = executor.create(&items).await.unwrap();

        assert!(outcome.used_fallback);
        assert_eq!(
            outcome.applied.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![0, 2]
        );
        let failed: Vec<_> = outcome.failures.iter().map(|f| f.identity.as_str()).collect();
        assert_eq!(failed, vec!["sw2", "sw4"]);
        assert_eq!(cmdb.objects(EntityKind::Device).len(), 2);

        let mut sync = SyncOutcome::new(EntityKind::Device, "all", false);
        outcome.record_into(&mut sync, ChangeCategory::Create);
        assert_eq!(sync.stats.created, 2);
        assert_eq!(sync.stats.failed, 2);
        assert_eq!(sync.stats.total(), items.len());
    }

    #[tokio::test]
    async fn test_chunks_report_global_indexes() {
        let cmdb = InMemoryCmdb::new();
        cmdb.reject(EntityKind::Device, "sw3");
        let executor = BatchExecutor::new(&cmdb, EntityKind::Device, 2);

        let outcome = executor
            .create(&[device("sw1"), device("sw2"), device("sw3")])
            .await
            .unwrap();

        assert_eq!(cmdb.calls().bulk_create, 2);
        assert_eq!(
            outcome.applied.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(outcome.failures[0].identity, "sw3");
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_absorbed() {
        let cmdb = InMemoryCmdb::new();
        cmdb.fail_auth(true);
        let executor = BatchExecutor::new(&cmdb, EntityKind::Device, 100);

        let err = executor.create(&[device("sw1")]).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(cmdb.calls().create, 0);
    }

    #[tokio::test]
    async fn test_updates_and_deletes_fall_back() {
        let cmdb = InMemoryCmdb::new();
        let a = cmdb.seed(EntityKind::Device, device("sw1").attrs);
        let b = cmdb.seed(EntityKind::Device, device("sw2").attrs);
        cmdb.fail_bulk(EntityKind::Device);
        let executor = BatchExecutor::new(&cmdb, EntityKind::Device, 100);

        let updates = vec![
            PendingUpdate {
                identity: "sw1".into(),
                id: a,
                attrs: json!({"site": "dc2"}).as_object().cloned().unwrap_or_default(),
            },
            PendingUpdate {
                identity: "ghost".into(),
                id: ObjectId(999),
                attrs: Attributes::new(),
            },
        ];
        let updated = executor.update(&updates).await.unwrap();
        assert!(updated.used_fallback);
        assert_eq!(updated.applied.len(), 1);
        assert_eq!(updated.failures[0].identity, "ghost");

        let deleted = executor
            .delete(&[PendingDelete {
                identity: "sw2".into(),
                id: b,
            }])
            .await
            .unwrap();
        assert_eq!(deleted.applied.len(), 1);
        assert_eq!(cmdb.objects(EntityKind::Device).len(), 1);
    }
}
