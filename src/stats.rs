// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sync statistics and reports
//!
//! Every entity-type sync call returns a [`SyncOutcome`] whose [`SyncStats`]
//! has the same shape whether the bulk path, the per-item fallback, or a dry
//! run produced it. A full sync collects the outcomes into a [`SyncReport`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use uuid::Uuid;

use crate::diff::DiffPreview;
use crate::model::EntityKind;

/// Per-call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncStats {
    /// Items accounted for
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted + self.skipped + self.failed
    }

    /// Items that changed the CMDB (or would have, in a dry run)
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn merge(&mut self, other: &SyncStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl AddAssign for SyncStats {
    fn add_assign(&mut self, other: Self) {
        self.merge(&other);
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} updated={} deleted={} skipped={} failed={}",
            self.created, self.updated, self.deleted, self.skipped, self.failed
        )
    }
}

/// One item that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Natural key of the item
    pub identity: String,
    pub error: String,
}

impl FailureRecord {
    pub fn new(identity: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            identity: identity.into(),
            error: error.to_string(),
        }
    }
}

/// Result of one entity-type sync call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub kind: EntityKind,
    /// What the call was scoped to, e.g. a device name
    pub scope: String,
    pub stats: SyncStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<DiffPreview>,
    pub dry_run: bool,
}

impl SyncOutcome {
    pub fn new(kind: EntityKind, scope: impl Into<String>, dry_run: bool) -> Self {
        Self {
            kind,
            scope: scope.into(),
            stats: SyncStats::default(),
            failures: Vec::new(),
            preview: None,
            dry_run,
        }
    }

    /// Count and record one failed item
    pub fn fail(&mut self, identity: impl Into<String>, error: impl fmt::Display) {
        self.stats.failed += 1;
        self.failures.push(FailureRecord::new(identity, error));
    }

    /// Attach (or extend) the preview
    pub fn add_preview(&mut self, preview: DiffPreview) {
        match &mut self.preview {
            Some(existing) => existing.extend(preview),
            None => self.preview = Some(preview),
        }
    }
}

/// Report of one full sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub outcomes: Vec<SyncOutcome>,
    pub totals: BTreeMap<EntityKind, SyncStats>,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            outcomes: Vec::new(),
            totals: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, outcome: SyncOutcome) {
        self.totals.entry(outcome.kind).or_default().merge(&outcome.stats);
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Counters summed over every kind
    pub fn total(&self) -> SyncStats {
        self.totals.values().fold(SyncStats::default(), |mut acc, s| {
            acc += *s;
            acc
        })
    }

    pub fn totals_for(&self, kind: EntityKind) -> SyncStats {
        self.totals.get(&kind).copied().unwrap_or_default()
    }

    /// Run time, once finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_merge() {
        let mut total = SyncStats {
            created: 2,
            skipped: 1,
            ..Default::default()
        };
        total += SyncStats {
            created: 1,
            failed: 3,
            ..Default::default()
        };
        assert_eq!(total.created, 3);
        assert_eq!(total.failed, 3);
        assert_eq!(total.total(), 7);
        assert_eq!(total.changed(), 3);
        assert_eq!(
            total.to_string(),
            "created=3 updated=0 deleted=0 skipped=1 failed=3"
        );
    }

    #[test]
    fn test_outcome_failures_are_counted_once() {
        let mut outcome = SyncOutcome::new(EntityKind::Interface, "sw1", false);
        outcome.fail("sw1:Gi0/1", "rejected");
        outcome.fail("sw1:Gi0/2", "rejected");
        assert_eq!(outcome.stats.failed, 2);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].identity, "sw1:Gi0/1");
    }

    #[test]
    fn test_report_totals_per_kind() {
        let mut report = SyncReport::new(false);
        let mut first = SyncOutcome::new(EntityKind::Device, "sw1", false);
        first.stats.created = 1;
        let mut second = SyncOutcome::new(EntityKind::Device, "sw2", false);
        second.stats.skipped = 1;
        let mut third = SyncOutcome::new(EntityKind::Interface, "sw1", false);
        third.stats.created = 48;

        report.push(first);
        report.push(second);
        report.push(third);
        report.finish();

        assert_eq!(report.totals_for(EntityKind::Device).total(), 2);
        assert_eq!(report.total().created, 49);
        assert!(report.duration().is_some());
        assert_eq!(report.run_id.get_version_num(), 7);
    }

    #[test]
    fn test_report_serializes_kind_keys() {
        let mut report = SyncReport::new(true);
        report.push(SyncOutcome::new(EntityKind::IpAddress, "r1", true));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["totals"]["ip-address"].is_object());
        assert!(json["finished_at"].is_null());
    }
}
