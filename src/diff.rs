// Copyright (c) 2025 - Cowboy AI, Inc.
//! Comparator
//!
//! Pure set and field difference between the desired records for one scope
//! and the records observed in the CMDB for the same scope.
//!
//! ```text
//! creates = desired - observed
//! deletes = observed - desired          (only when deletes are enabled)
//! both    = desired ∩ observed
//!   any compared field differs  -> update (with before/after per field)
//!   otherwise                   -> skip
//! ```
//!
//! Every key of `desired ∪ observed` lands in exactly one category. When
//! deletes are disabled, observed-only keys are simply left out. The result
//! is deterministic: creates, updates and skips keep desired order; deletes
//! keep observed order. Nothing here talks to the CMDB.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

use crate::cmdb::ObjectId;
use crate::model::{EntityKind, Record};
use crate::stats::SyncStats;

/// Category a key falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeCategory {
    Create,
    Update,
    Delete,
    Skip,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Skip => "skip",
        };
        f.write_str(label)
    }
}

/// One differing field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.field, self.before, self.after)
    }
}

/// A record as it exists in the CMDB
#[derive(Debug, Clone, PartialEq)]
pub struct Observed<R> {
    pub id: ObjectId,
    pub record: R,
}

impl<R> Observed<R> {
    pub fn new(id: ObjectId, record: R) -> Self {
        Self { id, record }
    }
}

/// A desired record whose key exists with different compared fields
#[derive(Debug, Clone, PartialEq)]
pub struct Update<R> {
    pub id: ObjectId,
    pub record: R,
    pub changes: Vec<FieldChange>,
}

/// Partition of `desired ∪ observed` for one entity kind and scope
#[derive(Debug, Clone, PartialEq)]
pub struct Diff<R> {
    pub creates: Vec<R>,
    pub updates: Vec<Update<R>>,
    pub deletes: Vec<Observed<R>>,
    /// Desired records that match the CMDB, with the matching object id
    pub skips: Vec<Observed<R>>,
}

impl<R> Default for Diff<R> {
    fn default() -> Self {
        Self {
            creates: Vec::new(),
            updates: Vec::new(),
            deletes: Vec::new(),
            skips: Vec::new(),
        }
    }
}

/// Field-level comparison of two records over `fields`
pub fn compare_fields<R: Record>(desired: &R, observed: &R, fields: &[&str]) -> Vec<FieldChange> {
    let want = desired.fields();
    let have = observed.fields();

    fields
        .iter()
        .filter_map(|field| {
            let after = want.get(*field).cloned().unwrap_or(Value::Null);
            let before = have.get(*field).cloned().unwrap_or(Value::Null);
            (before != after).then(|| FieldChange {
                field: field.to_string(),
                before,
                after,
            })
        })
        .collect()
}

/// Diff over the record type's compared fields
pub fn diff<R: Record>(desired: &[R], observed: &[Observed<R>], detect_deletes: bool) -> Diff<R> {
    diff_with_fields(desired, observed, R::COMPARED_FIELDS, detect_deletes)
}

/// Diff over an explicit field subset
pub fn diff_with_fields<R: Record>(
    desired: &[R],
    observed: &[Observed<R>],
    fields: &[&str],
    detect_deletes: bool,
) -> Diff<R> {
    let mut observed_by_key: HashMap<R::Key, &Observed<R>> = HashMap::with_capacity(observed.len());
    for item in observed {
        let key = item.record.key();
        if observed_by_key.contains_key(&key) {
            warn!(
                "{} {} exists more than once in the CMDB, using {}",
                R::KIND,
                key,
                observed_by_key[&key].id
            );
            continue;
        }
        observed_by_key.insert(key, item);
    }

    let mut result = Diff::default();
    let mut desired_keys = HashSet::with_capacity(desired.len());

    for record in desired {
        let key = record.key();
        if !desired_keys.insert(key.clone()) {
            warn!("Duplicate desired {} {}, keeping the first", R::KIND, key);
            continue;
        }

        match observed_by_key.get(&key) {
            None => result.creates.push(record.clone()),
            Some(existing) => {
                let changes = compare_fields(record, &existing.record, fields);
                if changes.is_empty() {
                    result.skips.push(Observed::new(existing.id, record.clone()));
                } else {
                    debug!(
                        "{} {} differs in {}",
                        R::KIND,
                        key,
                        changes
                            .iter()
                            .map(|c| c.field.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    result.updates.push(Update {
                        id: existing.id,
                        record: record.clone(),
                        changes,
                    });
                }
            }
        }
    }

    if detect_deletes {
        let mut seen = HashSet::new();
        for item in observed {
            let key = item.record.key();
            if !desired_keys.contains(&key) && seen.insert(key) {
                result.deletes.push(item.clone());
            }
        }
    }

    result
}

impl<R: Record> Diff<R> {
    /// No mutation would be issued
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Number of keys in the partition
    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len() + self.skips.len()
    }

    /// Turn every update into a skip, for kinds whose updates are disabled
    pub fn demote_updates(&mut self) {
        if !self.updates.is_empty() {
            debug!(
                "Updates disabled for {}, skipping {} changed records",
                R::KIND,
                self.updates.len()
            );
        }
        for update in self.updates.drain(..) {
            self.skips.push(Observed::new(update.id, update.record));
        }
    }

    /// Category of `key`, if it is part of this diff
    pub fn category_of(&self, key: &R::Key) -> Option<ChangeCategory> {
        if self.creates.iter().any(|r| &r.key() == key) {
            Some(ChangeCategory::Create)
        } else if self.updates.iter().any(|u| &u.record.key() == key) {
            Some(ChangeCategory::Update)
        } else if self.deletes.iter().any(|d| &d.record.key() == key) {
            Some(ChangeCategory::Delete)
        } else if self.skips.iter().any(|s| &s.record.key() == key) {
            Some(ChangeCategory::Skip)
        } else {
            None
        }
    }

    /// Statistics as if every pending operation succeeded
    pub fn projected_stats(&self) -> SyncStats {
        SyncStats {
            created: self.creates.len(),
            updated: self.updates.len(),
            deleted: self.deletes.len(),
            skipped: self.skips.len(),
            failed: 0,
        }
    }

    /// Serializable per-item view
    pub fn preview(&self) -> DiffPreview {
        let mut items = Vec::with_capacity(self.len());
        items.extend(self.creates.iter().map(|r| PreviewItem {
            key: r.key().to_string(),
            category: ChangeCategory::Create,
            changes: Vec::new(),
        }));
        items.extend(self.updates.iter().map(|u| PreviewItem {
            key: u.record.key().to_string(),
            category: ChangeCategory::Update,
            changes: u.changes.clone(),
        }));
        items.extend(self.deletes.iter().map(|d| PreviewItem {
            key: d.record.key().to_string(),
            category: ChangeCategory::Delete,
            changes: Vec::new(),
        }));
        items.extend(self.skips.iter().map(|s| PreviewItem {
            key: s.record.key().to_string(),
            category: ChangeCategory::Skip,
            changes: Vec::new(),
        }));

        DiffPreview {
            kind: R::KIND,
            items,
        }
    }
}

/// Pending item in a preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewItem {
    pub key: String,
    pub category: ChangeCategory,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

/// What a sync call would do, item by item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffPreview {
    pub kind: EntityKind,
    pub items: Vec<PreviewItem>,
}

impl DiffPreview {
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    /// Items in one category
    pub fn in_category(&self, category: ChangeCategory) -> impl Iterator<Item = &PreviewItem> {
        self.items.iter().filter(move |item| item.category == category)
    }

    /// Append another preview of the same kind
    pub fn extend(&mut self, other: DiffPreview) {
        self.items.extend(other.items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeviceScopedKey, Interface, InterfaceType, SwitchportMode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn access(name: &str) -> Interface {
        let mut iface = Interface::new("sw1", name, InterfaceType::Base1000T);
        iface.mode = Some(SwitchportMode::Access);
        iface
    }

    fn observed(records: &[Interface]) -> Vec<Observed<Interface>> {
        records
            .iter()
            .enumerate()
            .map(|(i, r)| Observed::new(ObjectId(i as u64 + 1), r.clone()))
            .collect()
    }

    #[test]
    fn test_new_interface_is_created_existing_is_skipped() {
        let desired = vec![access("Gi0/1"), access("Gi0/2")];
        let existing = observed(&[access("Gi0/1")]);

        let result = diff(&desired, &existing, false);

        assert_eq!(result.creates, vec![access("Gi0/2")]);
        assert_eq!(result.skips, vec![Observed::new(ObjectId(1), access("Gi0/1"))]);
        assert!(result.updates.is_empty());
        assert!(result.deletes.is_empty());
    }

    #[test]
    fn test_changed_description_is_an_update() {
        let mut want = access("Gi0/1");
        want.description = "Server-1".into();
        let existing = observed(&[access("Gi0/1")]);

        let result = diff(&[want], &existing, false);

        assert_eq!(result.updates.len(), 1);
        assert_eq!(
            result.updates[0].changes,
            vec![FieldChange {
                field: "description".into(),
                before: json!(""),
                after: json!("Server-1"),
            }]
        );
    }

    #[test]
    fn test_identical_sets_are_all_skips() {
        let desired = vec![access("Gi0/1"), access("Gi0/2"), access("Gi0/3")];
        let result = diff(&desired, &observed(&desired), true);

        assert!(result.is_empty());
        assert_eq!(result.skips.len(), 3);
    }

    #[test]
    fn test_deletes_only_when_enabled() {
        let desired = vec![access("Gi0/1")];
        let existing = observed(&[access("Gi0/1"), access("Gi0/9")]);

        assert!(diff(&desired, &existing, false).deletes.is_empty());

        let with_deletes = diff(&desired, &existing, true);
        assert_eq!(
            with_deletes.deletes,
            vec![Observed::new(ObjectId(2), access("Gi0/9"))]
        );
        assert_eq!(with_deletes.len(), 2);
    }

    #[test]
    fn test_uncompared_fields_are_ignored() {
        let mut want = access("Gi0/1");
        want.ip = Some("10.0.0.1/24".parse().unwrap());
        let result = diff(&[want], &observed(&[access("Gi0/1")]), false);
        assert_eq!(result.skips.len(), 1);
    }

    #[test]
    fn test_explicit_field_subset() {
        let mut want = access("Gi0/1");
        want.description = "changed".into();
        want.mtu = Some(9000);

        let result = diff_with_fields(&[want], &observed(&[access("Gi0/1")]), &["mtu"], false);
        let fields: Vec<_> = result.updates[0]
            .changes
            .iter()
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(fields, vec!["mtu"]);
    }

    #[test]
    fn test_duplicate_desired_keys_keep_first() {
        let mut second = access("Gi0/1");
        second.description = "second".into();

        let result = diff(&[access("Gi0/1"), second], &[], false);
        assert_eq!(result.creates, vec![access("Gi0/1")]);
    }

    #[test]
    fn test_demote_updates() {
        let mut want = access("Gi0/1");
        want.enabled = false;
        let mut result = diff(&[want.clone()], &observed(&[access("Gi0/1")]), false);

        result.demote_updates();
        assert!(result.updates.is_empty());
        assert_eq!(result.skips, vec![Observed::new(ObjectId(1), want)]);
        assert_eq!(
            result.category_of(&DeviceScopedKey::new("sw1", "Gi0/1")),
            Some(ChangeCategory::Skip)
        );
    }

    #[test]
    fn test_preview_and_projected_stats() {
        let mut changed = access("Gi0/1");
        changed.description = "uplink".into();
        let desired = vec![changed, access("Gi0/2")];
        let result = diff(&desired, &observed(&[access("Gi0/1"), access("Gi0/3")]), true);

        let stats = result.projected_stats();
        assert_eq!((stats.created, stats.updated, stats.deleted, stats.skipped), (1, 1, 1, 0));

        let preview = result.preview();
        assert_eq!(preview.kind, EntityKind::Interface);
        let categories: Vec<_> = preview
            .items
            .iter()
            .map(|i| (i.key.as_str(), i.category))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("sw1:Gi0/2", ChangeCategory::Create),
                ("sw1:Gi0/1", ChangeCategory::Update),
                ("sw1:Gi0/3", ChangeCategory::Delete),
            ]
        );

        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["items"][1]["changes"][0]["after"], "uplink");
    }
}
