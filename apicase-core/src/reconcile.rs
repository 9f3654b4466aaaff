//! Timestamp-driven reconciliation of catalog items against imported records.
//!
//! Remote data only ever creates or updates local records, and only when the
//! remote update time is strictly greater. Nothing is deleted.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::case::CanonicalTestCase;

/// Locally stored projection of a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedRecord {
    /// Local row id; `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub project_id: i64,
    pub external_id: i64,
    /// Remote update time when last imported, epoch seconds.
    pub up_time: i64,
    pub name: String,
    pub method: String,
    pub url: String,
    pub body: CanonicalTestCase,
    /// Category tree node the record hangs under; 0 when unknown.
    pub relation: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

/// Item ids to fetch, split by what happens to them locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub create: Vec<i64>,
    pub update: Vec<i64>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty()
    }

    /// Every id in the plan, creates first.
    pub fn ids(&self) -> Vec<i64> {
        self.create.iter().chain(&self.update).copied().collect()
    }
}

/// Compares remote and local `{external id -> update time}` mappings.
///
/// Ids missing locally are created; ids whose remote time is strictly newer
/// are updated. Both lists come out in ascending id order.
pub fn diff_for_sync(remote: &BTreeMap<i64, i64>, local: &BTreeMap<i64, i64>) -> SyncPlan {
    let mut plan = SyncPlan::default();
    for (&id, &remote_time) in remote {
        match local.get(&id) {
            None => plan.create.push(id),
            Some(&local_time) if remote_time > local_time => plan.update.push(id),
            Some(_) => {}
        }
    }
    plan
}

/// Splits fresh records into `(updates, creates)` against what was imported.
///
/// An update keeps the imported record's identity, relation and creator and
/// takes method, name, url, body and update time from the fresh record.
/// Fresh records that are not newer are dropped.
pub fn merge_api(
    fresh: Vec<ImportedRecord>,
    imported: &[ImportedRecord],
) -> (Vec<ImportedRecord>, Vec<ImportedRecord>) {
    let by_external_id: HashMap<i64, &ImportedRecord> = imported
        .iter()
        .map(|record| (record.external_id, record))
        .collect();

    let mut updates = Vec::new();
    let mut creates = Vec::new();

    for record in fresh {
        match by_external_id.get(&record.external_id) {
            None => creates.push(record),
            Some(existing) if record.up_time > existing.up_time => {
                let mut updated = (*existing).clone();
                updated.method = record.method;
                updated.name = record.name;
                updated.url = record.url;
                updated.body = record.body;
                updated.up_time = record.up_time;
                updates.push(updated);
            }
            Some(_) => {}
        }
    }

    (updates, creates)
}

/// `{external id -> update time}` for already imported records.
pub fn uptime_index(imported: &[ImportedRecord]) -> BTreeMap<i64, i64> {
    imported
        .iter()
        .map(|record| (record.external_id, record.up_time))
        .collect()
}
