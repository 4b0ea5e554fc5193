//! In-memory store implementations backing the test suites and lightweight
//! embeddings. Production deployments bind the traits to the real document
//! store instead.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    ActiveBlocks, BlockStore, CacheEntry, CacheStore, CommunityAggregate, CommunityStore, Facility,
    FacilityStore, SnapshotStore, StoreError, WaitlistSnapshot,
};
use crate::engine::domain::AgeBand;

/// Read-side store over plain maps and vecs, safe under concurrent readers.
#[derive(Default)]
pub struct MemoryAdmissionStore {
    facilities: Mutex<HashMap<String, Facility>>,
    snapshots: Mutex<Vec<WaitlistSnapshot>>,
    blocks: Mutex<HashMap<String, (ActiveBlocks, DateTime<Utc>)>>,
    aggregates: Mutex<Vec<CommunityAggregate>>,
}

impl MemoryAdmissionStore {
    pub fn insert_facility(&self, facility: Facility) {
        self.facilities
            .lock()
            .expect("facility mutex poisoned")
            .insert(facility.facility_id.clone(), facility);
    }

    pub fn push_snapshot(&self, snapshot: WaitlistSnapshot) {
        self.snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .push(snapshot);
    }

    /// Register prebuilt blocks valid until `valid_until`.
    pub fn set_blocks(&self, facility_id: &str, blocks: ActiveBlocks, valid_until: DateTime<Utc>) {
        self.blocks
            .lock()
            .expect("block mutex poisoned")
            .insert(facility_id.to_string(), (blocks, valid_until));
    }

    pub fn push_aggregate(&self, aggregate: CommunityAggregate) {
        self.aggregates
            .lock()
            .expect("aggregate mutex poisoned")
            .push(aggregate);
    }
}

#[async_trait]
impl FacilityStore for MemoryAdmissionStore {
    async fn find_by_id(&self, facility_id: &str) -> Result<Option<Facility>, StoreError> {
        let guard = self.facilities.lock().expect("facility mutex poisoned");
        Ok(guard.get(facility_id).cloned())
    }
}

#[async_trait]
impl SnapshotStore for MemoryAdmissionStore {
    async fn latest(
        &self,
        facility_id: &str,
        age_band: AgeBand,
    ) -> Result<Option<WaitlistSnapshot>, StoreError> {
        let guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        Ok(guard
            .iter()
            .filter(|s| {
                s.facility_id == facility_id && s.waitlist_by_class.contains_key(&age_band)
            })
            .max_by_key(|s| s.snapshot_date)
            .cloned())
    }

    async fn list_since(
        &self,
        facility_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<WaitlistSnapshot>, StoreError> {
        let guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        let mut rows: Vec<WaitlistSnapshot> = guard
            .iter()
            .filter(|s| {
                s.facility_id == facility_id && s.snapshot_date >= since && s.change.is_some()
            })
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.snapshot_date);
        rows.truncate(limit);
        Ok(rows)
    }
}

#[async_trait]
impl BlockStore for MemoryAdmissionStore {
    async fn find_active(
        &self,
        facility_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveBlocks>, StoreError> {
        let guard = self.blocks.lock().expect("block mutex poisoned");
        Ok(guard
            .get(facility_id)
            .filter(|(_, valid_until)| *valid_until > now)
            .map(|(blocks, _)| blocks.clone()))
    }
}

#[async_trait]
impl CommunityStore for MemoryAdmissionStore {
    async fn find(
        &self,
        facility_id: &str,
        min_confidence: f64,
    ) -> Result<Vec<CommunityAggregate>, StoreError> {
        let guard = self.aggregates.lock().expect("aggregate mutex poisoned");
        Ok(guard
            .iter()
            .filter(|a| a.facility_id == facility_id && a.confidence >= min_confidence)
            .cloned()
            .collect())
    }
}

/// Cache store over a plain map. Upserts are last-write-wins, matching the
/// accepted race of the document-store cache.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, cache_key: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .get(cache_key)
            .cloned()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, cache_key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let guard = self.entries.lock().expect("cache mutex poisoned");
        Ok(guard.get(cache_key).cloned())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError> {
        let mut guard = self.entries.lock().expect("cache mutex poisoned");
        guard.insert(entry.cache_key.clone(), entry);
        Ok(())
    }
}
