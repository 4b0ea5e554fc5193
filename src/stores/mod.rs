//! Collaborator contracts around the document store, plus the documents
//! themselves. The engine only ever sees these traits; production wiring
//! binds them to the real collections, tests bind them to the in-memory
//! implementations in [`memory`].

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::domain::{AgeBand, PriorityType, ScoreResult};

/// Facility document owned by the upstream ingest pipeline. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub facility_id: String,
    pub name: String,
    /// Total licensed capacity, when only an aggregate figure is known.
    pub capacity: Option<u32>,
    /// Per-class capacity, preferred over the total when present.
    #[serde(default)]
    pub capacity_by_class: BTreeMap<AgeBand, u32>,
    pub address: String,
}

impl Facility {
    /// Synthesized record for facilities absent from the store, including
    /// synthetic `heuristic:` ids minted by the recommendation layer. The
    /// engine degrades to heuristics instead of failing.
    pub fn fallback(facility_id: &str, default_capacity: u32) -> Self {
        let name = match facility_id.strip_prefix("heuristic:") {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => "daycare".to_string(),
        };
        Self {
            facility_id: facility_id.to_string(),
            name,
            capacity: Some(default_capacity),
            capacity_by_class: BTreeMap::new(),
            address: String::new(),
        }
    }
}

/// Diff of two consecutive facility snapshots, produced by the crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotChange {
    pub enrolled_delta: i64,
    pub vacancy_detected: bool,
}

/// Append-only waitlist observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistSnapshot {
    pub facility_id: String,
    pub snapshot_date: DateTime<Utc>,
    #[serde(default)]
    pub waitlist_by_class: BTreeMap<AgeBand, u32>,
    pub change: Option<SnapshotChange>,
}

/// Precomputed vacancy aggregate produced by the batch job. An acceleration
/// structure, not authoritative truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrebuiltVacancy {
    pub confidence: f64,
    pub vacancies: u32,
    pub seat_months: f64,
    pub rho_observed: f64,
    pub alpha_post: f64,
    pub beta_post: f64,
}

/// Precomputed community-signal aggregate for a facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySignal {
    pub confidence: f64,
    pub intel_enriched: bool,
    pub intel_source_count: u32,
    pub mention_count: u32,
    pub avg_reported_wait_months: Option<f64>,
    pub competition_level: Option<String>,
    pub avg_sentiment: f64,
    pub k_threshold: u32,
}

/// Active prebuilt blocks for one facility, already filtered to unexpired
/// rows by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActiveBlocks {
    pub vacancy: Option<PrebuiltVacancy>,
    pub community: Option<CommunitySignal>,
}

/// Row of the anonymous community-aggregate collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityAggregate {
    pub facility_id: String,
    pub source_count: u32,
    pub avg_sentiment: f64,
    pub confidence: f64,
}

/// Stored score result plus the pre-adjustment waiting position it was built
/// from, so small self-reported drift can be tolerated on replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub result: ScoreResult,
    pub facility_id: String,
    pub child_age_band: AgeBand,
    pub priority_type: PriorityType,
    pub original_waiting_position: u32,
    pub effective_waiting: u32,
    pub expire_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document-store failure. Propagated to the caller except where a read is
/// documented to degrade (prebuilt blocks) or the operation is best-effort
/// (cache).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("query exceeded its time budget: {0}")]
    Timeout(String),
    #[error("malformed document: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait FacilityStore: Send + Sync {
    async fn find_by_id(&self, facility_id: &str) -> Result<Option<Facility>, StoreError>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Most recent snapshot carrying a waitlist count for the age band.
    async fn latest(
        &self,
        facility_id: &str,
        age_band: AgeBand,
    ) -> Result<Option<WaitlistSnapshot>, StoreError>;

    /// Snapshots with a change record since `since`, ascending by time,
    /// capped at `limit` rows.
    async fn list_since(
        &self,
        facility_id: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<WaitlistSnapshot>, StoreError>;
}

#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Active, unexpired prebuilt blocks for the facility as of `now`.
    async fn find_active(
        &self,
        facility_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveBlocks>, StoreError>;
}

#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn find(
        &self,
        facility_id: &str,
        min_confidence: f64,
    ) -> Result<Vec<CommunityAggregate>, StoreError>;
}

/// Umbrella over the read-side contracts so the engine takes one store
/// generic instead of four.
pub trait AdmissionStore: FacilityStore + SnapshotStore + BlockStore + CommunityStore {}

impl<T> AdmissionStore for T where T: FacilityStore + SnapshotStore + BlockStore + CommunityStore {}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, cache_key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Idempotent upsert keyed by `entry.cache_key`. Concurrent writers for
    /// the same key are an accepted last-write-wins race.
    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError>;
}
