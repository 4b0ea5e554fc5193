//! Shared fixtures for the engine scenario tests: seeded in-memory stores,
//! a pinned clock, and input builders.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::clock::FixedClock;
use crate::config::EngineConfig;
use crate::engine::domain::{AgeBand, PriorityType, ScoreInput};
use crate::engine::AdmissionEngine;
use crate::stores::memory::{MemoryAdmissionStore, MemoryCacheStore};
use crate::stores::{Facility, SnapshotChange, WaitlistSnapshot};

pub type TestEngine = AdmissionEngine<MemoryAdmissionStore, MemoryCacheStore, FixedClock>;

/// A Tuesday in the middle of the spring intake season.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

pub fn engine_at(
    store: Arc<MemoryAdmissionStore>,
    cache: Arc<MemoryCacheStore>,
    at: DateTime<Utc>,
) -> TestEngine {
    AdmissionEngine::new(store, cache, FixedClock(at), EngineConfig::default())
}

pub fn engine(store: Arc<MemoryAdmissionStore>, cache: Arc<MemoryCacheStore>) -> TestEngine {
    engine_at(store, cache, now())
}

pub fn facility(facility_id: &str, capacity: u32, address: &str) -> Facility {
    Facility {
        facility_id: facility_id.to_string(),
        name: "Sunny Daycare".to_string(),
        capacity: Some(capacity),
        capacity_by_class: BTreeMap::new(),
        address: address.to_string(),
    }
}

pub fn input(facility_id: &str, waiting: Option<u32>) -> ScoreInput {
    ScoreInput {
        facility_id: facility_id.to_string(),
        child_age_band: AgeBand::Age2,
        waiting_position: waiting,
        priority_type: PriorityType::General,
    }
}

/// Seed thirteen monthly snapshots covering the scan window. Indices in
/// `vacancy_at` carry a single-seat vacancy detection; everything else is a
/// quiet observation, so each detection closes as its own event.
pub fn seed_monthly_history(store: &MemoryAdmissionStore, facility_id: &str, vacancy_at: &[usize]) {
    for i in 0..=12usize {
        let date = now() - Duration::days(360 - 30 * i as i64);
        let vacancy = vacancy_at.contains(&i);
        store.push_snapshot(WaitlistSnapshot {
            facility_id: facility_id.to_string(),
            snapshot_date: date,
            waitlist_by_class: BTreeMap::new(),
            change: Some(SnapshotChange {
                enrolled_delta: if vacancy { -1 } else { 0 },
                vacancy_detected: vacancy,
            }),
        });
    }
}
