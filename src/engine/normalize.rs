use crate::config::EngineConfig;
use crate::engine::bayesian::CapacityNormalization;
use crate::engine::domain::ScoreInput;
use crate::engine::params;
use crate::engine::region::{resolve_region, RegionKey};
use crate::stores::{Facility, WaitlistSnapshot};

/// Request inputs after capacity, region, and waiting-position resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub facility_name: String,
    pub region: RegionKey,
    pub capacity_eff: f64,
    pub normalization: CapacityNormalization,
    /// Raw waiting position after fallback resolution, before adjustment.
    pub waiting_position: u32,
    /// Competition- and priority-adjusted position. Never negative.
    pub effective_waiting: u32,
}

/// Resolve effective capacity, region, and the effective waiting position.
///
/// A supplied or snapshot-derived waiting position of zero counts as absent
/// and falls through to the capacity-based fallback, so the engine always
/// has a position to reason about.
pub fn normalize(
    input: &ScoreInput,
    facility: &Facility,
    latest_snapshot: Option<&WaitlistSnapshot>,
    config: &EngineConfig,
) -> NormalizedInput {
    let region = resolve_region(&facility.address);

    let band = input.child_age_band;
    let (capacity_eff, normalization) = match facility.capacity_by_class.get(&band) {
        Some(per_class) => (f64::from(*per_class), CapacityNormalization::ByClass),
        None => {
            let total = f64::from(facility.capacity.unwrap_or(0));
            (
                total * params::age_band_capacity_ratio(band),
                CapacityNormalization::TotalFacility,
            )
        }
    };
    let capacity_eff = capacity_eff.max(1.0);

    let mut waiting_position = input.waiting_position.unwrap_or(0);
    if waiting_position == 0 {
        waiting_position = latest_snapshot
            .and_then(|snapshot| snapshot.waitlist_by_class.get(&band).copied())
            .unwrap_or(0);
    }
    if waiting_position == 0 {
        waiting_position = (capacity_eff * config.fallback_waiting_multiplier).round() as u32;
    }

    let competition = params::region_competition(region);
    let bonus = params::priority_bonus(input.priority_type);
    let effective_waiting =
        (f64::from(waiting_position) * competition - bonus).ceil().max(0.0) as u32;

    NormalizedInput {
        facility_name: facility.name.clone(),
        region,
        capacity_eff,
        normalization,
        waiting_position,
        effective_waiting,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::domain::{AgeBand, PriorityType};
    use crate::stores::SnapshotChange;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn facility(address: &str, capacity: Option<u32>) -> Facility {
        Facility {
            facility_id: "fac-1".to_string(),
            name: "Sunny Daycare".to_string(),
            capacity,
            capacity_by_class: BTreeMap::new(),
            address: address.to_string(),
        }
    }

    fn input(waiting: Option<u32>, priority: PriorityType) -> ScoreInput {
        ScoreInput {
            facility_id: "fac-1".to_string(),
            child_age_band: AgeBand::Age2,
            waiting_position: waiting,
            priority_type: priority,
        }
    }

    #[test]
    fn per_class_capacity_wins_over_ratio() {
        let mut fac = facility("", Some(100));
        fac.capacity_by_class.insert(AgeBand::Age2, 15);
        let normalized = normalize(
            &input(Some(10), PriorityType::General),
            &fac,
            None,
            &EngineConfig::default(),
        );
        assert_eq!(normalized.capacity_eff, 15.0);
        assert_eq!(normalized.normalization, CapacityNormalization::ByClass);
    }

    #[test]
    fn total_capacity_is_scaled_by_age_band_ratio() {
        let normalized = normalize(
            &input(Some(10), PriorityType::General),
            &facility("", Some(100)),
            None,
            &EngineConfig::default(),
        );
        assert_eq!(normalized.capacity_eff, 20.0);
        assert_eq!(
            normalized.normalization,
            CapacityNormalization::TotalFacility
        );
    }

    #[test]
    fn capacity_is_floored_at_one() {
        let normalized = normalize(
            &input(Some(10), PriorityType::General),
            &facility("", None),
            None,
            &EngineConfig::default(),
        );
        assert_eq!(normalized.capacity_eff, 1.0);
    }

    #[test]
    fn snapshot_count_backfills_missing_waiting_position() {
        let mut by_class = BTreeMap::new();
        by_class.insert(AgeBand::Age2, 7);
        let snapshot = WaitlistSnapshot {
            facility_id: "fac-1".to_string(),
            snapshot_date: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            waitlist_by_class: by_class,
            change: Some(SnapshotChange {
                enrolled_delta: 0,
                vacancy_detected: false,
            }),
        };
        let normalized = normalize(
            &input(None, PriorityType::General),
            &facility("", Some(100)),
            Some(&snapshot),
            &EngineConfig::default(),
        );
        assert_eq!(normalized.waiting_position, 7);
    }

    #[test]
    fn double_capacity_fallback_applies_without_any_signal() {
        let normalized = normalize(
            &input(None, PriorityType::General),
            &facility("", Some(100)),
            None,
            &EngineConfig::default(),
        );
        // 100 * 0.20 ratio = 20 effective seats, doubled.
        assert_eq!(normalized.waiting_position, 40);
        // Default region multiplies by 1.15: ceil(40 * 1.15) = 46.
        assert_eq!(normalized.effective_waiting, 46);
    }

    #[test]
    fn zero_waiting_position_counts_as_absent() {
        let normalized = normalize(
            &input(Some(0), PriorityType::General),
            &facility("", Some(100)),
            None,
            &EngineConfig::default(),
        );
        assert_eq!(normalized.waiting_position, 40);
    }

    #[test]
    fn priority_bonus_subtracts_positions_and_floors_at_zero() {
        let normalized = normalize(
            &input(Some(10), PriorityType::Disability),
            &facility("서울 강남구", Some(100)),
            None,
            &EngineConfig::default(),
        );
        // ceil(10 * 1.4) - 8 = 6.
        assert_eq!(normalized.effective_waiting, 6);

        let floored = normalize(
            &input(Some(1), PriorityType::Disability),
            &facility("", Some(100)),
            None,
            &EngineConfig::default(),
        );
        assert_eq!(floored.effective_waiting, 0);
    }

    #[test]
    fn region_resolves_from_facility_address() {
        let normalized = normalize(
            &input(Some(10), PriorityType::General),
            &facility("경기도 성남시 분당구 정자동", Some(60)),
            None,
            &EngineConfig::default(),
        );
        assert_eq!(normalized.region, RegionKey::Bundang);
    }
}
