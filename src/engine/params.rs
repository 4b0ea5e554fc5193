//! Static parameter tables for the scoring model. Pure data, versioned via
//! [`crate::engine::math::ENGINE_VERSION`] and
//! [`crate::engine::math::CALIBRATION_VERSION`].

use crate::engine::domain::{AgeBand, Grade, PriorityType};
use crate::engine::region::RegionKey;

/// Pseudo-exposure (seat-months) backing the Gamma prior.
pub const PSEUDO_EXPOSURE: f64 = 3.0;

/// Minimum distinct sources before an anonymous community aggregate may be
/// surfaced.
pub const K_ANONYMITY_THRESHOLD: u32 = 3;

/// Confidence floor for querying the community-aggregate collection.
pub const MIN_CONFIDENCE_FOR_COMMUNITY: f64 = 0.6;

/// National-average vacancy rate per seat-month, roughly five openings per
/// year in a class of twelve. Drives the Poisson fallback when the posterior
/// is too weak for a stable Negative-Binomial model.
pub const HEURISTIC_VACANCY_RATE: f64 = 0.14;

/// Confidence floor applied whenever the heuristic path produced the score.
pub const MIN_HEURISTIC_CONFIDENCE: f64 = 0.12;

/// Prebuilt blocks below this confidence are ignored in favor of a live scan.
pub const MIN_PREBUILT_CONFIDENCE: f64 = 0.5;

pub struct GradeBucket {
    pub grade: Grade,
    pub min_score: u8,
}

/// Descending by `min_score`; lookup takes the first bucket the score clears.
pub const GRADE_BUCKETS: &[GradeBucket] = &[
    GradeBucket {
        grade: Grade::A,
        min_score: 85,
    },
    GradeBucket {
        grade: Grade::B,
        min_score: 70,
    },
    GradeBucket {
        grade: Grade::C,
        min_score: 55,
    },
    GradeBucket {
        grade: Grade::D,
        min_score: 40,
    },
    GradeBucket {
        grade: Grade::E,
        min_score: 25,
    },
    GradeBucket {
        grade: Grade::F,
        min_score: 0,
    },
];

pub struct P6mGradeBucket {
    pub grade: Grade,
    pub min_p6m: f64,
}

/// Probability-bucketed counterpart of [`GRADE_BUCKETS`], consumed by the
/// newer response shape. The two tables must stay in sync.
pub const GRADE_BUCKETS_P6M: &[P6mGradeBucket] = &[
    P6mGradeBucket {
        grade: Grade::A,
        min_p6m: 0.75,
    },
    P6mGradeBucket {
        grade: Grade::B,
        min_p6m: 0.55,
    },
    P6mGradeBucket {
        grade: Grade::C,
        min_p6m: 0.40,
    },
    P6mGradeBucket {
        grade: Grade::D,
        min_p6m: 0.25,
    },
    P6mGradeBucket {
        grade: Grade::E,
        min_p6m: 0.10,
    },
    P6mGradeBucket {
        grade: Grade::F,
        min_p6m: 0.0,
    },
];

/// Prior mean vacancy rate per seat-month, by region and age band.
pub fn gamma_prior_mean(region: RegionKey, band: AgeBand) -> f64 {
    let row: [f64; 6] = match region {
        RegionKey::Gangnam => [0.005, 0.007, 0.008, 0.010, 0.012, 0.012],
        RegionKey::Seocho => [0.006, 0.008, 0.009, 0.011, 0.012, 0.012],
        RegionKey::Bundang => [0.007, 0.008, 0.010, 0.012, 0.013, 0.013],
        RegionKey::Wirye => [0.007, 0.009, 0.010, 0.012, 0.013, 0.013],
        RegionKey::Seongnam => [0.008, 0.009, 0.011, 0.012, 0.014, 0.014],
        RegionKey::Songpa => [0.006, 0.008, 0.009, 0.011, 0.012, 0.012],
        RegionKey::Default => [0.008, 0.010, 0.011, 0.012, 0.015, 0.015],
    };
    row[band as usize]
}

/// Competition multiplier applied to the raw waiting position.
pub const fn region_competition(region: RegionKey) -> f64 {
    match region {
        RegionKey::Gangnam => 1.4,
        RegionKey::Seocho => 1.35,
        RegionKey::Bundang | RegionKey::Wirye | RegionKey::Songpa => 1.3,
        RegionKey::Seongnam => 1.2,
        RegionKey::Default => 1.15,
    }
}

/// Priority bonus in waiting-list positions.
pub const fn priority_bonus(priority: PriorityType) -> f64 {
    match priority {
        PriorityType::Disability => 8.0,
        PriorityType::SingleParent => 7.0,
        PriorityType::LowIncome => 6.0,
        PriorityType::MultiChild => 5.0,
        PriorityType::Sibling => 4.0,
        PriorityType::DualIncome => 3.0,
        PriorityType::General => 0.0,
    }
}

/// Monthly admission-season weight. March carries the spring intake peak,
/// July the summer trough.
pub const fn seasonal_multiplier(month: u32) -> f64 {
    match month {
        1 => 1.1,
        2 => 1.3,
        3 => 1.5,
        4 => 1.05,
        5 => 1.0,
        6 => 0.95,
        7 => 0.9,
        8 => 1.05,
        9 => 1.15,
        10 => 1.0,
        11 => 1.05,
        12 => 1.15,
        _ => 1.0,
    }
}

/// Share of total facility capacity allotted to each age band when no
/// per-class capacity is recorded.
pub const fn age_band_capacity_ratio(band: AgeBand) -> f64 {
    match band {
        AgeBand::Age0 => 0.10,
        AgeBand::Age1 => 0.15,
        AgeBand::Age2 | AgeBand::Age3 | AgeBand::Age4 => 0.20,
        AgeBand::Age5 => 0.15,
    }
}

const fn identity_calibration() -> [u8; 101] {
    let mut curve = [0u8; 101];
    let mut i = 0;
    while i <= 100 {
        curve[i] = if i < 1 {
            1
        } else if i > 99 {
            99
        } else {
            i as u8
        };
        i += 1;
    }
    curve
}

const IDENTITY_CALIBRATION: [u8; 101] = identity_calibration();

/// Per-region calibration of the raw 0..=100 score. Currently identity for
/// every region; the indirection is the injection point for recalibration
/// from observed admission outcomes.
pub fn calibration_curve(region: RegionKey) -> &'static [u8; 101] {
    match region {
        RegionKey::Wirye
        | RegionKey::Bundang
        | RegionKey::Gangnam
        | RegionKey::Seocho
        | RegionKey::Songpa
        | RegionKey::Seongnam
        | RegionKey::Default => &IDENTITY_CALIBRATION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_curve_stays_inside_score_bounds() {
        for region in [RegionKey::Gangnam, RegionKey::Default] {
            let curve = calibration_curve(region);
            assert_eq!(curve[0], 1);
            assert_eq!(curve[50], 50);
            assert_eq!(curve[100], 99);
        }
    }

    #[test]
    fn competitive_regions_multiply_at_least_default() {
        let regions = [
            RegionKey::Wirye,
            RegionKey::Bundang,
            RegionKey::Gangnam,
            RegionKey::Seocho,
            RegionKey::Songpa,
            RegionKey::Seongnam,
        ];
        for region in regions {
            assert!(region_competition(region) >= region_competition(RegionKey::Default));
        }
        assert!(region_competition(RegionKey::Default) >= 1.15);
    }

    #[test]
    fn seasonal_table_peaks_in_march_and_troughs_in_july() {
        assert_eq!(seasonal_multiplier(3), 1.5);
        assert_eq!(seasonal_multiplier(7), 0.9);
        for month in 1..=12 {
            assert!(seasonal_multiplier(month) > 0.0);
        }
    }

    #[test]
    fn capacity_ratios_cover_all_bands() {
        let total: f64 = AgeBand::ordered()
            .into_iter()
            .map(age_band_capacity_ratio)
            .sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
