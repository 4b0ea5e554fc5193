use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::params;
use crate::engine::region::RegionKey;
use crate::error::ValidationError;

/// Age band of the child, matching the six daycare class years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "0")]
    Age0,
    #[serde(rename = "1")]
    Age1,
    #[serde(rename = "2")]
    Age2,
    #[serde(rename = "3")]
    Age3,
    #[serde(rename = "4")]
    Age4,
    #[serde(rename = "5")]
    Age5,
}

impl AgeBand {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Age0,
            Self::Age1,
            Self::Age2,
            Self::Age3,
            Self::Age4,
            Self::Age5,
        ]
    }

    /// Convert a raw age in years into the band, rejecting anything outside
    /// 0..=5. Age bands are normally constrained upstream, so a failure here
    /// is an integration bug.
    pub fn from_years(years: u32) -> Result<Self, ValidationError> {
        match years {
            0 => Ok(Self::Age0),
            1 => Ok(Self::Age1),
            2 => Ok(Self::Age2),
            3 => Ok(Self::Age3),
            4 => Ok(Self::Age4),
            5 => Ok(Self::Age5),
            other => Err(ValidationError::InvalidAgeBand(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Age0 => "0",
            Self::Age1 => "1",
            Self::Age2 => "2",
            Self::Age3 => "3",
            Self::Age4 => "4",
            Self::Age5 => "5",
        }
    }
}

impl std::str::FromStr for AgeBand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidAgeBand(s.to_string()))
            .and_then(Self::from_years)
    }
}

/// Priority category of the applicant household. Each category carries a
/// fixed bonus expressed in waiting-list positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityType {
    Disability,
    SingleParent,
    LowIncome,
    MultiChild,
    Sibling,
    DualIncome,
    General,
}

impl PriorityType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Disability => "disability",
            Self::SingleParent => "single parent",
            Self::LowIncome => "low income",
            Self::MultiChild => "multi-child household",
            Self::Sibling => "sibling enrolled",
            Self::DualIncome => "dual income",
            Self::General => "general",
        }
    }
}

/// Letter grade derived from the calibrated score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// Score to grade via the descending bucket table. Total over 0..=100.
    pub fn from_score(score: u8) -> Self {
        for bucket in params::GRADE_BUCKETS {
            if score >= bucket.min_score {
                return bucket.grade;
            }
        }
        Self::F
    }

    /// Alternate mapping over the raw 6-month probability, used by the
    /// product's newer response shape. Kept in sync with the score buckets.
    pub fn from_p6m(p6m: f64) -> Self {
        for bucket in params::GRADE_BUCKETS_P6M {
            if p6m >= bucket.min_p6m {
                return bucket.grade;
            }
        }
        Self::F
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

/// Immutable per-request input to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    pub facility_id: String,
    pub child_age_band: AgeBand,
    /// Self-reported waiting position; zero is treated as absent.
    #[serde(default)]
    pub waiting_position: Option<u32>,
    pub priority_type: PriorityType,
}

/// Median / 80th-percentile wait estimates in fractional months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaitMonths {
    pub median: f64,
    pub p80: f64,
}

/// Gamma posterior over the vacancy rate per seat-month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posterior {
    pub alpha: f64,
    pub beta: f64,
}

/// Provenance of the posterior behind a vacancy evidence card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosteriorMethod {
    /// Posterior updated from observed vacancy events.
    GammaPosterior,
    /// Prior only; history was too thin to update.
    GammaPrior,
}

/// Typed payload of an evidence card. A closed set: renderers match
/// exhaustively instead of probing a loose data bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvidenceDetail {
    Vacancy {
        vacancies: u32,
        seat_months: f64,
        rho_observed: f64,
        method: PosteriorMethod,
        alpha_post: f64,
        beta_post: f64,
    },
    Community {
        total_sources: u32,
        groups: u32,
        avg_wait_months: Option<f64>,
        avg_sentiment: f64,
        k_threshold: u32,
    },
    Seasonal {
        months_ahead: [u32; 6],
        effective_horizon: f64,
        expected_seats: f64,
        multipliers: [f64; 6],
    },
    Position {
        sample_size: u32,
        avg_wait_months: f64,
        success_rate: f64,
        definition: String,
    },
}

/// One entry of the human-readable evidence trail behind a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceCard {
    pub summary: String,
    /// Strength of this piece of evidence in [0, 1].
    pub strength: f64,
    #[serde(flatten)]
    pub detail: EvidenceDetail,
}

/// Full engine output. Produced fresh or replayed from cache, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Probability of admission within 6 months.
    pub probability: f64,
    /// Calibrated score in [1, 99].
    pub score: u8,
    pub grade: Grade,
    pub confidence: f64,
    pub wait_months: WaitMonths,
    pub effective_waiting: u32,
    pub posterior: Posterior,
    pub evidence_cards: Vec<EvidenceCard>,
    pub version: String,
    pub as_of: DateTime<Utc>,
    pub facility_id: String,
    pub facility_name: String,
    pub region_key: RegionKey,
    pub is_heuristic_mode: bool,
}
