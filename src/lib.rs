//! Admission probability engine for daycare waitlists.
//!
//! Vacancy-event history feeds a conjugate Gamma-Poisson posterior over the
//! per-seat vacancy rate; admission within a horizon is then a
//! Negative-Binomial survival question over the applicant's effective
//! waiting position. The engine wraps that kernel with regional
//! normalization, community-signal evidence, letter grading, and a
//! staleness-tolerant result cache, all behind injected store and clock
//! traits so embedders choose their own persistence and time source.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod stores;
pub mod telemetry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, TelemetryConfig};
pub use engine::domain::{
    AgeBand, EvidenceCard, EvidenceDetail, Grade, Posterior, PriorityType, ScoreInput,
    ScoreResult, WaitMonths,
};
pub use engine::region::RegionKey;
pub use engine::{format_summary, AdmissionEngine};
pub use error::{EngineError, ValidationError};
