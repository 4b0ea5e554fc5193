//! Admission probability engine: Gamma-Poisson posterior over vacancy
//! arrivals, Negative-Binomial predictive survival over seasonal horizons,
//! heuristic fallbacks for data-poor facilities, and a staleness-tolerant
//! result cache.

pub mod bayesian;
pub mod domain;
pub mod math;
pub mod normalize;
pub mod params;
pub mod probability;
pub mod region;

pub(crate) mod cache;
pub(crate) mod evidence;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{Datelike, Months};
use tracing::warn;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use bayesian::BayesianContext;
use domain::{Grade, Posterior, ScoreInput, ScoreResult, WaitMonths};
use probability::AdmissionProbability;

use crate::stores::{AdmissionStore, CacheStore, Facility};

/// Stateless per-request scoring engine. All collaborators are injected;
/// the only shared state is the idempotent result cache.
pub struct AdmissionEngine<D, C, K> {
    store: Arc<D>,
    cache: Arc<C>,
    clock: K,
    config: EngineConfig,
}

impl<D, C, K> AdmissionEngine<D, C, K>
where
    D: AdmissionStore,
    C: CacheStore,
    K: Clock,
{
    pub fn new(store: Arc<D>, cache: Arc<C>, clock: K, config: EngineConfig) -> Self {
        Self {
            store,
            cache,
            clock,
            config,
        }
    }

    /// Estimate the admission probability for one applicant at one facility.
    ///
    /// Missing upstream data degrades to documented heuristics; only invalid
    /// structured input and non-cache store failures surface as errors.
    pub async fn calculate(&self, input: &ScoreInput) -> Result<ScoreResult, EngineError> {
        let now = self.clock.now();
        let current_month = now.month();
        let original_waiting = input.waiting_position.unwrap_or(0);

        // The three reads are independent; fan out and rejoin. The snapshot
        // read is skipped entirely when the caller supplied a position.
        let (facility, latest_snapshot, blocks) = tokio::join!(
            self.store.find_by_id(&input.facility_id),
            async {
                if original_waiting == 0 {
                    self.store
                        .latest(&input.facility_id, input.child_age_band)
                        .await
                } else {
                    Ok(None)
                }
            },
            self.store.find_active(&input.facility_id, now),
        );

        let facility = facility?
            .unwrap_or_else(|| Facility::fallback(&input.facility_id, self.config.default_capacity));
        let latest_snapshot = latest_snapshot?;
        let blocks = match blocks {
            Ok(blocks) => blocks,
            Err(err) => {
                warn!(facility_id = %input.facility_id, error = %err, "prebuilt block read failed");
                None
            }
        };

        let normalized = normalize::normalize(input, &facility, latest_snapshot.as_ref(), &self.config);
        let cache_key = math::cache_key(input, normalized.effective_waiting);

        if let Some(cached) = cache::lookup(
            self.cache.as_ref(),
            &cache_key,
            original_waiting,
            now,
            self.config.cache_drift_tolerance,
        )
        .await
        {
            return Ok(cached);
        }

        let prior_mean = params::gamma_prior_mean(normalized.region, input.child_age_band);
        let bayesian = match blocks.as_ref().and_then(|b| b.vacancy.as_ref()) {
            Some(block) if block.confidence >= params::MIN_PREBUILT_CONFIDENCE => {
                BayesianContext::from_prebuilt(block, prior_mean, normalized.normalization)
            }
            _ => {
                let since = now - Months::new(self.config.snapshot_window_months);
                let rows = self
                    .store
                    .list_since(&input.facility_id, since, self.config.snapshot_scan_limit)
                    .await?;
                BayesianContext::from_snapshots(
                    &rows,
                    normalized.capacity_eff,
                    prior_mean,
                    normalized.normalization,
                    self.config.event_timeout_hours,
                )
            }
        };

        let bundle = evidence::build_evidence(
            self.store.as_ref(),
            input,
            blocks.as_ref(),
            &normalized,
            &bayesian,
            current_month,
        )
        .await?;

        let probability = AdmissionProbability::new(
            normalized.effective_waiting,
            normalized.capacity_eff,
            bundle.alpha_post,
            bundle.beta_post,
            current_month,
        )?;
        let p6m = probability.at(6);

        let raw_score = (100.0 * p6m).round() as usize;
        let calibrated = params::calibration_curve(normalized.region)[raw_score.min(100)];
        let score = calibrated.clamp(1, 99);

        // Coefficient of variation of the Gamma posterior, squashed into a
        // confidence figure. The heuristic path gets a floor: the answer is
        // uncertain, not worthless.
        let mean = bundle.alpha_post / bundle.beta_post;
        let variance = bundle.alpha_post / (bundle.beta_post * bundle.beta_post);
        let cv = if mean > 0.0 { variance.sqrt() / mean } else { 1.0 };
        let raw_confidence = math::sigmoid(-cv * 3.0 + 1.0);
        let is_heuristic_mode = bundle.alpha_post < 1.0;
        let floor = if is_heuristic_mode {
            params::MIN_HEURISTIC_CONFIDENCE
        } else {
            0.0
        };
        let confidence = math::round_to(raw_confidence.max(floor), 2);

        let wait_months = WaitMonths {
            median: math::find_wait_months_interpolated(
                0.5,
                |h| probability.at(h),
                math::MAX_WAIT_HORIZON,
            ),
            p80: math::find_wait_months_interpolated(
                0.8,
                |h| probability.at(h),
                math::MAX_WAIT_HORIZON,
            ),
        };

        let result = ScoreResult {
            probability: math::round_to(p6m, 4),
            score,
            grade: Grade::from_score(score),
            confidence,
            wait_months,
            effective_waiting: normalized.effective_waiting,
            posterior: Posterior {
                alpha: math::round_to(bundle.alpha_post, 4),
                beta: math::round_to(bundle.beta_post, 4),
            },
            evidence_cards: bundle.cards,
            version: math::ENGINE_VERSION.to_string(),
            as_of: now,
            facility_id: input.facility_id.clone(),
            facility_name: normalized.facility_name.clone(),
            region_key: normalized.region,
            is_heuristic_mode,
        };

        cache::write_through(
            self.cache.as_ref(),
            cache_key,
            input,
            normalized.effective_waiting,
            &result,
            now,
            self.config.cache_ttl,
        )
        .await;

        Ok(result)
    }
}

/// Fixed-structure text block consumed by the chat UI. Line order and the
/// presence of each element are a compatibility surface; change nothing
/// without coordinating with the bot layer.
pub fn format_summary(result: &ScoreResult) -> String {
    let mut lines = Vec::new();

    lines.push(format!(
        "Admission probability within 6 months: {}% (grade {}, score {}, confidence {}%)",
        (result.probability * 100.0).round() as i64,
        result.grade.as_str(),
        result.score,
        (result.confidence * 100.0).round() as i64,
    ));
    lines.push(String::new());
    lines.push("Evidence:".to_string());

    for card in &result.evidence_cards {
        lines.push(format!("• {}", card.summary));
    }

    lines.push(String::new());
    lines.push(format!(
        "Estimated wait: {} months (within {} months at 80% probability)",
        result.wait_months.median, result.wait_months.p80,
    ));
    lines.push(format!(
        "Effective waiting position: {}",
        result.effective_waiting
    ));

    lines.join("\n")
}
