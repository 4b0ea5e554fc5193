use crate::engine::bayesian::BayesianContext;
use crate::engine::domain::{EvidenceCard, EvidenceDetail, PosteriorMethod, ScoreInput};
use crate::engine::math::{self, calc_strength, round_to};
use crate::engine::normalize::NormalizedInput;
use crate::engine::params;
use crate::engine::probability::AdmissionProbability;
use crate::error::EngineError;
use crate::stores::{ActiveBlocks, AdmissionStore};

/// Evidence cards plus the (possibly community-nudged) posterior the final
/// score must be computed from. Community signal is evidence, not just
/// narrative: when strong enough it shifts the posterior itself.
#[derive(Debug, Clone)]
pub(crate) struct EvidenceBundle {
    pub cards: Vec<EvidenceCard>,
    pub alpha_post: f64,
    pub beta_post: f64,
    pub rho_post_mean: f64,
}

pub(crate) async fn build_evidence<D>(
    store: &D,
    input: &ScoreInput,
    blocks: Option<&ActiveBlocks>,
    normalized: &NormalizedInput,
    bayesian: &BayesianContext,
    current_month: u32,
) -> Result<EvidenceBundle, EngineError>
where
    D: AdmissionStore + ?Sized,
{
    let mut cards = Vec::with_capacity(4);
    let mut alpha_post = bayesian.alpha_post;
    let mut beta_post = bayesian.beta_post;
    let mut rho_post_mean = bayesian.rho_post_mean;

    cards.push(vacancy_card(bayesian, normalized));

    let mut has_community_card = false;
    if let Some(signal) = blocks.and_then(|b| b.community.as_ref()) {
        if signal.confidence >= params::MIN_PREBUILT_CONFIDENCE
            && signal.intel_enriched
            && signal.intel_source_count >= 2
        {
            if signal.mention_count > 0 {
                alpha_post += (f64::from(signal.mention_count) * 0.3).min(3.0);
                beta_post += (f64::from(signal.intel_source_count) * 0.5).min(5.0);
                rho_post_mean = alpha_post / beta_post;
            }

            let mut summary = format!(
                "Community intel from {} sources ({} vacancy mentions",
                signal.intel_source_count, signal.mention_count
            );
            if let Some(wait) = signal.avg_reported_wait_months {
                summary.push_str(&format!(", avg reported wait {wait} months"));
            }
            if let Some(level) = &signal.competition_level {
                summary.push_str(&format!(", competition {level}"));
            }
            summary.push(')');

            cards.push(EvidenceCard {
                summary,
                strength: calc_strength(signal.intel_source_count, signal.confidence),
                detail: EvidenceDetail::Community {
                    total_sources: signal.intel_source_count,
                    groups: signal.mention_count,
                    avg_wait_months: signal.avg_reported_wait_months,
                    avg_sentiment: signal.avg_sentiment,
                    k_threshold: signal.k_threshold,
                },
            });
            has_community_card = true;
        }
    }

    cards.push(seasonal_card(normalized, current_month));

    if !has_community_card {
        let aggregates = store
            .find(&input.facility_id, params::MIN_CONFIDENCE_FOR_COMMUNITY)
            .await?;
        let qualified: Vec<_> = aggregates
            .iter()
            .filter(|a| a.source_count >= params::K_ANONYMITY_THRESHOLD)
            .collect();
        if !qualified.is_empty() {
            let groups = qualified.len() as u32;
            let total_sources: u32 = qualified.iter().map(|a| a.source_count).sum();
            let avg_sentiment = qualified.iter().map(|a| a.avg_sentiment).sum::<f64>()
                / f64::from(groups);
            cards.push(EvidenceCard {
                summary: format!(
                    "Anonymous community signal from {} sources ({} groups meeting k>={}, avg sentiment {:+.2})",
                    total_sources,
                    groups,
                    params::K_ANONYMITY_THRESHOLD,
                    avg_sentiment,
                ),
                strength: calc_strength(
                    total_sources,
                    (0.5 + f64::from(groups) * 0.05).min(0.8),
                ),
                detail: EvidenceDetail::Community {
                    total_sources,
                    groups,
                    avg_wait_months: None,
                    avg_sentiment,
                    k_threshold: params::K_ANONYMITY_THRESHOLD,
                },
            });
        }
    }

    // Position card probabilities reflect the nudged posterior.
    let probability = AdmissionProbability::new(
        normalized.effective_waiting,
        normalized.capacity_eff,
        alpha_post,
        beta_post,
        current_month,
    )?;
    let p6m = probability.at(6);
    let median_wait =
        math::find_wait_months_interpolated(0.5, |h| probability.at(h), math::MAX_WAIT_HORIZON);

    let expected_vacancies_6m = if bayesian.alpha_post < 1.0 {
        params::HEURISTIC_VACANCY_RATE * normalized.capacity_eff * 6.0
    } else {
        rho_post_mean * normalized.capacity_eff * 6.0
    };

    let sample_size = bayesian.snapshot_count.max(1) as u32;
    cards.push(EvidenceCard {
        summary: format!(
            "Waiting position {} (effective {} after priority adjustment), expected vacancies {:.0} within 6 months",
            normalized.waiting_position, normalized.effective_waiting, expected_vacancies_6m,
        ),
        strength: calc_strength(
            sample_size,
            if bayesian.snapshot_count >= 3 { 0.75 } else { 0.4 },
        ),
        detail: EvidenceDetail::Position {
            sample_size: bayesian.snapshot_count as u32,
            avg_wait_months: median_wait,
            success_rate: round_to(p6m, 4),
            definition: format!(
                "{}/age {}/capacity {}",
                normalized.region.label(),
                input.child_age_band.as_str(),
                normalized.capacity_eff.round() as u32,
            ),
        },
    });

    Ok(EvidenceBundle {
        cards,
        alpha_post,
        beta_post,
        rho_post_mean,
    })
}

fn vacancy_card(bayesian: &BayesianContext, normalized: &NormalizedInput) -> EvidenceCard {
    if bayesian.from_prebuilt {
        EvidenceCard {
            summary: format!(
                "[prebuilt] {} vacancies / {:.1} seat-months (rho={:.4})",
                bayesian.vacancies, bayesian.seat_months, bayesian.rho_observed,
            ),
            strength: calc_strength(
                bayesian.snapshot_count as u32,
                bayesian.prebuilt_confidence.unwrap_or(0.5),
            ),
            detail: EvidenceDetail::Vacancy {
                vacancies: bayesian.vacancies,
                seat_months: bayesian.seat_months,
                rho_observed: bayesian.rho_observed,
                method: PosteriorMethod::GammaPosterior,
                alpha_post: bayesian.alpha_post,
                beta_post: bayesian.beta_post,
            },
        }
    } else if bayesian.snapshot_count >= 2 {
        let confidence = if bayesian.snapshot_count >= 6 {
            0.85
        } else {
            0.55
        };
        EvidenceCard {
            summary: format!(
                "Observed {:.1} seat-months with {} vacancies (rho={:.4}/seat-month, ~{:.1}/month at capacity {})",
                bayesian.seat_months,
                bayesian.vacancies,
                bayesian.rho_observed,
                bayesian.rho_observed * normalized.capacity_eff,
                normalized.capacity_eff.round() as u32,
            ),
            strength: calc_strength(bayesian.snapshot_count as u32, confidence),
            detail: EvidenceDetail::Vacancy {
                vacancies: bayesian.vacancies,
                seat_months: bayesian.seat_months,
                rho_observed: bayesian.rho_observed,
                method: PosteriorMethod::GammaPosterior,
                alpha_post: bayesian.alpha_post,
                beta_post: bayesian.beta_post,
            },
        }
    } else {
        EvidenceCard {
            summary: format!(
                "Insufficient snapshots ({}). National-average estimate (vacancy_rate={}, E0={})",
                bayesian.snapshot_count,
                params::HEURISTIC_VACANCY_RATE,
                params::PSEUDO_EXPOSURE,
            ),
            strength: calc_strength(1, 0.3),
            detail: EvidenceDetail::Vacancy {
                vacancies: 0,
                seat_months: 0.0,
                rho_observed: 0.0,
                method: PosteriorMethod::GammaPrior,
                alpha_post: bayesian.alpha_post,
                beta_post: bayesian.beta_post,
            },
        }
    }
}

fn seasonal_card(normalized: &NormalizedInput, current_month: u32) -> EvidenceCard {
    let mut months_ahead = [0u32; 6];
    let mut multipliers = [0f64; 6];
    for (offset, (month, multiplier)) in months_ahead
        .iter_mut()
        .zip(multipliers.iter_mut())
        .enumerate()
    {
        *month = (current_month - 1 + offset as u32) % 12 + 1;
        *multiplier = params::seasonal_multiplier(*month);
    }

    let horizon_6m = math::effective_horizon(6, current_month);
    let expected_seats_6m = normalized.capacity_eff * horizon_6m;
    let season_label = match current_month {
        1..=3 => "spring admission peak",
        7..=9 => "fall secondary intake",
        _ => "ordinary period",
    };

    EvidenceCard {
        summary: format!(
            "Months {}-{} accumulated intensity {:.1} (avg {:.2}/month, {})",
            months_ahead[0],
            months_ahead[5],
            horizon_6m,
            horizon_6m / 6.0,
            season_label,
        ),
        strength: 0.95,
        detail: EvidenceDetail::Seasonal {
            months_ahead,
            effective_horizon: horizon_6m,
            expected_seats: expected_seats_6m,
            multipliers,
        },
    }
}
