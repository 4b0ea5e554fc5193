use serde::{Deserialize, Serialize};

use crate::stores::{PrebuiltVacancy, WaitlistSnapshot};

/// Whether effective capacity came from a per-class entry or from the
/// total-capacity ratio table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityNormalization {
    ByClass,
    TotalFacility,
}

/// Gamma-Poisson posterior over the vacancy rate per seat-month, plus the
/// evidence-volume bookkeeping the downstream cards and confidence use.
#[derive(Debug, Clone, PartialEq)]
pub struct BayesianContext {
    /// Debounced vacancy events observed in the window.
    pub vacancies: u32,
    /// Total observed seat-time, in seat-months.
    pub seat_months: f64,
    pub rho_observed: f64,
    pub alpha_post: f64,
    pub beta_post: f64,
    pub rho_post_mean: f64,
    pub snapshot_count: usize,
    pub from_prebuilt: bool,
    pub prebuilt_confidence: Option<f64>,
    pub prior_mean: f64,
    pub normalization: CapacityNormalization,
}

impl BayesianContext {
    /// Adopt a precomputed aggregate wholesale, skipping the scan. The
    /// synthetic snapshot count keeps the evidence-strength math meaningful.
    pub fn from_prebuilt(
        block: &PrebuiltVacancy,
        prior_mean: f64,
        normalization: CapacityNormalization,
    ) -> Self {
        let beta_post = if block.beta_post > 0.0 {
            block.beta_post
        } else {
            crate::engine::params::PSEUDO_EXPOSURE
        };
        Self {
            vacancies: block.vacancies,
            seat_months: block.seat_months,
            rho_observed: block.rho_observed,
            alpha_post: block.alpha_post,
            beta_post,
            rho_post_mean: block.alpha_post / beta_post,
            snapshot_count: if block.vacancies > 0 { 6 } else { 1 },
            from_prebuilt: true,
            prebuilt_confidence: Some(block.confidence),
            prior_mean,
            normalization,
        }
    }

    /// Aggregate raw snapshot history into the conjugate posterior.
    ///
    /// Consecutive vacancy detections within `event_timeout_hours` of the
    /// run's first detection merge into one event (bursty re-detections of
    /// the same physical opening); a run closes on a non-negative enrollment
    /// delta, on timeout, or at the end of the scan. Exposure accumulates
    /// seat-time over every consecutive pair regardless of detections.
    pub fn from_snapshots(
        snapshots: &[WaitlistSnapshot],
        capacity_eff: f64,
        prior_mean: f64,
        normalization: CapacityNormalization,
        event_timeout_hours: f64,
    ) -> Self {
        let mut vacancies: u32 = 0;
        let mut seat_months = 0.0;
        let mut pending: u32 = 0;
        let mut run_started_at = None;

        for pair in snapshots.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let delta = curr.change.map(|c| c.enrolled_delta).unwrap_or(0);
            let detected = curr.change.map(|c| c.vacancy_detected).unwrap_or(false);

            if detected && delta < 0 {
                if pending == 0 {
                    run_started_at = Some(curr.snapshot_date);
                }
                pending += delta.unsigned_abs() as u32;

                let hours_since_start = run_started_at
                    .map(|start| (curr.snapshot_date - start).num_seconds() as f64 / 3600.0)
                    .unwrap_or(0.0);
                if hours_since_start >= event_timeout_hours {
                    vacancies += pending;
                    pending = 0;
                    run_started_at = None;
                }
            } else if delta >= 0 && pending > 0 {
                vacancies += pending;
                pending = 0;
                run_started_at = None;
            }

            let delta_days =
                (curr.snapshot_date - prev.snapshot_date).num_seconds() as f64 / 86_400.0;
            seat_months += capacity_eff * (delta_days / 30.0);
        }

        if pending > 0 {
            vacancies += pending;
        }

        let rho_observed = if seat_months > 0.0 {
            f64::from(vacancies) / seat_months
        } else {
            0.0
        };

        let alpha0 = prior_mean * crate::engine::params::PSEUDO_EXPOSURE;
        let beta0 = crate::engine::params::PSEUDO_EXPOSURE;
        let alpha_post = alpha0 + f64::from(vacancies);
        let beta_post = beta0 + seat_months;

        Self {
            vacancies,
            seat_months,
            rho_observed,
            alpha_post,
            beta_post,
            rho_post_mean: alpha_post / beta_post,
            snapshot_count: snapshots.len(),
            from_prebuilt: false,
            prebuilt_confidence: None,
            prior_mean,
            normalization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::SnapshotChange;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn at(base: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
        base + Duration::hours(hours)
    }

    fn snapshot(date: DateTime<Utc>, delta: i64, detected: bool) -> WaitlistSnapshot {
        WaitlistSnapshot {
            facility_id: "fac-1".to_string(),
            snapshot_date: date,
            waitlist_by_class: BTreeMap::new(),
            change: Some(SnapshotChange {
                enrolled_delta: delta,
                vacancy_detected: detected,
            }),
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
    }

    #[test]
    fn empty_history_keeps_the_prior() {
        let ctx =
            BayesianContext::from_snapshots(&[], 12.0, 0.01, CapacityNormalization::ByClass, 48.0);
        assert_eq!(ctx.vacancies, 0);
        assert_eq!(ctx.seat_months, 0.0);
        assert_eq!(ctx.rho_observed, 0.0);
        assert!((ctx.alpha_post - 0.03).abs() < 1e-12);
        assert!((ctx.beta_post - 3.0).abs() < 1e-12);
        assert_eq!(ctx.snapshot_count, 0);
    }

    #[test]
    fn burst_of_detections_within_timeout_merges_into_one_event() {
        let b = base();
        let rows = vec![
            snapshot(at(b, 0), 0, false),
            snapshot(at(b, 6), -1, true),
            snapshot(at(b, 12), -1, true),
            snapshot(at(b, 18), -1, true),
            // Non-negative delta closes the run.
            snapshot(at(b, 30), 0, false),
        ];
        let ctx = BayesianContext::from_snapshots(
            &rows,
            10.0,
            0.01,
            CapacityNormalization::TotalFacility,
            48.0,
        );
        assert_eq!(ctx.vacancies, 3, "one merged run of three seats");
        // Exposure covers all four pairs: 30 hours of seat-time at capacity 10.
        let expected_exposure = 10.0 * (30.0 / 24.0 / 30.0);
        assert!((ctx.seat_months - expected_exposure).abs() < 1e-9);
    }

    #[test]
    fn detections_past_the_timeout_close_the_run() {
        let b = base();
        let rows = vec![
            snapshot(at(b, 0), 0, false),
            snapshot(at(b, 6), -2, true),
            // 60 hours after the run opened: run is flushed at this detection.
            snapshot(at(b, 66), -1, true),
        ];
        let ctx = BayesianContext::from_snapshots(
            &rows,
            10.0,
            0.01,
            CapacityNormalization::TotalFacility,
            48.0,
        );
        // The late detection joins the run and the whole run flushes there.
        assert_eq!(ctx.vacancies, 3);
        assert_eq!(ctx.snapshot_count, 3);
    }

    #[test]
    fn trailing_open_run_is_flushed() {
        let b = base();
        let rows = vec![snapshot(at(b, 0), 0, false), snapshot(at(b, 12), -2, true)];
        let ctx = BayesianContext::from_snapshots(
            &rows,
            10.0,
            0.01,
            CapacityNormalization::TotalFacility,
            48.0,
        );
        assert_eq!(ctx.vacancies, 2);
        assert!(ctx.rho_observed > 0.0);
        assert!((ctx.alpha_post - (0.03 + 2.0)).abs() < 1e-12);
        assert!((ctx.beta_post - (3.0 + ctx.seat_months)).abs() < 1e-12);
    }

    #[test]
    fn prebuilt_context_adopts_block_posterior() {
        let block = PrebuiltVacancy {
            confidence: 0.8,
            vacancies: 4,
            seat_months: 55.0,
            rho_observed: 0.0727,
            alpha_post: 4.03,
            beta_post: 58.0,
        };
        let ctx = BayesianContext::from_prebuilt(&block, 0.01, CapacityNormalization::ByClass);
        assert!(ctx.from_prebuilt);
        assert_eq!(ctx.prebuilt_confidence, Some(0.8));
        assert_eq!(ctx.snapshot_count, 6);
        assert!((ctx.rho_post_mean - 4.03 / 58.0).abs() < 1e-12);
    }

    #[test]
    fn prebuilt_context_without_events_reports_minimal_volume() {
        let block = PrebuiltVacancy {
            confidence: 0.6,
            vacancies: 0,
            seat_months: 20.0,
            rho_observed: 0.0,
            alpha_post: 0.03,
            beta_post: 23.0,
        };
        let ctx = BayesianContext::from_prebuilt(&block, 0.01, CapacityNormalization::ByClass);
        assert_eq!(ctx.snapshot_count, 1);
    }
}
