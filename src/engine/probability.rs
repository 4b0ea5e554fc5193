use statrs::distribution::{DiscreteCDF, NegativeBinomial, Poisson};

use crate::engine::math::{self, clamp};
use crate::engine::params;
use crate::error::ValidationError;

/// Survival-probability function over admission horizons: `at(months)` is
/// the probability the applicant is admitted within that many months.
///
/// With a usable posterior the vacancy count over the horizon is
/// Negative-Binomial (Gamma-Poisson predictive); admission means at least
/// `effective_waiting` vacancies occur. Below `alpha_post = 1` the NB
/// evaluation is numerically unstable on sparse data, so a Poisson at the
/// national-average rate stands in.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionProbability {
    effective_waiting: u32,
    capacity_eff: f64,
    alpha_post: f64,
    beta_post: f64,
    current_month: u32,
}

impl AdmissionProbability {
    /// Parameters are validated once here; evaluation itself is infallible.
    pub fn new(
        effective_waiting: u32,
        capacity_eff: f64,
        alpha_post: f64,
        beta_post: f64,
        current_month: u32,
    ) -> Result<Self, ValidationError> {
        if alpha_post >= 1.0 {
            // Positivity and finiteness of p are horizon-independent, so one
            // reference horizon covers every later call.
            math::validate_nb_params(alpha_post, beta_post / (beta_post + capacity_eff))?;
        }
        Ok(Self {
            effective_waiting,
            capacity_eff,
            alpha_post,
            beta_post,
            current_month,
        })
    }

    /// True when the posterior was too weak and the Poisson fallback drives
    /// the estimate.
    pub fn is_heuristic(&self) -> bool {
        self.alpha_post < 1.0
    }

    /// Probability of admission within `months`. Monotone in `months` by
    /// construction; numerical pathologies collapse to 0, never NaN.
    pub fn at(&self, months: u32) -> f64 {
        if self.effective_waiting == 0 {
            return 1.0;
        }
        if months == 0 {
            return 0.0;
        }

        let horizon = math::effective_horizon(months, self.current_month);
        let expected_seats = self.capacity_eff * horizon;
        let ahead = u64::from(self.effective_waiting - 1);

        let cdf = if self.is_heuristic() {
            let lambda = params::HEURISTIC_VACANCY_RATE * expected_seats;
            match Poisson::new(lambda) {
                Ok(dist) => dist.cdf(ahead),
                Err(_) => return 0.0,
            }
        } else {
            let p = self.beta_post / (self.beta_post + expected_seats);
            match NegativeBinomial::new(self.alpha_post, p) {
                Ok(dist) => dist.cdf(ahead),
                Err(_) => return 0.0,
            }
        };

        if !cdf.is_finite() {
            return 0.0;
        }
        clamp(1.0 - cdf, 0.0, 1.0)
    }
}
