//! Pure math kernel: no I/O, no clocks, fully unit-testable.

use crate::engine::domain::ScoreInput;
use crate::engine::params;
use crate::error::ValidationError;

pub const ENGINE_VERSION: &str = "v2.0.0";
pub const CALIBRATION_VERSION: &str = "v1";

/// Default horizon cap for wait-time interpolation, in months.
pub const MAX_WAIT_HORIZON: u32 = 36;

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Round to `decimals` places, mirroring the fixed-point presentation of the
/// stored result documents.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Accumulate the seasonal multiplier over `months` calendar months starting
/// at `current_month` (1..=12), yielding a fractional effective horizon.
/// Monotone in `months` because every multiplier is positive.
pub fn effective_horizon(months: u32, current_month: u32) -> f64 {
    let mut h_eff = 0.0;
    for offset in 0..months {
        let target = (current_month - 1 + offset) % 12 + 1;
        h_eff += params::seasonal_multiplier(target);
    }
    h_eff
}

/// Cache key over the normalized inputs. Two requests that normalize to the
/// same effective waiting position intentionally share an entry.
pub fn cache_key(input: &ScoreInput, effective_waiting: u32) -> String {
    format!(
        "v2|{}|{}|{}|{}|{}",
        input.facility_id,
        input.child_age_band.as_str(),
        effective_waiting,
        ENGINE_VERSION,
        CALIBRATION_VERSION,
    )
}

/// Walk integer months until `prob` crosses `threshold`, then linearly
/// interpolate between the bracketing months to a one-decimal fractional
/// month. Returns 0 when already above the threshold and `max_months` when
/// the threshold is never reached.
pub fn find_wait_months_interpolated<P>(threshold: f64, prob: P, max_months: u32) -> f64
where
    P: Fn(u32) -> f64,
{
    let mut prev = prob(0);
    if prev >= threshold {
        return 0.0;
    }

    for month in 1..=max_months {
        let curr = prob(month);
        if curr >= threshold {
            // Equal consecutive probabilities would divide by zero; land on
            // the integer month instead.
            let fraction = if (curr - prev).abs() < f64::EPSILON {
                0.0
            } else {
                (threshold - prev) / (curr - prev)
            };
            return round_to((month - 1) as f64 + fraction, 1);
        }
        prev = curr;
    }
    max_months as f64
}

/// Evidence strength: confidence discounted by sample volume, saturating at
/// six sources. Clamped to [0, 1].
pub fn calc_strength(source_count: u32, confidence: f64) -> f64 {
    round_to(
        clamp(confidence * (source_count as f64 / 6.0).min(1.0), 0.0, 1.0),
        2,
    )
}

/// Negative-Binomial parameter guard, applied before any distribution call.
pub fn validate_nb_params(r: f64, p: f64) -> Result<(), ValidationError> {
    if !r.is_finite() || !p.is_finite() {
        return Err(ValidationError::NonFiniteParameters { r, p });
    }
    if r <= 0.0 {
        return Err(ValidationError::NonPositiveDispersion { r });
    }
    if p <= 0.0 || p >= 1.0 {
        return Err(ValidationError::SuccessProbabilityOutOfRange { p });
    }
    Ok(())
}
