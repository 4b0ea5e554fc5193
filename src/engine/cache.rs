use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::engine::domain::{ScoreInput, ScoreResult};
use crate::stores::{CacheEntry, CacheStore};

/// Replay a cached result when the entry is fresh and the caller's raw
/// waiting position has not drifted beyond tolerance. Any cache failure is
/// treated as a miss.
pub(crate) async fn lookup<C>(
    cache: &C,
    cache_key: &str,
    requested_original: u32,
    now: DateTime<Utc>,
    drift_tolerance: u32,
) -> Option<ScoreResult>
where
    C: CacheStore + ?Sized,
{
    let entry = match cache.get(cache_key).await {
        Ok(entry) => entry?,
        Err(err) => {
            debug!(cache_key, error = %err, "cache read failed, treating as miss");
            return None;
        }
    };

    if entry.expire_at <= now {
        return None;
    }

    // Small self-reported drift should not force recomputation, but a jump
    // beyond tolerance invalidates the entry even when the effective
    // position coincidentally matches.
    if entry
        .original_waiting_position
        .abs_diff(requested_original)
        > drift_tolerance
    {
        debug!(
            cache_key,
            cached = entry.original_waiting_position,
            requested = requested_original,
            "waiting position drifted beyond tolerance"
        );
        return None;
    }

    Some(entry.result)
}

/// Best-effort write-through: failures are logged and swallowed because a
/// stale or absent cache is a performance concern, not a correctness one.
pub(crate) async fn write_through<C>(
    cache: &C,
    cache_key: String,
    input: &ScoreInput,
    effective_waiting: u32,
    result: &ScoreResult,
    now: DateTime<Utc>,
    ttl: Duration,
) where
    C: CacheStore + ?Sized,
{
    // Rewrites keep the first write's creation timestamp; only updated_at
    // and the payload move.
    let created_at = match cache.get(&cache_key).await {
        Ok(Some(prev)) => prev.created_at,
        _ => now,
    };

    let entry = CacheEntry {
        cache_key,
        result: result.clone(),
        facility_id: input.facility_id.clone(),
        child_age_band: input.child_age_band,
        priority_type: input.priority_type,
        original_waiting_position: input.waiting_position.unwrap_or(0),
        effective_waiting,
        expire_at: now + ttl,
        created_at,
        updated_at: now,
    };

    if let Err(err) = cache.upsert(entry).await {
        warn!(facility_id = %input.facility_id, error = %err, "cache write failed");
    }
}
