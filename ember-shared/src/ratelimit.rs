use chrono::Utc;

use crate::clients::redis::RedisClient;
use crate::errors::{AppError, AppResult};
use crate::types::auth::AuthUser;

/// Rate-limit scopes, one per guarded write.
pub mod scopes {
    pub const REPORT_CREATE: &str = "report.create";
    pub const APPEAL_CREATE: &str = "appeal.create";
    pub const TICKET_CREATE: &str = "ticket.create";
    pub const TICKET_REPLY: &str = "ticket.reply";
}

#[derive(Debug, Clone, Copy)]
pub struct RateQuota {
    pub limit: u64,
    pub window_secs: u64,
}

impl RateQuota {
    pub const fn new(limit: u64, window_secs: u64) -> Self {
        Self { limit, window_secs }
    }
}

/// Fixed-window bucket index for a timestamp.
pub fn window_bucket(now_ts: i64, window_secs: u64) -> i64 {
    now_ts.div_euclid(window_secs as i64)
}

/// Counter key: `rl:{scope}:{identity}:{bucket}`. Every guarded write runs
/// behind authentication, so the identity is always a user id.
pub fn counter_key(scope: &str, identity: &str, bucket: i64) -> String {
    format!("rl:{scope}:{identity}:{bucket}")
}

/// The deny decision: the Nth call of a window is allowed while N <= limit,
/// so a limit of 5 admits exactly 5 calls.
pub fn within_quota(count: u64, limit: u64) -> bool {
    count <= limit
}

/// Increment the window counter for (scope, identity) and report whether the
/// call is still within quota. Redis failures fail open: an unreachable
/// counter must not take writes down with it.
pub async fn hit(redis: &RedisClient, scope: &str, identity: &str, quota: RateQuota) -> bool {
    let bucket = window_bucket(Utc::now().timestamp(), quota.window_secs);
    let key = counter_key(scope, identity, bucket);

    match redis.incr_with_expiry(&key, quota.window_secs).await {
        Ok(count) => within_quota(count, quota.limit),
        Err(e) => {
            tracing::error!(error = %e, scope = %scope, "rate limit counter unavailable, allowing");
            true
        }
    }
}

/// Guard a write for an authenticated caller. Staff-level roles bypass the
/// limiter entirely.
pub async fn check(
    redis: &RedisClient,
    scope: &str,
    auth: &AuthUser,
    quota: RateQuota,
) -> AppResult<()> {
    if auth.is_staff() {
        return Ok(());
    }

    if hit(redis, scope, &auth.id.to_string(), quota).await {
        Ok(())
    } else {
        Err(AppError::rate_limited(format!(
            "too many {scope} requests, try again later"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_is_stable_within_window() {
        assert_eq!(window_bucket(600, 60), window_bucket(659, 60));
        assert_ne!(window_bucket(659, 60), window_bucket(660, 60));
    }

    #[test]
    fn bucket_handles_negative_timestamps() {
        // div_euclid keeps buckets monotonic across zero
        assert!(window_bucket(-1, 60) < window_bucket(0, 60));
    }

    #[test]
    fn key_format() {
        let key = counter_key(scopes::REPORT_CREATE, "9f2c7d1e-0000-0000-0000-000000000001", 12345);
        assert_eq!(key, "rl:report.create:9f2c7d1e-0000-0000-0000-000000000001:12345");
    }

    #[test]
    fn quota_boundary_admits_limit_then_denies() {
        assert!(within_quota(1, 5));
        assert!(within_quota(5, 5));
        assert!(!within_quota(6, 5));
    }
}
