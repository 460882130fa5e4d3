//! Activity bucket: a discrete recency label derived from a last-active
//! timestamp, per spec.md §4.G.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    OnlineNow,
    Active10s,
    Active1m,
    Active5m,
    Active15m,
    Active1h,
    ActiveToday,
    Inactive,
}

/// Compute the bucket for a user given whether they are currently online
/// and how long ago (in milliseconds) they were last active.
///
/// `online` overrides everything else to `OnlineNow`, per spec.md §4.G.
pub fn bucket_for(online: bool, now_ms: i64, last_active_ms: Option<i64>) -> Bucket {
    if online {
        return Bucket::OnlineNow;
    }
    let Some(last_active_ms) = last_active_ms else {
        return Bucket::Inactive;
    };
    let age_ms = (now_ms - last_active_ms).max(0);
    const SEC: i64 = 1000;
    const MIN: i64 = 60 * SEC;
    const HOUR: i64 = 60 * MIN;
    const DAY: i64 = 24 * HOUR;

    if age_ms < 10 * SEC {
        Bucket::Active10s
    } else if age_ms < MIN {
        Bucket::Active1m
    } else if age_ms < 5 * MIN {
        Bucket::Active5m
    } else if age_ms < 15 * MIN {
        Bucket::Active15m
    } else if age_ms < HOUR {
        Bucket::Active1h
    } else if age_ms < DAY {
        Bucket::ActiveToday
    } else {
        Bucket::Inactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_overrides_recency() {
        assert_eq!(bucket_for(true, 1_000_000, Some(0)), Bucket::OnlineNow);
    }

    #[test]
    fn missing_last_active_is_inactive() {
        assert_eq!(bucket_for(false, 1_000_000, None), Bucket::Inactive);
    }

    #[test]
    fn thresholds() {
        let now = 1_000_000_000;
        assert_eq!(bucket_for(false, now, Some(now - 5_000)), Bucket::Active10s);
        assert_eq!(bucket_for(false, now, Some(now - 30_000)), Bucket::Active1m);
        assert_eq!(bucket_for(false, now, Some(now - 3 * 60_000)), Bucket::Active5m);
        assert_eq!(bucket_for(false, now, Some(now - 10 * 60_000)), Bucket::Active15m);
        assert_eq!(bucket_for(false, now, Some(now - 30 * 60_000)), Bucket::Active1h);
        assert_eq!(bucket_for(false, now, Some(now - 5 * 3_600_000)), Bucket::ActiveToday);
        assert_eq!(bucket_for(false, now, Some(now - 2 * 86_400_000)), Bucket::Inactive);
    }
}
