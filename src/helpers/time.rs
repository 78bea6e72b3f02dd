use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

/// Time left until `exp_unix_ts`, zero once it has passed.
pub fn remaining_lifetime(exp_unix_ts: i64) -> Duration {
    Duration::from_secs((exp_unix_ts - now_i64()).max(0) as u64)
}
