use std::{env, time::Duration};

// Runtime/server settings; the pool shape itself lives in the database.

pub fn http_port() -> u16 {
    env::var("VISITOR_POOL_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3004)
}

// Target pool size used by the `init-pool` deployment command when no
// explicit size is given. Growing it later only appends identities.
pub fn pool_size() -> u32 {
    env::var("VISITOR_POOL_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8)
}

pub fn lease_lifetime() -> Duration {
    let seconds = env::var("VISITOR_LEASE_TTL_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(3600);
    Duration::from_secs(seconds)
}

pub fn reclaim_interval() -> Duration {
    let seconds = env::var("RECLAIM_INTERVAL_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(300);
    Duration::from_secs(seconds)
}
