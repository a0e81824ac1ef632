use serde::{Deserialize, Serialize};

// One pre-provisioned visitor slot, paired with its default workspace.
// Created once by pool bootstrap and read-mostly afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisitorIdentity {
    pub identity_number: i32,
    pub account_id: i64,
    pub workspace_id: i64,
}

// A time-bounded, token-authenticated claim on one visitor identity.
// Rows are deactivated on expiry, release, or signup, never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lease {
    pub identity_number: i32,
    pub token: String,
    pub created_at: u64,
    pub expires_at: u64,
    pub is_active: bool,
}

impl Lease {
    // A lease grants access only while active and not yet expired.
    pub fn is_live(&self, now: u64) -> bool {
        self.is_active && self.expires_at > now
    }
}

// Read-only pool counters for operational visibility. `expired` counts
// leases that are logically free but not yet swept by the reclaimer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub total: u64,
    pub allocated: u64,
    pub free: u64,
    pub expired: u64,
}
