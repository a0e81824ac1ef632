use async_trait::async_trait;

use crate::domain::entities::{Lease, PoolStatus, VisitorIdentity};

// Port for the durable pool store shared by all request workers. The store
// is the only coordination point between concurrent allocators, so the
// claim and transfer methods must be atomic on the storage side.
#[async_trait]
pub trait PoolStore: Send + Sync {
    // Identity numbers in ascending order; the allocator scans these so
    // that the lowest free slot always wins.
    async fn identity_numbers(&self) -> Result<Vec<i32>, String>;

    async fn identity(&self, identity_number: i32) -> Result<Option<VisitorIdentity>, String>;

    // Creates the identity and its paired default workspace if absent.
    // Returns false when the slot already exists.
    async fn create_identity(&self, identity_number: i32) -> Result<bool, String>;

    async fn find_lease_by_token(&self, token: &str) -> Result<Option<Lease>, String>;

    // Atomic insert-if-free: succeeds only when the identity has no active
    // lease, and never lets two racing callers both succeed.
    async fn try_claim(
        &self,
        identity_number: i32,
        token: &str,
        created_at: u64,
        expires_at: u64,
    ) -> Result<bool, String>;

    // Deactivates the active lease holding `token`, if any.
    async fn deactivate_by_token(&self, token: &str) -> Result<bool, String>;

    // Marks every active lease past expiry inactive and returns them.
    async fn reclaim_expired(&self, now: u64) -> Result<Vec<Lease>, String>;

    // Single transaction: re-checks the lease is live, moves workspace
    // ownership to `new_account_id`, and deactivates the lease. Returns the
    // workspace id, or None when no live lease matches (no partial state).
    async fn transfer_workspace(
        &self,
        token: &str,
        new_account_id: i64,
        now: u64,
    ) -> Result<Option<i64>, String>;

    async fn status_counts(&self, now: u64) -> Result<PoolStatus, String>;
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

// Port onto the client-held session: the web layer stores these values and
// re-presents them on later requests. The pool trusts the session cannot be
// forged; it does not provide that guarantee itself.
pub trait VisitorSession: Send {
    fn lease_token(&self) -> Option<String>;
    fn set_lease(&mut self, token: String, identity_number: i32, workspace_id: i64);
    fn clear_lease(&mut self);
}

// Extension point invoked for each workspace whose lease was reclaimed.
// Workspace content reset would plug in here.
#[async_trait]
pub trait ReclaimHook: Send + Sync {
    async fn on_reclaim(&self, workspace_id: i64);
}
