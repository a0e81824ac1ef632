use async_trait::async_trait;

use crate::domain::errors::PoolError;
use crate::domain::ports::{Clock, PoolStore, ReclaimHook};

// Default hook: workspace content is left as-is, only noted in the logs.
pub struct NoopReclaimHook;

#[async_trait]
impl ReclaimHook for NoopReclaimHook {
    async fn on_reclaim(&self, workspace_id: i64) {
        tracing::debug!(workspace_id, "lease reclaimed, workspace left untouched");
    }
}

// Expiry sweep use case with injected dependencies. Safe to run
// concurrently with the allocator and with itself; re-running finds
// nothing new to do.
pub struct ReclaimUseCase<C, S, H> {
    pub clock: C,
    pub store: S,
    pub hook: H,
}

impl<C, S, H> ReclaimUseCase<C, S, H>
where
    C: Clock,
    S: PoolStore,
    H: ReclaimHook,
{
    pub async fn execute(&self) -> Result<u64, PoolError> {
        let now = self.clock.now_epoch_seconds();
        let freed = self
            .store
            .reclaim_expired(now)
            .await
            .map_err(|_| PoolError::StorageFailure)?;

        // The leases are already deactivated; a lookup failure here only
        // costs the hook notification, so it must not eat the freed count.
        for lease in &freed {
            match self.store.identity(lease.identity_number).await {
                Ok(Some(identity)) => self.hook.on_reclaim(identity.workspace_id).await,
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    identity_number = lease.identity_number,
                    error = %e,
                    "identity lookup failed during reclaim"
                ),
            }
        }

        Ok(freed.len() as u64)
    }
}
