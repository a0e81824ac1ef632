use uuid::Uuid;

use crate::domain::entities::Lease;
use crate::domain::errors::PoolError;
use crate::domain::ports::{Clock, PoolStore, ReclaimHook, VisitorSession};

// A lease granted (or re-confirmed) for one client session.
pub struct AllocatedLease {
    pub identity_number: i32,
    pub workspace_id: i64,
    pub token: String,
    pub expires_at: u64,
}

// Exhaustion is an ordinary outcome the caller degrades on, not an error.
pub enum AllocateOutcome {
    Allocated(AllocatedLease),
    Exhausted,
}

// Allocation use case with injected dependencies. The hook sees every
// lease the inline pressure sweep frees, same as the periodic sweep, so a
// recycled slot is reported before it is re-issued.
pub struct AllocateUseCase<C, S, H> {
    pub clock: C,
    pub store: S,
    pub lease_lifetime_seconds: u64,
    pub hook: H,
}

impl<C, S, H> AllocateUseCase<C, S, H>
where
    C: Clock,
    S: PoolStore,
    H: ReclaimHook,
{
    pub async fn execute(
        &self,
        session: &mut dyn VisitorSession,
    ) -> Result<AllocateOutcome, PoolError> {
        let now = self.clock.now_epoch_seconds();

        // Fast path: a session already holding a live lease keeps it.
        if let Some(token) = session.lease_token() {
            let lease = self
                .store
                .find_lease_by_token(&token)
                .await
                .map_err(|_| PoolError::StorageFailure)?;
            match lease {
                Some(lease) if lease.is_live(now) => {
                    let identity = self
                        .store
                        .identity(lease.identity_number)
                        .await
                        .map_err(|_| PoolError::StorageFailure)?
                        .ok_or(PoolError::StorageFailure)?;
                    session.set_lease(lease.token.clone(), lease.identity_number, identity.workspace_id);
                    return Ok(AllocateOutcome::Allocated(AllocatedLease {
                        identity_number: lease.identity_number,
                        workspace_id: identity.workspace_id,
                        token: lease.token,
                        expires_at: lease.expires_at,
                    }));
                }
                // Stale or unknown token: drop it and allocate fresh.
                _ => session.clear_lease(),
            }
        }

        let token = Uuid::new_v4().to_string();

        if let Some(allocated) = self.claim_scan(&token, now).await? {
            session.set_lease(token, allocated.identity_number, allocated.workspace_id);
            return Ok(AllocateOutcome::Allocated(allocated));
        }

        // Pool pressure: one scoped sweep of already-expired leases, then a
        // single retry. With nothing freed there is nothing new to claim.
        let freed = self
            .store
            .reclaim_expired(now)
            .await
            .map_err(|_| PoolError::StorageFailure)?;
        if !freed.is_empty() {
            self.notify_reclaimed(&freed).await;
            if let Some(allocated) = self.claim_scan(&token, now).await? {
                session.set_lease(token, allocated.identity_number, allocated.workspace_id);
                return Ok(AllocateOutcome::Allocated(allocated));
            }
        }

        Ok(AllocateOutcome::Exhausted)
    }

    // A lookup failure here only costs the hook notification, not the
    // sweep itself, so it is logged rather than propagated.
    async fn notify_reclaimed(&self, freed: &[Lease]) {
        for lease in freed {
            match self.store.identity(lease.identity_number).await {
                Ok(Some(identity)) => self.hook.on_reclaim(identity.workspace_id).await,
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    identity_number = lease.identity_number,
                    error = %e,
                    "identity lookup failed during inline reclaim"
                ),
            }
        }
    }

    // Scans identity numbers in ascending order so the lowest free slot
    // wins; the store's conditional insert settles races per slot.
    async fn claim_scan(
        &self,
        token: &str,
        now: u64,
    ) -> Result<Option<AllocatedLease>, PoolError> {
        let expires_at = now + self.lease_lifetime_seconds;
        let numbers = self
            .store
            .identity_numbers()
            .await
            .map_err(|_| PoolError::StorageFailure)?;

        for number in numbers {
            let claimed = self
                .store
                .try_claim(number, token, now, expires_at)
                .await
                .map_err(|_| PoolError::StorageFailure)?;
            if claimed {
                let identity = self
                    .store
                    .identity(number)
                    .await
                    .map_err(|_| PoolError::StorageFailure)?
                    .ok_or(PoolError::StorageFailure)?;
                return Ok(Some(AllocatedLease {
                    identity_number: number,
                    workspace_id: identity.workspace_id,
                    token: token.to_string(),
                    expires_at,
                }));
            }
        }
        Ok(None)
    }
}
