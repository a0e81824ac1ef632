use crate::domain::errors::PoolError;
use crate::domain::ports::{Clock, PoolStore, VisitorSession};

// Ownership transfer on signup with injected dependencies. The store does
// the workspace-owner change and the lease deactivation in one transaction;
// this use case only decides whether there is anything to transfer.
pub struct ClaimOnSignupUseCase<C, S> {
    pub clock: C,
    pub store: S,
}

impl<C, S> ClaimOnSignupUseCase<C, S>
where
    C: Clock,
    S: PoolStore,
{
    // Returns the transferred workspace id, or None when the session holds
    // no live lease. Signup without a prior visitor session is the normal
    // case and must not error.
    pub async fn execute(
        &self,
        session: &mut dyn VisitorSession,
        new_account_id: i64,
    ) -> Result<Option<i64>, PoolError> {
        let Some(token) = session.lease_token() else {
            return Ok(None);
        };

        let workspace = self
            .store
            .transfer_workspace(&token, new_account_id, self.clock.now_epoch_seconds())
            .await
            .map_err(|_| PoolError::StorageFailure)?;

        if workspace.is_some() {
            session.clear_lease();
        }

        Ok(workspace)
    }
}
