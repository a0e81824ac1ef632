use crate::domain::errors::PoolError;
use crate::domain::ports::PoolStore;

// One-time pool bootstrap with injected dependencies. Idempotent: ensures
// identities 1..=size exist, creating only the missing ones, and never
// touches existing identities, workspaces, or leases.
pub struct InitializePoolUseCase<S> {
    pub store: S,
}

impl<S> InitializePoolUseCase<S>
where
    S: PoolStore,
{
    pub async fn execute(&self, size: u32) -> Result<u32, PoolError> {
        if size == 0 {
            return Err(PoolError::InvalidPoolSize);
        }
        let size = i32::try_from(size).map_err(|_| PoolError::InvalidPoolSize)?;

        let mut created = 0;
        for number in 1..=size {
            let fresh = self
                .store
                .create_identity(number)
                .await
                .map_err(|_| PoolError::StorageFailure)?;
            if fresh {
                created += 1;
            }
        }

        Ok(created)
    }
}
