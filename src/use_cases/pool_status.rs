use crate::domain::entities::PoolStatus;
use crate::domain::errors::PoolError;
use crate::domain::ports::{Clock, PoolStore};

// Read-only pool counters with injected dependencies.
pub struct PoolStatusUseCase<C, S> {
    pub clock: C,
    pub store: S,
}

impl<C, S> PoolStatusUseCase<C, S>
where
    C: Clock,
    S: PoolStore,
{
    pub async fn execute(&self) -> Result<PoolStatus, PoolError> {
        self.store
            .status_counts(self.clock.now_epoch_seconds())
            .await
            .map_err(|_| PoolError::StorageFailure)
    }
}
