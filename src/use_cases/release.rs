use crate::domain::errors::PoolError;
use crate::domain::ports::{PoolStore, VisitorSession};

// Response returned by the explicit release use case.
pub struct ReleaseResponse {
    pub released: bool,
}

// Early release ("restart session") use case with injected dependencies.
pub struct ReleaseUseCase<S> {
    pub store: S,
}

impl<S> ReleaseUseCase<S>
where
    S: PoolStore,
{
    pub async fn execute(
        &self,
        session: &mut dyn VisitorSession,
    ) -> Result<ReleaseResponse, PoolError> {
        let Some(token) = session.lease_token() else {
            return Ok(ReleaseResponse { released: false });
        };

        let released = self
            .store
            .deactivate_by_token(&token)
            .await
            .map_err(|_| PoolError::StorageFailure)?;

        // The session forgets the lease either way.
        session.clear_lease();

        Ok(ReleaseResponse { released })
    }
}
