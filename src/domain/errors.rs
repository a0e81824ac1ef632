// Domain-level errors for pool workflows. Exhaustion is not an error:
// it is a normal allocate outcome the caller degrades on.
#[derive(Debug)]
pub enum PoolError {
    InvalidPoolSize,
    StorageFailure,
}
