pub mod allocate;
pub mod claim_on_signup;
pub mod initialize_pool;
pub mod pool_status;
pub mod reclaim;
pub mod release;

#[cfg(test)]
pub(crate) mod test_support;
