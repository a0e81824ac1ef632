use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::entities::{Lease, PoolStatus, VisitorIdentity};
use crate::domain::ports::{Clock, PoolStore, ReclaimHook, VisitorSession};

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub find: bool,
    pub identity_lookup: bool,
    pub claim: bool,
    pub deactivate: bool,
    pub reclaim: bool,
    pub transfer: bool,
    // Fails transfer after the live-lease check, standing in for a storage
    // fault mid-transaction; the fake rolls back like the real store would.
    pub transfer_mid_transaction: bool,
    pub create: bool,
    pub counts: bool,
}

// All tables behind a single mutex, so try_claim is atomic the same way the
// real store's conditional insert is.
pub(crate) struct PoolTable {
    identities: BTreeMap<i32, VisitorIdentity>,
    leases: Vec<Lease>,
    workspace_owners: HashMap<i64, i64>,
}

#[derive(Clone)]
pub(crate) struct FakePoolStore {
    table: Arc<Mutex<PoolTable>>,
    failures: FailureFlags,
}

impl FakePoolStore {
    pub(crate) fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(PoolTable {
                identities: BTreeMap::new(),
                leases: Vec::new(),
                workspace_owners: HashMap::new(),
            })),
            failures: FailureFlags::default(),
        }
    }

    // Seeds identities 1..=n with the same synthetic refs the bootstrap
    // would produce: account 1000+n paired with workspace 100+n.
    pub(crate) fn with_identities(n: i32) -> Self {
        let store = Self::new();
        {
            let mut table = store.table.lock().expect("pool table mutex poisoned");
            for number in 1..=n {
                table.identities.insert(
                    number,
                    VisitorIdentity {
                        identity_number: number,
                        account_id: 1000 + i64::from(number),
                        workspace_id: 100 + i64::from(number),
                    },
                );
                table
                    .workspace_owners
                    .insert(100 + i64::from(number), 1000 + i64::from(number));
            }
        }
        store
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_lease(&self, lease: Lease) {
        let mut table = self.table.lock().expect("pool table mutex poisoned");
        table.leases.push(lease);
    }

    pub(crate) fn lease_rows(&self) -> Vec<Lease> {
        let table = self.table.lock().expect("pool table mutex poisoned");
        table.leases.clone()
    }

    pub(crate) fn active_leases(&self) -> Vec<Lease> {
        self.lease_rows()
            .into_iter()
            .filter(|lease| lease.is_active)
            .collect()
    }

    pub(crate) fn identity_count(&self) -> usize {
        let table = self.table.lock().expect("pool table mutex poisoned");
        table.identities.len()
    }

    pub(crate) fn workspace_owner(&self, workspace_id: i64) -> Option<i64> {
        let table = self.table.lock().expect("pool table mutex poisoned");
        table.workspace_owners.get(&workspace_id).copied()
    }
}

#[async_trait]
impl PoolStore for FakePoolStore {
    async fn identity_numbers(&self) -> Result<Vec<i32>, String> {
        let table = self.table.lock().expect("pool table mutex poisoned");
        Ok(table.identities.keys().copied().collect())
    }

    async fn identity(&self, identity_number: i32) -> Result<Option<VisitorIdentity>, String> {
        if self.failures.identity_lookup {
            return Err("identity lookup failed".to_string());
        }
        let table = self.table.lock().expect("pool table mutex poisoned");
        Ok(table.identities.get(&identity_number).cloned())
    }

    async fn create_identity(&self, identity_number: i32) -> Result<bool, String> {
        if self.failures.create {
            return Err("create failed".to_string());
        }
        let mut table = self.table.lock().expect("pool table mutex poisoned");
        if table.identities.contains_key(&identity_number) {
            return Ok(false);
        }
        let account_id = 1000 + i64::from(identity_number);
        let workspace_id = 100 + i64::from(identity_number);
        table.identities.insert(
            identity_number,
            VisitorIdentity {
                identity_number,
                account_id,
                workspace_id,
            },
        );
        table.workspace_owners.insert(workspace_id, account_id);
        Ok(true)
    }

    async fn find_lease_by_token(&self, token: &str) -> Result<Option<Lease>, String> {
        if self.failures.find {
            return Err("find failed".to_string());
        }
        let table = self.table.lock().expect("pool table mutex poisoned");
        Ok(table.leases.iter().find(|lease| lease.token == token).cloned())
    }

    async fn try_claim(
        &self,
        identity_number: i32,
        token: &str,
        created_at: u64,
        expires_at: u64,
    ) -> Result<bool, String> {
        if self.failures.claim {
            return Err("claim failed".to_string());
        }
        let mut table = self.table.lock().expect("pool table mutex poisoned");
        let slot_taken = table
            .leases
            .iter()
            .any(|lease| lease.identity_number == identity_number && lease.is_active);
        if slot_taken {
            return Ok(false);
        }
        table.leases.push(Lease {
            identity_number,
            token: token.to_string(),
            created_at,
            expires_at,
            is_active: true,
        });
        Ok(true)
    }

    async fn deactivate_by_token(&self, token: &str) -> Result<bool, String> {
        if self.failures.deactivate {
            return Err("deactivate failed".to_string());
        }
        let mut table = self.table.lock().expect("pool table mutex poisoned");
        for lease in table.leases.iter_mut() {
            if lease.token == token && lease.is_active {
                lease.is_active = false;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn reclaim_expired(&self, now: u64) -> Result<Vec<Lease>, String> {
        if self.failures.reclaim {
            return Err("reclaim failed".to_string());
        }
        let mut table = self.table.lock().expect("pool table mutex poisoned");
        let mut freed = Vec::new();
        for lease in table.leases.iter_mut() {
            if lease.is_active && lease.expires_at <= now {
                lease.is_active = false;
                freed.push(lease.clone());
            }
        }
        Ok(freed)
    }

    async fn transfer_workspace(
        &self,
        token: &str,
        new_account_id: i64,
        now: u64,
    ) -> Result<Option<i64>, String> {
        if self.failures.transfer {
            return Err("transfer failed".to_string());
        }
        let mut table = self.table.lock().expect("pool table mutex poisoned");
        let live = table
            .leases
            .iter()
            .position(|lease| lease.token == token && lease.is_live(now));
        let Some(index) = live else {
            return Ok(None);
        };
        let identity_number = table.leases[index].identity_number;
        let workspace_id = table
            .identities
            .get(&identity_number)
            .map(|identity| identity.workspace_id)
            .ok_or_else(|| "identity missing for lease".to_string())?;
        if self.failures.transfer_mid_transaction {
            // Transaction aborts: neither the ownership change nor the
            // lease deactivation is applied.
            return Err("transfer aborted".to_string());
        }
        table.workspace_owners.insert(workspace_id, new_account_id);
        table.leases[index].is_active = false;
        Ok(Some(workspace_id))
    }

    async fn status_counts(&self, now: u64) -> Result<PoolStatus, String> {
        if self.failures.counts {
            return Err("counts failed".to_string());
        }
        let table = self.table.lock().expect("pool table mutex poisoned");
        let total = table.identities.len() as u64;
        let allocated = table
            .leases
            .iter()
            .filter(|lease| lease.is_active && lease.expires_at > now)
            .count() as u64;
        let expired = table
            .leases
            .iter()
            .filter(|lease| lease.is_active && lease.expires_at <= now)
            .count() as u64;
        Ok(PoolStatus {
            total,
            allocated,
            free: total - allocated,
            expired,
        })
    }
}

// Hook fake that records every workspace reported to it.
#[derive(Clone, Default)]
pub(crate) struct RecordingHook {
    reclaimed: Arc<Mutex<Vec<i64>>>,
}

impl RecordingHook {
    pub(crate) fn seen(&self) -> Vec<i64> {
        let guard = self.reclaimed.lock().expect("reclaimed mutex poisoned");
        guard.clone()
    }
}

#[async_trait]
impl ReclaimHook for RecordingHook {
    async fn on_reclaim(&self, workspace_id: i64) {
        let mut guard = self.reclaimed.lock().expect("reclaimed mutex poisoned");
        guard.push(workspace_id);
    }
}

// Minimal client-session fake mirroring what the web layer round-trips.
#[derive(Default)]
pub(crate) struct FakeSession {
    pub token: Option<String>,
    pub identity_number: Option<i32>,
    pub workspace_id: Option<i64>,
}

impl FakeSession {
    pub(crate) fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            identity_number: None,
            workspace_id: None,
        }
    }
}

impl VisitorSession for FakeSession {
    fn lease_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn set_lease(&mut self, token: String, identity_number: i32, workspace_id: i64) {
        self.token = Some(token);
        self.identity_number = Some(identity_number);
        self.workspace_id = Some(workspace_id);
    }

    fn clear_lease(&mut self) {
        self.token = None;
        self.identity_number = None;
        self.workspace_id = None;
    }
}
