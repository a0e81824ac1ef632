use async_trait::async_trait;
use sqlx::PgPool;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::entities::{Lease, PoolStatus, VisitorIdentity};
use crate::domain::ports::{Clock, PoolStore};

// Application state shared by the pool handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub lease_lifetime_seconds: u64,
}

// PostgreSQL-backed pool store adapter. Claiming and transferring lean on
// the database for mutual exclusion: the claim races an insert against the
// one-active-lease-per-identity partial unique index, and the transfer
// locks the lease row for its check-and-set.
#[derive(Clone)]
pub struct PostgresPoolStore {
    pub db: PgPool,
}

// Accounts live in an external store; visitor accounts occupy a reserved
// id block so bootstrap needs no account-service round trip.
const VISITOR_ACCOUNT_ID_BASE: i64 = 1_000_000;

#[derive(sqlx::FromRow)]
struct IdentityRow {
    identity_number: i32,
    account_id: i64,
    workspace_id: i64,
}

impl From<IdentityRow> for VisitorIdentity {
    fn from(row: IdentityRow) -> Self {
        VisitorIdentity {
            identity_number: row.identity_number,
            account_id: row.account_id,
            workspace_id: row.workspace_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LeaseRow {
    identity_number: i32,
    token: String,
    created_at: i64,
    expires_at: i64,
    is_active: bool,
}

impl From<LeaseRow> for Lease {
    fn from(row: LeaseRow) -> Self {
        Lease {
            identity_number: row.identity_number,
            token: row.token,
            created_at: row.created_at as u64,
            expires_at: row.expires_at as u64,
            is_active: row.is_active,
        }
    }
}

#[async_trait]
impl PoolStore for PostgresPoolStore {
    async fn identity_numbers(&self) -> Result<Vec<i32>, String> {
        sqlx::query_scalar::<_, i32>(
            "SELECT identity_number FROM visitor_identities ORDER BY identity_number",
        )
        .fetch_all(&self.db)
        .await
        .map_err(|err| err.to_string())
    }

    async fn identity(&self, identity_number: i32) -> Result<Option<VisitorIdentity>, String> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT identity_number, account_id, workspace_id
            FROM visitor_identities
            WHERE identity_number = $1
            "#,
        )
        .bind(identity_number)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(row.map(VisitorIdentity::from))
    }

    async fn create_identity(&self, identity_number: i32) -> Result<bool, String> {
        let mut tx = self.db.begin().await.map_err(|err| err.to_string())?;

        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT identity_number FROM visitor_identities WHERE identity_number = $1",
        )
        .bind(identity_number)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| err.to_string())?;
        if existing.is_some() {
            return Ok(false);
        }

        let account_id = VISITOR_ACCOUNT_ID_BASE + i64::from(identity_number);
        let workspace_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO workspaces (name, owner_account_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(format!("visitor-{identity_number}"))
        .bind(account_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| err.to_string())?;

        sqlx::query(
            r#"
            INSERT INTO visitor_identities (identity_number, account_id, workspace_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(identity_number)
        .bind(account_id)
        .bind(workspace_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| err.to_string())?;

        tx.commit().await.map_err(|err| err.to_string())?;
        Ok(true)
    }

    async fn find_lease_by_token(&self, token: &str) -> Result<Option<Lease>, String> {
        let row = sqlx::query_as::<_, LeaseRow>(
            r#"
            SELECT identity_number, token, created_at, expires_at, is_active
            FROM visitor_leases
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(row.map(Lease::from))
    }

    async fn try_claim(
        &self,
        identity_number: i32,
        token: &str,
        created_at: u64,
        expires_at: u64,
    ) -> Result<bool, String> {
        // Two racing inserts for the same slot collide on the partial
        // unique index; exactly one reports a written row.
        let result = sqlx::query(
            r#"
            INSERT INTO visitor_leases (identity_number, token, created_at, expires_at, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (identity_number) WHERE is_active DO NOTHING
            "#,
        )
        .bind(identity_number)
        .bind(token)
        .bind(created_at as i64)
        .bind(expires_at as i64)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(result.rows_affected() == 1)
    }

    async fn deactivate_by_token(&self, token: &str) -> Result<bool, String> {
        let result = sqlx::query(
            "UPDATE visitor_leases SET is_active = FALSE WHERE token = $1 AND is_active",
        )
        .bind(token)
        .execute(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(result.rows_affected() > 0)
    }

    async fn reclaim_expired(&self, now: u64) -> Result<Vec<Lease>, String> {
        let rows = sqlx::query_as::<_, LeaseRow>(
            r#"
            UPDATE visitor_leases
            SET is_active = FALSE
            WHERE is_active AND expires_at <= $1
            RETURNING identity_number, token, created_at, expires_at, is_active
            "#,
        )
        .bind(now as i64)
        .fetch_all(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        Ok(rows.into_iter().map(Lease::from).collect())
    }

    async fn transfer_workspace(
        &self,
        token: &str,
        new_account_id: i64,
        now: u64,
    ) -> Result<Option<i64>, String> {
        let mut tx = self.db.begin().await.map_err(|err| err.to_string())?;

        // Row lock so a concurrent reclaim or release cannot slip between
        // the liveness check and the two writes.
        let lease = sqlx::query_as::<_, LeaseRow>(
            r#"
            SELECT identity_number, token, created_at, expires_at, is_active
            FROM visitor_leases
            WHERE token = $1 AND is_active
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| err.to_string())?;

        let Some(lease) = lease else {
            return Ok(None);
        };
        if lease.expires_at <= now as i64 {
            // Expired between check and transfer: report a no-op.
            return Ok(None);
        }

        let workspace_id = sqlx::query_scalar::<_, i64>(
            "SELECT workspace_id FROM visitor_identities WHERE identity_number = $1",
        )
        .bind(lease.identity_number)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| err.to_string())?
        .ok_or_else(|| "identity missing for lease".to_string())?;

        sqlx::query("UPDATE workspaces SET owner_account_id = $1 WHERE id = $2")
            .bind(new_account_id)
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| err.to_string())?;

        sqlx::query("UPDATE visitor_leases SET is_active = FALSE WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await
            .map_err(|err| err.to_string())?;

        tx.commit().await.map_err(|err| err.to_string())?;
        Ok(Some(workspace_id))
    }

    async fn status_counts(&self, now: u64) -> Result<PoolStatus, String> {
        let (total, allocated, expired) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM visitor_identities) AS total,
                COUNT(*) FILTER (WHERE is_active AND expires_at > $1) AS allocated,
                COUNT(*) FILTER (WHERE is_active AND expires_at <= $1) AS expired
            FROM visitor_leases
            "#,
        )
        .bind(now as i64)
        .fetch_one(&self.db)
        .await
        .map_err(|err| err.to_string())?;

        let total = total as u64;
        let allocated = allocated as u64;
        Ok(PoolStatus {
            total,
            allocated,
            free: total.saturating_sub(allocated),
            expired: expired as u64,
        })
    }
}

// System clock adapter used by the pool use cases.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
