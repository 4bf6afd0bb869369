//! Per-domain reputation store. Same atomic-increment discipline as
//! the phone store, plus a hard refusal on Protected-Infrastructure
//! members: no sequence of client operations can ever set `blocked=true`
//! or push `scam_reports` above zero for a registered domain.

use sqlx::SqlitePool;
use tic_common::{now_ms, DomainReputation, StoreError};
use tic_ioc::registrable_domain;

use crate::registry::is_protected;

pub struct DomainReputationStore {
    pool: SqlitePool,
}

impl DomainReputationStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS domain_reputation (
                domain TEXT PRIMARY KEY,
                trust INTEGER NOT NULL DEFAULT 0,
                scam_reports INTEGER NOT NULL DEFAULT 0,
                safe_reports INTEGER NOT NULL DEFAULT 0,
                blocked INTEGER NOT NULL DEFAULT 0,
                category TEXT,
                last_reported_ms INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn get(&self, domain: &str) -> Result<Option<DomainReputation>, StoreError> {
        let key = registrable_domain(domain);
        let row = sqlx::query_as::<_, DomainRow>(
            "SELECT domain, trust, scam_reports, safe_reports, blocked, category, last_reported_ms
             FROM domain_reputation WHERE domain = ?",
        )
        .bind(&key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    pub async fn report_as_scam(&self, domain: &str) -> Result<(), StoreError> {
        let key = registrable_domain(domain);
        if is_protected(&key) {
            return Ok(());
        }
        self.ensure_row(&key).await?;
        let now = now_ms();
        sqlx::query(
            r#"
            UPDATE domain_reputation
            SET scam_reports = scam_reports + 1,
                last_reported_ms = ?,
                trust = CAST(ROUND(
                    safe_reports * 100.0 / (scam_reports + 1 + safe_reports)
                ) AS INTEGER)
            WHERE domain = ?
            "#,
        )
        .bind(now)
        .bind(&key)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn report_as_safe(&self, domain: &str, category: Option<&str>) -> Result<(), StoreError> {
        let key = registrable_domain(domain);
        if is_protected(&key) {
            return Ok(());
        }
        self.ensure_row(&key).await?;
        let now = now_ms();
        sqlx::query(
            r#"
            UPDATE domain_reputation
            SET safe_reports = safe_reports + 1,
                last_reported_ms = ?,
                category = COALESCE(?, category),
                trust = CAST(ROUND(
                    (safe_reports + 1) * 100.0 / (scam_reports + safe_reports + 1)
                ) AS INTEGER)
            WHERE domain = ?
            "#,
        )
        .bind(now)
        .bind(category)
        .bind(&key)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn block(&self, domain: &str) -> Result<(), StoreError> {
        let key = registrable_domain(domain);
        if is_protected(&key) {
            return Ok(());
        }
        self.ensure_row(&key).await?;
        sqlx::query("UPDATE domain_reputation SET blocked = 1 WHERE domain = ?")
            .bind(&key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn unblock(&self, domain: &str) -> Result<(), StoreError> {
        let key = registrable_domain(domain);
        sqlx::query("UPDATE domain_reputation SET blocked = 0 WHERE domain = ?")
            .bind(&key)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn is_whitelisted(&self, domain: &str) -> Result<bool, StoreError> {
        if is_protected(&registrable_domain(domain)) {
            return Ok(true);
        }
        Ok(self
            .get(domain)
            .await?
            .map(|r| r.trust > 0 && r.safe_reports > 0)
            .unwrap_or(false))
    }

    async fn ensure_row(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO domain_reputation (domain) VALUES (?)
             ON CONFLICT(domain) DO NOTHING",
        )
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DomainRow {
    domain: String,
    trust: i64,
    scam_reports: i64,
    safe_reports: i64,
    blocked: i64,
    category: Option<String>,
    last_reported_ms: i64,
}

impl From<DomainRow> for DomainReputation {
    fn from(r: DomainRow) -> Self {
        DomainReputation {
            id: r.domain,
            trust: r.trust as i8,
            scam_reports: r.scam_reports as u32,
            safe_reports: r.safe_reports as u32,
            blocked: r.blocked != 0,
            category: r.category,
            last_reported_ms: r.last_reported_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        // A single connection: an in-memory SQLite database is private to
        // the connection that opened it, so a pool of more than one would
        // silently hand concurrent callers distinct, empty databases.
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn protected_domain_report_is_a_noop() {
        let store = DomainReputationStore::new(pool().await).await.unwrap();
        store.report_as_scam("raw.githubusercontent.com").await.unwrap();
        let row = store.get("raw.githubusercontent.com").await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn report_as_scam_increments_counters() {
        let store = DomainReputationStore::new(pool().await).await.unwrap();
        store.report_as_scam("evil.example.com").await.unwrap();
        store.report_as_scam("evil.example.com").await.unwrap();
        let row = store.get("evil.example.com").await.unwrap().unwrap();
        assert_eq!(row.scam_reports, 2);
        assert_eq!(row.report_count(), 2);
    }
}
