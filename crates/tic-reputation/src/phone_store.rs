//! Per-phone reputation store. Mutations go through a single
//! compound SQL statement per operation so two concurrent reports on the
//! same number never race on a read-modify-write in the application
//! layer — the database performs the increment and the trust
//! recomputation atomically.

use sqlx::SqlitePool;
use tic_common::{now_ms, PhoneReputation, StoreError};

pub struct PhoneReputationStore {
    pool: SqlitePool,
}

impl PhoneReputationStore {
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS phone_reputation (
                phone_number TEXT PRIMARY KEY,
                trust INTEGER NOT NULL DEFAULT 0,
                scam_reports INTEGER NOT NULL DEFAULT 0,
                safe_reports INTEGER NOT NULL DEFAULT 0,
                blocked INTEGER NOT NULL DEFAULT 0,
                last_reported_ms INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self { pool })
    }

    pub async fn get(&self, id: &str) -> Result<Option<PhoneReputation>, StoreError> {
        let row = sqlx::query_as::<_, PhoneRow>(
            "SELECT phone_number, trust, scam_reports, safe_reports, blocked, last_reported_ms
             FROM phone_reputation WHERE phone_number = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Insert-if-absent, then a single compound `UPDATE` that increments
    /// `scam_reports` and recomputes `trust` from the post-increment
    /// counters in the same statement. No intermediate read.
    pub async fn report_as_scam(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_row(id).await?;
        let now = now_ms();
        sqlx::query(
            r#"
            UPDATE phone_reputation
            SET scam_reports = scam_reports + 1,
                last_reported_ms = ?,
                trust = CAST(ROUND(
                    safe_reports * 100.0 / (scam_reports + 1 + safe_reports)
                ) AS INTEGER)
            WHERE phone_number = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn report_as_safe(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_row(id).await?;
        let now = now_ms();
        sqlx::query(
            r#"
            UPDATE phone_reputation
            SET safe_reports = safe_reports + 1,
                last_reported_ms = ?,
                trust = CAST(ROUND(
                    (safe_reports + 1) * 100.0 / (scam_reports + safe_reports + 1)
                ) AS INTEGER)
            WHERE phone_number = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn block(&self, id: &str) -> Result<(), StoreError> {
        self.ensure_row(id).await?;
        sqlx::query("UPDATE phone_reputation SET blocked = 1 WHERE phone_number = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn unblock(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE phone_reputation SET blocked = 0 WHERE phone_number = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }

    pub async fn is_whitelisted(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .get(id)
            .await?
            .map(|r| r.trust > 0 && r.safe_reports > 0)
            .unwrap_or(false))
    }

    async fn ensure_row(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO phone_reputation (phone_number) VALUES (?)
             ON CONFLICT(phone_number) DO NOTHING",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct PhoneRow {
    phone_number: String,
    trust: i64,
    scam_reports: i64,
    safe_reports: i64,
    blocked: i64,
    last_reported_ms: i64,
}

impl From<PhoneRow> for PhoneReputation {
    fn from(r: PhoneRow) -> Self {
        PhoneReputation {
            id: r.phone_number,
            trust: r.trust as i8,
            scam_reports: r.scam_reports as u32,
            safe_reports: r.safe_reports as u32,
            blocked: r.blocked != 0,
            last_reported_ms: r.last_reported_ms,
        }
    }
}
