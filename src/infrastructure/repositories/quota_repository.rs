use super::settings_repository::ConfigStore;
use crate::domain::quota::{QuotaError, QuotaTotals};
use crate::domain::settings::api_key_fingerprint;
use crate::domain::synthesis::VoiceModelClass;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Tracks characters billed by the synthesis backend
#[async_trait]
pub trait QuotaMeter: Send + Sync {
    async fn increment(&self, chars: usize, class: VoiceModelClass) -> Result<(), QuotaError>;

    async fn totals(&self) -> Result<QuotaTotals, QuotaError>;

    async fn reset(&self) -> Result<(), QuotaError>;
}

/// One row per (api key hash, install id). Totals sum the rows saved after the key's last reset.
pub struct SqliteQuotaMeter {
    pool: Arc<DbPool>,
    config: Arc<dyn ConfigStore>,
}

impl SqliteQuotaMeter {
    pub fn new(pool: Arc<DbPool>, config: Arc<dyn ConfigStore>) -> Self {
        Self { pool, config }
    }

    async fn key_hash(&self) -> Result<Option<String>, QuotaError> {
        Ok(self
            .config
            .api_key()
            .await?
            .map(|key| api_key_fingerprint(&key)))
    }

    async fn last_reset_ms(&self, key_hash: &str) -> Result<Option<i64>, QuotaError> {
        let pool = self.pool.as_ref();
        let reset = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT reset_at_ms FROM quota_resets WHERE key_hash = $1
            "#,
        )
        .bind(key_hash)
        .fetch_optional(pool)
        .await?;

        Ok(reset.map(|(ms,)| ms))
    }
}

#[async_trait]
impl QuotaMeter for SqliteQuotaMeter {
    async fn increment(&self, chars: usize, class: VoiceModelClass) -> Result<(), QuotaError> {
        let Some(key_hash) = self.key_hash().await? else {
            tracing::warn!(chars = chars, "No API key configured, usage not recorded");
            return Ok(());
        };
        let install_id = self.config.install_id().await?;
        let (std_chars, wave_chars) = match class {
            VoiceModelClass::Standard => (chars as i64, 0i64),
            VoiceModelClass::PremiumWave => (0i64, chars as i64),
        };
        let now_ms = Utc::now().timestamp_millis();

        // A row last saved before the key's reset starts counting again from zero
        sqlx::query(
            r#"
            INSERT INTO quota_usage (key_hash, install_id, char_count_std, char_count_wave, last_save_ms)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (key_hash, install_id)
            DO UPDATE SET
                char_count_std = CASE
                    WHEN quota_usage.last_save_ms <= COALESCE((SELECT reset_at_ms FROM quota_resets WHERE key_hash = $1), -1)
                    THEN excluded.char_count_std
                    ELSE quota_usage.char_count_std + excluded.char_count_std
                END,
                char_count_wave = CASE
                    WHEN quota_usage.last_save_ms <= COALESCE((SELECT reset_at_ms FROM quota_resets WHERE key_hash = $1), -1)
                    THEN excluded.char_count_wave
                    ELSE quota_usage.char_count_wave + excluded.char_count_wave
                END,
                last_save_ms = excluded.last_save_ms
            "#,
        )
        .bind(&key_hash)
        .bind(&install_id)
        .bind(std_chars)
        .bind(wave_chars)
        .bind(now_ms)
        .execute(self.pool.as_ref())
        .await?;

        tracing::debug!(chars = chars, class = ?class, "Quota usage recorded");
        Ok(())
    }

    async fn totals(&self) -> Result<QuotaTotals, QuotaError> {
        let Some(key_hash) = self.key_hash().await? else {
            return Ok(QuotaTotals::default());
        };
        let last_reset_ms = self.last_reset_ms(&key_hash).await?;

        let (std_chars, wave_chars) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(char_count_std), 0), COALESCE(SUM(char_count_wave), 0)
            FROM quota_usage
            WHERE key_hash = $1 AND last_save_ms >= $2
            "#,
        )
        .bind(&key_hash)
        .bind(last_reset_ms.unwrap_or(i64::MIN))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(QuotaTotals {
            char_count_std: std_chars.max(0) as u64,
            char_count_wave: wave_chars.max(0) as u64,
            last_reset: last_reset_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }

    async fn reset(&self) -> Result<(), QuotaError> {
        let Some(key_hash) = self.key_hash().await? else {
            return Ok(());
        };
        let now_ms = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO quota_resets (key_hash, reset_at_ms)
            VALUES ($1, $2)
            ON CONFLICT (key_hash) DO UPDATE SET reset_at_ms = excluded.reset_at_ms
            "#,
        )
        .bind(&key_hash)
        .bind(now_ms)
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            UPDATE quota_usage
            SET char_count_std = 0, char_count_wave = 0, last_save_ms = $3
            WHERE key_hash = $1 AND install_id = $2
            "#,
        )
        .bind(&key_hash)
        .bind(self.config.install_id().await?)
        .bind(now_ms)
        .execute(self.pool.as_ref())
        .await?;

        tracing::info!("Quota counters reset");
        Ok(())
    }
}

/// Counter kept in memory, for tests and sessions without a database
#[derive(Default)]
pub struct InMemoryQuotaMeter {
    totals: Mutex<QuotaTotals>,
    increments: Mutex<Vec<(usize, VoiceModelClass)>>,
}

impl InMemoryQuotaMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every increment received, in order
    pub fn increments(&self) -> Vec<(usize, VoiceModelClass)> {
        self.increments.lock().clone()
    }
}

#[async_trait]
impl QuotaMeter for InMemoryQuotaMeter {
    async fn increment(&self, chars: usize, class: VoiceModelClass) -> Result<(), QuotaError> {
        self.increments.lock().push((chars, class));
        let mut totals = self.totals.lock();
        match class {
            VoiceModelClass::Standard => totals.char_count_std += chars as u64,
            VoiceModelClass::PremiumWave => totals.char_count_wave += chars as u64,
        }
        Ok(())
    }

    async fn totals(&self) -> Result<QuotaTotals, QuotaError> {
        Ok(self.totals.lock().clone())
    }

    async fn reset(&self) -> Result<(), QuotaError> {
        *self.totals.lock() = QuotaTotals {
            last_reset: Some(Utc::now()),
            ..QuotaTotals::default()
        };
        Ok(())
    }
}
