//! Scheduled Jobs
//!
//! Background jobs for periodic maintenance tasks.

use chrono::Utc;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;

use crate::store::{OtpRepository, StoreError};

// =========================================================================
// Expired OTP Purge Job
// =========================================================================

/// Delete login codes whose expiry has passed, so `otp_codes` only holds
/// pending codes.
pub async fn purge_expired_otps(pool: &PgPool) -> Result<u64, JobError> {
    let rows_deleted = OtpRepository::new(pool.clone())
        .purge_expired(Utc::now())
        .await?;

    if rows_deleted > 0 {
        tracing::info!(rows_deleted = rows_deleted, "Purged expired OTP codes");
    }

    Ok(rows_deleted)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for the OTP purge
    pub otp_purge_interval: Duration,
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    pool: PgPool,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create with custom configuration
    pub fn with_config(pool: PgPool, config: JobSchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!(
            otp_purge_interval_secs = self.config.otp_purge_interval.as_secs(),
            "Job scheduler started"
        );

        let mut otp_interval = interval(self.config.otp_purge_interval);

        loop {
            tokio::select! {
                _ = otp_interval.tick() => {
                    if let Err(e) = purge_expired_otps(&self.pool).await {
                        tracing::error!(error = %e, "OTP purge failed");
                    }
                }
            }
        }
    }
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
